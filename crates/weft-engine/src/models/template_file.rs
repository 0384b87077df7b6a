use relative_path::{RelativePath, RelativePathBuf};

/// A template on disk, identified by its path relative to the templates root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    relative_path: RelativePathBuf,
    display_name: String,
    display_path: String,
}

impl TemplateFile {
    /// Create a new TemplateFile from a relative path
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let display_name = relative_path.file_stem().unwrap_or("Untitled").to_string();
        let display_path = Self::strip_extension(&relative_path).to_string();

        Self {
            relative_path,
            display_name,
            display_path,
        }
    }

    /// Create from a relative path string
    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without its extension
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Relative path without its extension, for use in titles
    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    fn strip_extension(path: &RelativePath) -> &str {
        let path_str = path.as_str();
        path.extension()
            .and_then(|ext| path_str.strip_suffix(ext))
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(path_str)
    }
}

impl From<RelativePathBuf> for TemplateFile {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for TemplateFile {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}
