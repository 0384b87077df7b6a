use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};
use weft_syntax::{Encoding, SourceText};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid templates directory: {0}")]
    InvalidTemplatesDir(String),
    #[error("Invalid include pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Read a template into a [`SourceText`] named after its relative path.
/// Decoding is left to the source, so a wrong `encoding` only surfaces when
/// the text is first used.
pub fn read_template(
    relative_path: &RelativePath,
    templates_root: &Path,
    encoding: Option<Encoding>,
) -> Result<SourceText, IoError> {
    let absolute_path = relative_path.to_path(templates_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let bytes = fs::read(&absolute_path).map_err(IoError::Io)?;
    Ok(SourceText::new(
        bytes,
        encoding,
        Some(relative_path.as_str().to_string()),
    ))
}

/// List the templates under `templates_root` matching `pattern`, sorted by
/// relative path.
pub fn scan_templates(
    templates_root: &Path,
    pattern: &str,
) -> Result<Vec<RelativePathBuf>, IoError> {
    validate_templates_dir(templates_root)?;

    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&templates_root.to_string_lossy()),
        pattern
    );

    let mut files = Vec::new();
    for entry in glob::glob(&full_pattern)? {
        let path = entry.map_err(|err| IoError::Io(err.into_error()))?;
        if !path.is_file() {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(templates_root)
            && let Ok(relative) = RelativePathBuf::from_path(relative)
        {
            files.push(relative);
        }
    }

    files.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    log::debug!(
        "found {} templates matching {pattern} in {}",
        files.len(),
        templates_root.display()
    );
    Ok(files)
}

pub fn validate_templates_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidTemplatesDir(format!(
            "{} does not exist",
            path.display()
        )));
    }

    Ok(())
}
