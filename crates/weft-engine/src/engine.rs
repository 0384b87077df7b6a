use crate::io::{self, IoError};
use crate::models::TemplateFile;
use codespan_reporting::diagnostic::Diagnostic as Report;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, termcolor::NoColor};
use relative_path::RelativePath;
use std::path::PathBuf;
use weft_config::Config;
use weft_syntax::{
    ChunkTree, Encoding, ParseError, ParserOptions, SourceError, SourceText, SyntaxTree,
    TemplateParser, lower,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("failed to parse {name}: {source}")]
    Parse { name: String, source: ParseError },
    #[error("invalid encoding: {0}")]
    Encoding(#[from] SourceError),
    #[error("failed to render diagnostics: {0}")]
    Render(#[from] codespan_reporting::files::Error),
}

/// Where templates live and how to parse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub templates_root: PathBuf,
    pub include: String,
    pub parser: ParserOptions,
    pub encoding: Option<Encoding>,
}

impl EngineOptions {
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Self {
            templates_root: templates_root.into(),
            include: weft_config::DEFAULT_INCLUDE.to_string(),
            parser: ParserOptions::default(),
            encoding: None,
        }
    }
}

/// Parses templates and lowers them to chunks.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    options: EngineOptions,
    parser: TemplateParser,
}

impl TemplateEngine {
    pub fn new(options: EngineOptions) -> Self {
        let parser = TemplateParser::new(options.parser);
        Self { options, parser }
    }

    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let encoding = config
            .encoding
            .as_deref()
            .map(str::parse::<Encoding>)
            .transpose()?;

        Ok(Self::new(EngineOptions {
            templates_root: config.templates_path.clone(),
            include: config.include.clone(),
            parser: ParserOptions {
                design_time: config.design_time,
            },
            encoding,
        }))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse and lower one document.
    pub fn process(&self, source: &SourceText) -> Result<GeneratedTemplate, EngineError> {
        let name = source.filename().unwrap_or("<anonymous>");
        let tree = self.parser.parse(source).map_err(|source| EngineError::Parse {
            name: name.to_string(),
            source,
        })?;
        let chunks = lower(&tree);

        if tree.has_errors() {
            log::warn!("{name}: {} diagnostics", tree.diagnostics().len());
        }

        Ok(GeneratedTemplate {
            file: source.filename().map(TemplateFile::from),
            tree,
            chunks,
        })
    }

    /// Read a template relative to the templates root and process it.
    pub fn process_file(&self, relative_path: &RelativePath) -> Result<GeneratedTemplate, EngineError> {
        let source = io::read_template(
            relative_path,
            &self.options.templates_root,
            self.options.encoding,
        )?;
        self.process(&source)
    }

    /// Templates selected by the include pattern.
    pub fn templates(&self) -> Result<Vec<TemplateFile>, EngineError> {
        let files = io::scan_templates(&self.options.templates_root, &self.options.include)?;
        Ok(files.into_iter().map(TemplateFile::new).collect())
    }

    /// Process every template selected by the include pattern, in path order.
    pub fn process_all(&self) -> Result<Vec<GeneratedTemplate>, EngineError> {
        self.templates()?
            .iter()
            .map(|file| self.process_file(file.relative_path()))
            .collect()
    }
}

/// One processed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTemplate {
    file: Option<TemplateFile>,
    tree: SyntaxTree,
    chunks: ChunkTree,
}

impl GeneratedTemplate {
    /// The file this came from, when the source was named.
    pub fn file(&self) -> Option<&TemplateFile> {
        self.file.as_ref()
    }

    pub fn name(&self) -> &str {
        self.file
            .as_ref()
            .map(|file| file.relative_path().as_str())
            .unwrap_or("<anonymous>")
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn chunks(&self) -> &ChunkTree {
        &self.chunks
    }

    pub fn has_errors(&self) -> bool {
        self.tree.has_errors()
    }

    /// Diagnostics as codespan reports against `file_id`.
    pub fn reports(&self, file_id: usize) -> Vec<Report<usize>> {
        self.tree
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.to_report(file_id))
            .collect()
    }

    /// Render all diagnostics as plain text with source snippets.
    pub fn render_diagnostics(&self) -> Result<String, EngineError> {
        let mut files = SimpleFiles::new();
        let file_id = files.add(self.name().to_string(), self.tree.text());

        let mut writer = NoColor::new(Vec::new());
        let config = term::Config::default();
        for report in self.reports(file_id) {
            term::emit_to_write_style(&mut writer, &config, &files, &report)?;
        }
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}
