//! Engine settings stored as TOML, by default in `~/.config/weft/config.toml`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INCLUDE: &str = "**/*.cshtml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("include pattern '{pattern}' in {path} is not a valid glob: {source}")]
    InvalidInclude {
        path: PathBuf,
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory that template paths are relative to.
    pub templates_path: PathBuf,

    /// Glob, relative to `templates_path`, selecting the templates to process.
    #[serde(default = "default_include")]
    pub include: String,

    /// Report end-of-input problems as warnings.
    #[serde(default)]
    pub design_time: bool,

    /// Encoding label such as `utf-8` or `utf-16le`. When absent the encoding
    /// is detected from the byte-order mark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

fn default_include() -> String {
    DEFAULT_INCLUDE.to_string()
}

impl Config {
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
            include: default_include(),
            design_time: false,
            encoding: None,
        }
    }

    /// Parse config text. `origin` only names the file in errors.
    ///
    /// `~` and `$VAR` in `templates_path` are expanded; a path naming an
    /// unset variable is kept as written.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        if let Err(source) = glob::Pattern::new(&config.include) {
            return Err(ConfigError::InvalidInclude {
                path: origin.to_path_buf(),
                pattern: config.include,
                source,
            });
        }

        if let Some(root) = expand(&config.templates_path) {
            config.templates_path = root;
        }
        Ok(config)
    }

    /// Load from `path`, or `Ok(None)` when no file exists there.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&content, path).map(Some)
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    /// Write as TOML, creating parent directories as needed.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("cannot write {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/weft/config.toml").as_ref())
    }
}

/// `None` when the path names an unset variable.
fn expand(path: &Path) -> Option<PathBuf> {
    shellexpand::full(&path.to_string_lossy())
        .ok()
        .map(|expanded| PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn origin() -> &'static Path {
        Path::new("config.toml")
    }

    #[test]
    fn default_location_is_expanded() {
        let path = Config::config_path();

        assert!(!path.starts_with("~"));
        assert!(path.ends_with(".config/weft/config.toml"));
    }

    #[test]
    fn templates_path_alone_takes_defaults() {
        let config = Config::from_toml(r#"templates_path = "/srv/views""#, origin()).unwrap();

        assert_eq!(config, Config::new("/srv/views"));
        assert_eq!(config.include, DEFAULT_INCLUDE);
    }

    #[test]
    fn every_field_is_read() {
        let config = Config::from_toml(
            r#"
templates_path = "/srv/views"
include = "Shared/*.cshtml"
design_time = true
encoding = "utf-16le"
"#,
            origin(),
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                templates_path: PathBuf::from("/srv/views"),
                include: "Shared/*.cshtml".to_string(),
                design_time: true,
                encoding: Some("utf-16le".to_string()),
            }
        );
    }

    #[test]
    fn missing_templates_path_is_malformed() {
        let err = Config::from_toml(r#"include = "*.cshtml""#, origin()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn invalid_include_names_the_pattern() {
        let err = Config::from_toml(
            "templates_path = \"/srv/views\"\ninclude = \"[unclosed\"\n",
            origin(),
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidInclude { pattern, path, .. } => {
                assert_eq!(pattern, "[unclosed");
                assert_eq!(path, origin());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("/srv/views")]
    #[case("views/site")]
    #[case("$WEFT_SURELY_UNSET_VAR/views")]
    fn templates_path_without_expansions_is_kept(#[case] written: &str) {
        let content = format!("templates_path = {written:?}");

        let config = Config::from_toml(&content, origin()).unwrap();

        assert_eq!(config.templates_path, PathBuf::from(written));
    }

    #[test]
    fn templates_path_expands_home() {
        let config = Config::from_toml(r#"templates_path = "~/sites/views""#, origin()).unwrap();

        assert!(!config.templates_path.starts_with("~"));
        assert!(config.templates_path.ends_with("sites/views"));
    }

    #[test]
    fn templates_path_expands_variables() {
        unsafe {
            std::env::set_var("WEFT_VIEWS_ROOT", "/custom/views");
        }

        let config =
            Config::from_toml(r#"templates_path = "$WEFT_VIEWS_ROOT/site""#, origin()).unwrap();

        unsafe {
            std::env::remove_var("WEFT_VIEWS_ROOT");
        }
        assert_eq!(config.templates_path, PathBuf::from("/custom/views/site"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();

        let loaded = Config::load_from_path(dir.path().join("absent.toml")).unwrap();

        assert_eq!(loaded, None);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();

        let err = Config::load_from_path(dir.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }), "{err}");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weft").join("config.toml");
        let mut config = Config::new("/srv/views");
        config.design_time = true;

        config.save_to_path(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("encoding"), "{written}");
        assert_eq!(Config::load_from_path(&path).unwrap(), Some(config));
    }
}
