//! Greenstone Configuration Management
//!
//! Loads terminal settings from a plain `key = value` options file.

use greenstone_core::GreenstoneError;
use std::fs;
use std::path::{Path, PathBuf};

/// Default options file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "greenstone.txt";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for GreenstoneError {
    fn from(err: ConfigError) -> Self {
        GreenstoneError::Config(err.to_string())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Terminal configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalConfig {
    /// Maximum characters of scrollback kept (from "scrollback_limit", default: 16384)
    pub scrollback_limit: usize,
    /// Where the terminal record is saved (from "state_file")
    pub state_file: PathBuf,
    /// Save the record after every job (from "autosave", default: true)
    pub autosave: bool,
    /// Echo each input line into the scrollback before running it (from "echo_input")
    pub echo_input: bool,
    /// Console prompt (from "prompt", default: "> ")
    pub prompt: String,
    /// Log filter used when RUST_LOG is unset (from "log_level", default: info)
    pub log_level: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            scrollback_limit: 16384,
            state_file: PathBuf::from("greenstone-state.json"),
            autosave: true,
            echo_input: true,
            prompt: "> ".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TerminalConfig {
    /// Load configuration from an options file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Parse options file content
    ///
    /// Blank lines and `#` comments are skipped. Unknown keys and values that
    /// fail to parse leave the default in place.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key=value
            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                config.parse_option(key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        let defaults = Self::default();
        match key {
            "scrollback_limit" => {
                self.scrollback_limit = value.parse().unwrap_or(defaults.scrollback_limit);
            }
            "state_file" => {
                if !value.is_empty() {
                    self.state_file = PathBuf::from(value);
                }
            }
            "autosave" => {
                self.autosave = value.parse().unwrap_or(defaults.autosave);
            }
            "echo_input" => {
                self.echo_input = value.parse().unwrap_or(defaults.echo_input);
            }
            "prompt" => {
                // Quotes keep trailing spaces, which trim() would otherwise eat
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                self.prompt = unquoted.to_string();
            }
            "log_level" => {
                if !value.is_empty() {
                    self.log_level = value.to_string();
                }
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Terminal configuration:");
        tracing::info!("    Scrollback limit: {} chars", self.scrollback_limit);
        tracing::info!("    State file: {}", self.state_file.display());
        tracing::info!("    Autosave: {}", self.autosave);
        tracing::info!("    Echo input: {}", self.echo_input);
        tracing::info!("    Log level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TerminalConfig::default();
        assert_eq!(config.scrollback_limit, 16384);
        assert_eq!(config.state_file, PathBuf::from("greenstone-state.json"));
        assert!(config.autosave);
        assert_eq!(config.prompt, "> ");
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# terminal settings
scrollback_limit = 200
state_file = /tmp/term.json
autosave = false
prompt = "grpl> "
"#;
        let config = TerminalConfig::parse(config_text);
        assert_eq!(config.scrollback_limit, 200);
        assert_eq!(config.state_file, PathBuf::from("/tmp/term.json"));
        assert!(!config.autosave);
        assert!(config.echo_input);
        assert_eq!(config.prompt, "grpl> ");
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = TerminalConfig::parse("scrollback_limit = lots\nautosave = maybe\nbogus = 1\n");
        assert_eq!(config, TerminalConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "echo_input = false").unwrap();
        writeln!(file, "log_level = debug").unwrap();

        let config = TerminalConfig::load_from_file(file.path()).unwrap();
        assert!(!config.echo_input);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        assert!(matches!(
            TerminalConfig::load_from_file(&path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(TerminalConfig::load_or_default(&path), TerminalConfig::default());
    }

    #[test]
    fn test_error_converts() {
        let err = TerminalConfig::load_from_file("/definitely/not/here").unwrap_err();
        let err: GreenstoneError = err.into();
        assert!(matches!(err, GreenstoneError::Config(_)));
    }
}
