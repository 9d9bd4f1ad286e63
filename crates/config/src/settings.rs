// Run settings
// Loaded from --config, ./prodmatch.toml, or ~/.config/prodmatch/prodmatch.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ConfigError;

pub const SETTINGS_FILE: &str = "prodmatch.toml";

/// Oracle (language model) settings. The API key is never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Chat model identifier
    pub model: String,

    /// API base URL, without the `/v1/...` path
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder holding the checkpoint and output pair
    pub output_dir: PathBuf,

    /// Pause after every oracle call, in milliseconds
    pub rate_limit_ms: u64,

    /// Rows per non-match bucket in the console summary
    pub top_n: usize,

    /// Re-query records whose previous attempt hit a transport failure
    pub retry_failed: bool,

    /// Log a progress roll-up every N records (0 = never)
    pub progress_every: usize,

    pub oracle: OracleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("product_standardization_output"),
            rate_limit_ms: 100,
            top_n: 10,
            retry_failed: false,
            progress_every: 50,
            oracle: OracleSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle.model.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.model must not be empty".into()));
        }
        if self.oracle.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.base_url must not be empty".into()));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid("oracle.timeout_secs must be at least 1".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".into()));
        }
        Ok(())
    }

    /// User-level settings path (`<config dir>/prodmatch/prodmatch.toml`)
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("prodmatch").join(SETTINGS_FILE))
    }

    /// Resolve and load settings.
    ///
    /// An explicit path must exist. Otherwise `./prodmatch.toml`, then the
    /// user-level file, then built-in defaults. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Self::load_file(path).map(|s| (s, Some(path.to_path_buf())));
        }

        let candidates = [Some(PathBuf::from(SETTINGS_FILE)), Self::user_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                log::debug!("loading settings from {}", path.display());
                return Self::load_file(&path).map(|s| (s, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_overrides() {
        let s = Settings::from_toml(
            r#"
output_dir = "runs/march"
rate_limit_ms = 250
retry_failed = true

[oracle]
model = "gpt-4o"
"#,
        )
        .unwrap();
        assert_eq!(s.output_dir, PathBuf::from("runs/march"));
        assert_eq!(s.rate_limit_ms, 250);
        assert!(s.retry_failed);
        assert_eq!(s.top_n, 10);
        assert_eq!(s.oracle.model, "gpt-4o");
        assert_eq!(s.oracle.base_url, "https://api.openai.com");
    }

    #[test]
    fn bad_types_rejected() {
        let err = Settings::from_toml("rate_limit_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn empty_model_rejected() {
        let err = Settings::from_toml("[oracle]\nmodel = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn explicit_path_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "top_n = 3").unwrap();
        let (s, used) = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.top_n, 3);
        assert_eq!(used.as_deref(), Some(path.as_path()));
    }
}
