use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actions::{DecodePolicy, ReadPolicy, DEFAULT_MAX_READ_BYTES};
use directories::ProjectDirs;
use protocol::ProviderConfig;
use providers::groq_http::DEFAULT_BASE_URL;
use providers::HttpSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant embedded in a custom CLI application. \
Do not invent commands. Respond only to the user's message.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    pub use_colors: bool,
    pub max_read_bytes: u64,
    pub decode_policy: DecodePolicy,
    pub request_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            use_colors: true,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            decode_policy: DecodePolicy::default(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => f.write_str("built-in defaults"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl CliConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "flux", "flux").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// An explicit path must exist; the default location may be absent, in
    /// which case built-in defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, ConfigSource::File(path.to_path_buf())));
        }
        match Self::default_path() {
            Some(path) if path.exists() => Ok((Self::load(&path)?, ConfigSource::File(path))),
            _ => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlays `FLUX_PROVIDER`, `FLUX_MODEL`, `GROQ_BASE_URL` and `NO_COLOR`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(provider) = non_empty("FLUX_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = non_empty("FLUX_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = non_empty("GROQ_BASE_URL") {
            self.base_url = base_url;
        }
        if non_empty("NO_COLOR").is_some() {
            self.use_colors = false;
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider_name: self.provider.clone(),
            model: self.model.clone(),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn read_policy(&self) -> ReadPolicy {
        ReadPolicy {
            max_bytes: self.max_read_bytes,
            decode: self.decode_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model":"llama-3.3-70b","decode_policy":"strict"}"#).expect("write");

        let (config, source) = CliConfig::resolve(Some(path.as_path())).expect("config");
        assert_eq!(source, ConfigSource::File(path));
        assert_eq!(config.model, "llama-3.3-70b");
        assert_eq!(config.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.max_read_bytes, 10_000);
        assert_eq!(config.provider, "groq");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let err = CliConfig::resolve(Some(dir.path().join("nope.json").as_path())).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ model = 1 }").expect("write");
        assert!(matches!(CliConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("FLUX_MODEL", "mixtral"),
            ("FLUX_PROVIDER", "  "),
            ("NO_COLOR", "1"),
        ]
        .into_iter()
        .collect();
        let mut config = CliConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.model, "mixtral");
        assert_eq!(config.provider, "groq");
        assert!(!config.use_colors);
        assert_eq!(config.provider_config().model, "mixtral");
    }

    #[test]
    fn read_policy_mirrors_config() {
        let config = CliConfig {
            max_read_bytes: 42,
            decode_policy: DecodePolicy::Replace,
            ..CliConfig::default()
        };
        assert_eq!(
            config.read_policy(),
            ReadPolicy {
                max_bytes: 42,
                decode: DecodePolicy::Replace,
            }
        );
    }
}
