use crate::error::{Result, RnaseqlError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "rnaseql.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: PathBuf,
    pub plots_dir: PathBuf,
    pub row_ceiling: usize,
    pub max_iterations: usize,
    pub llm: LlmSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/rnaseq.db"),
            plots_dir: PathBuf::from("plots"),
            row_ceiling: crate::db::DEFAULT_ROW_CEILING,
            max_iterations: 15,
            llm: LlmSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "mistral-large-latest".to_string(),
            base_url: "https://api.mistral.ai/v1".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl Config {
    /// Loads the config file, or falls back to defaults when none exists.
    /// An explicitly given path must exist; the default locations
    /// (`./rnaseql.yaml`, then the user config dir) are optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RnaseqlError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| RnaseqlError::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.llm.api_key_env).map_err(|_| {
            RnaseqlError::Config(format!(
                "environment variable {} is not set",
                self.llm.api_key_env
            ))
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("rnaseql").join("config.yaml");
    user.exists().then_some(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.row_ceiling, 50);
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.llm.api_key_env, "MISTRAL_API_KEY");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rnaseql.yaml");
        std::fs::write(
            &path,
            "database: /data/study.db\nllm:\n  model: mistral-small-latest\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("/data/study.db"));
        assert_eq!(config.llm.model, "mistral-small-latest");
        assert_eq!(config.row_ceiling, 50);
        assert_eq!(config.llm.base_url, "https://api.mistral.ai/v1");
    }

    #[test]
    fn test_missing_explicit_path_errors() {
        let err = Config::load(Some(Path::new("/nope/rnaseql.yaml"))).unwrap_err();
        assert!(matches!(err, RnaseqlError::Config(_)));
    }
}
