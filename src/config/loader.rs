use super::Config;
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

fn default_config_path() -> PathBuf {
    UserDirs::new().map_or_else(
        || PathBuf::from("claimsight.toml"),
        |dirs| dirs.home_dir().join(".claimsight").join("config.toml"),
    )
}

impl Config {
    /// Load the TOML config (explicit path, or `~/.claimsight/config.toml`
    /// when present), apply environment overrides, and validate.
    /// Fails when a required storage setting is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let config_path = path.map_or_else(default_config_path, Path::to_path_buf);

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&contents).map_err(|e| {
                ConfigError::Load(format!("{}: {e}", config_path.display()))
            })?
        } else if explicit {
            return Err(ConfigError::Load(format!(
                "config file {} does not exist",
                config_path.display()
            )));
        } else {
            Self::default()
        };

        config.config_path = config_path;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.resolve()?;

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid {
                key: "CLAIMSIGHT_EMBEDDING_DIMENSIONS",
                message: "must be greater than zero".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid {
                key: "CLAIMSIGHT_TEMPERATURE",
                message: format!("{} is outside 0.0..=1.0", self.llm.temperature),
            });
        }
        Ok(())
    }
}
