use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, PayloadResult};

/// Name of the environment variable containing the path to a payload configuration
/// file. When unset, [`PayloadConfig::default`] is used.
pub const ENV_PAYLOAD_CONFIG_PATH: &str = "HYPAYLOAD_CONFIG_PATH";

/// Buffer sizing policy shared by every payload created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Bytes allocated when a payload is created.
    pub initial_capacity: usize,
    /// Multiplier applied to the current capacity when the buffer must grow.
    /// Growth always reaches at least the requested size.
    pub growth_factor: f64,
    /// Hard cap on the buffer capacity. Growing past it fails with
    /// [`PayloadError::OutOfMemory`].
    pub max_capacity: Option<usize>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 200,
            growth_factor: 2.0,
            max_capacity: None,
        }
    }
}

impl PayloadConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> PayloadResult<Self> {
        Self::parse(toml_str, "<inline>")
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> PayloadResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        debug!("Loading payload configuration from `{}`", path.display());
        Self::parse(&toml_str, &path.display().to_string())
    }

    fn parse(toml_str: &str, file: &str) -> PayloadResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| PayloadError::ConfigParse {
            source: e,
            file: file.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> PayloadResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| {
            PayloadError::invalid(format!(
                "Failed during serialization of TOML to path `{}`: {}",
                path.display(),
                e
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Load the configuration named by [`ENV_PAYLOAD_CONFIG_PATH`], or the default
    /// configuration if the variable is not set.
    pub fn from_env() -> PayloadResult<Self> {
        match std::env::var(ENV_PAYLOAD_CONFIG_PATH) {
            Ok(path) => Self::load_from_toml(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    fn validate(&self) -> PayloadResult<()> {
        if !(self.growth_factor >= 1.0) {
            return Err(PayloadError::invalid(format!(
                "growth_factor must be at least 1.0, got {}",
                self.growth_factor
            )));
        }
        if let Some(max) = self.max_capacity {
            if max < self.initial_capacity {
                return Err(PayloadError::invalid(format!(
                    "max_capacity ({max}) is smaller than initial_capacity ({})",
                    self.initial_capacity
                )));
            }
        }
        Ok(())
    }

    /// Capacity to allocate when `required` bytes are needed and `current` are
    /// available, or `None` if the limit forbids it.
    pub(crate) fn grown_capacity(&self, current: usize, required: usize) -> Option<usize> {
        if let Some(max) = self.max_capacity {
            if required > max {
                return None;
            }
        }

        let scaled = (current as f64 * self.growth_factor).ceil() as usize;
        let target = scaled.max(required);
        Some(match self.max_capacity {
            Some(max) => target.min(max),
            None => target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config = PayloadConfig::from_toml_str("max_capacity = 4096").unwrap();
        assert_eq!(config.initial_capacity, 200);
        assert_eq!(config.growth_factor, 2.0);
        assert_eq!(config.max_capacity, Some(4096));
    }

    #[test]
    fn invalid_growth_factor_is_rejected() {
        let err = PayloadConfig::from_toml_str("growth_factor = 0.5").unwrap_err();
        assert!(matches!(err, PayloadError::InvalidArgument(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = PayloadConfig::from_toml_str("initial_capacity = \"big\"").unwrap_err();
        assert!(matches!(err, PayloadError::ConfigParse { .. }));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = std::env::temp_dir().join(format!("hypayload-bad-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "initial_capacity = \"secret-body\"").unwrap();

        let err = PayloadConfig::load_from_toml(&path).unwrap_err();
        match &err {
            PayloadError::ConfigParse { file, .. } => assert_eq!(file, &path.display().to_string()),
            other => panic!("unexpected error {other:?}"),
        }
        let inline = PayloadConfig::from_toml_str("initial_capacity = \"secret-body\"").unwrap_err();
        assert!(matches!(inline, PayloadError::ConfigParse { ref file, .. } if file == "<inline>"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn growth_respects_factor_and_limit() {
        let config = PayloadConfig {
            initial_capacity: 8,
            growth_factor: 2.0,
            max_capacity: Some(100),
        };
        assert_eq!(config.grown_capacity(8, 9), Some(16));
        assert_eq!(config.grown_capacity(8, 40), Some(40));
        assert_eq!(config.grown_capacity(80, 90), Some(100));
        assert_eq!(config.grown_capacity(80, 101), None);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("hypayload-config-{}", std::process::id()));
        let path = dir.join("payload.toml");
        let config = PayloadConfig {
            initial_capacity: 64,
            growth_factor: 1.5,
            max_capacity: Some(1 << 20),
        };
        config.save_to_toml(&path).unwrap();
        let loaded = PayloadConfig::load_from_toml(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
