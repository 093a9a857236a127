use crate::chaos::ChaosParams;
use crate::error::{Result, StegoError};
use crate::pipeline::lsb::{CodecOptions, CollisionPolicy};
use crate::pipeline::segment::DEFAULT_HALF_WIDTH;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted bits-per-sample setting
pub const MAX_NUM_LSB: u32 = 8;

/// Pipeline configuration shared by encode, decode and the harness.
///
/// Encode and decode must run with the same values. The key parameters are
/// the same for every message unless overridden here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoConfig {
    /// Seed of the cipher keystream
    pub key_params: ChaosParams,
    /// Seed of the chaotic embedding order
    pub position_params: ChaosParams,
    /// Bits carried per sample
    pub num_lsb: u32,
    /// Half-width of the midpoint window in samples
    pub half_width: usize,
    /// Repeated-index handling for the chaotic order
    pub collisions: CollisionPolicy,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            key_params: ChaosParams::default(),
            position_params: ChaosParams::default(),
            num_lsb: 1,
            half_width: DEFAULT_HALF_WIDTH,
            collisions: CollisionPolicy::default(),
        }
    }
}

impl StegoConfig {
    /// Load and validate a JSON config file; absent fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_lsb == 0 || self.num_lsb > MAX_NUM_LSB {
            return Err(StegoError::InvalidConfig(format!(
                "num_lsb {} must be between 1 and {}",
                self.num_lsb, MAX_NUM_LSB
            )));
        }
        self.key_params.validate()?;
        self.position_params.validate()?;
        if self.key_params == ChaosParams::default() {
            warn!("cipher keystream uses the built-in default chaos parameters");
        }
        Ok(())
    }

    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            num_lsb: self.num_lsb,
            position_params: self.position_params,
            collisions: self.collisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = StegoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.half_width, 22050);
        assert_eq!(config.codec_options(), CodecOptions::default());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "num_lsb": 2, "half_width": 100 }"#).unwrap();

        let config = StegoConfig::from_json_file(&path).unwrap();
        assert_eq!(config.num_lsb, 2);
        assert_eq!(config.half_width, 100);
        assert_eq!(config.key_params, ChaosParams::default());
    }

    #[test]
    fn test_override_key_params() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "key_params": { "x0": 0.7, "r": 3.99, "n_warmup": 500 }, "collisions": "overwrite" }"#,
        )
        .unwrap();

        let config = StegoConfig::load(Some(&path)).unwrap();
        assert_eq!(config.key_params, ChaosParams::new(0.7, 3.99, 500));
        assert_eq!(config.collisions, CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = StegoConfig {
            num_lsb: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StegoError::InvalidConfig(_))));

        let config = StegoConfig {
            key_params: ChaosParams::new(0.0, 3.9, 100),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StegoError::GeneratorDomain(_))));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(StegoConfig::from_json_file(&path), Err(StegoError::Json(_))));
    }
}
