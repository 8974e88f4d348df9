// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Advisor configuration (TOML)
//!
//! Every section and key is optional; an empty file yields the defaults.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::inspector::{HardwareInspector, ProbeOptions, ProbeSet};
use crate::recommender::{Catalog, Recommender, ScoringWeights};

/// `[probes]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_ms: u64,
    pub disk_path: PathBuf,
    pub gpu: bool,
    pub disk: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let options = ProbeOptions::default();
        Self {
            timeout_ms: options.timeout.as_millis() as u64,
            disk_path: options.disk_path,
            gpu: options.gpu,
            disk: options.disk,
        }
    }
}

/// `[recommend]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub top_k: Option<usize>,
    /// TOML or JSON catalog; the built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
}

/// Advisor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub probes: ProbeConfig,
    pub scoring: ScoringWeights,
    pub recommend: RecommendConfig,
}

impl AdvisorConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# Silicon Advisor configuration

[probes]
timeout_ms = 5000
# disk_path = "/var/lib/models"
gpu = true
disk = true

[scoring]
memory_headroom_weight = 0.5
accelerator_fit_weight = 0.4
multi_gpu_bonus = 0.1
vram_margin = 1.5
low_headroom_ratio = 0.1

[recommend]
# top_k = 3
# catalog_path = "/etc/silicon-advisor/engines.toml"
"#
        .into()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probes.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probes.timeout_ms".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.recommend.top_k == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "recommend.top_k".into(),
                reason: "must be greater than 0".into(),
            });
        }
        self.scoring
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "scoring".into(),
                reason: e.0,
            })
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_millis(self.probes.timeout_ms),
            disk_path: self.probes.disk_path.clone(),
            gpu: self.probes.gpu,
            disk: self.probes.disk,
        }
    }

    /// Built-in probes for the current host
    pub fn probe_set(&self) -> ProbeSet {
        ProbeSet::system(&self.probe_options())
    }

    pub fn inspector(&self) -> HardwareInspector {
        HardwareInspector::new(self.probe_set())
    }

    pub fn recommender(&self) -> Result<Recommender, ConfigError> {
        Recommender::with_weights(self.scoring).map_err(|e| ConfigError::InvalidValue {
            key: "scoring".into(),
            reason: e.0,
        })
    }

    /// Catalog from `recommend.catalog_path`, or the built-in one
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.recommend.catalog_path {
            Some(path) => Ok(Catalog::from_file(path)?),
            None => Ok(Catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::ProbeKind;

    #[test]
    fn test_empty_is_default() {
        let config = AdvisorConfig::from_toml("").unwrap();
        assert_eq!(config, AdvisorConfig::default());
        assert_eq!(config.probes.timeout_ms, 5000);
        assert_eq!(config.scoring, ScoringWeights::default());
        assert_eq!(config.recommend.top_k, None);
    }

    #[test]
    fn test_sample_parses_to_defaults() {
        let config = AdvisorConfig::from_toml(&AdvisorConfig::sample_toml()).unwrap();
        assert_eq!(config.scoring, ScoringWeights::default());
        assert_eq!(config.probes.timeout_ms, 5000);
    }

    #[test]
    fn test_partial_sections() {
        let config = AdvisorConfig::from_toml(
            "[probes]\ntimeout_ms = 250\ngpu = false\n\n[scoring]\nvram_margin = 2.0\n\n[recommend]\ntop_k = 2\n",
        )
        .unwrap();
        assert_eq!(config.probe_options().timeout, Duration::from_millis(250));
        assert!(!config.probes.gpu);
        assert!(config.probes.disk);
        assert_eq!(config.scoring.vram_margin, 2.0);
        assert_eq!(config.scoring.memory_headroom_weight, 0.5);
        assert_eq!(config.recommend.top_k, Some(2));
    }

    #[test]
    fn test_probe_set_honours_switches() {
        let config = AdvisorConfig::from_toml("[probes]\ngpu = false\ndisk = false\n").unwrap();
        let kinds = config.probe_set().kinds();
        assert_eq!(kinds, vec![ProbeKind::Cpu, ProbeKind::Memory, ProbeKind::Os]);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            ("[probes]\ntimeout_ms = 0\n", "probes.timeout_ms"),
            ("[recommend]\ntop_k = 0\n", "recommend.top_k"),
            ("[scoring]\nvram_margin = 0.5\n", "scoring"),
            ("[scoring]\nmulti_gpu_bonus = 1.5\n", "scoring"),
        ];
        for (text, expected_key) in cases {
            match AdvisorConfig::from_toml(text) {
                Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{:?} for {}", other, text),
            }
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            AdvisorConfig::from_toml("[probes]\ntimeout_ms = \"soon\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_catalog_defaults_to_builtin() {
        let config = AdvisorConfig::default();
        assert_eq!(config.catalog().unwrap(), Catalog::builtin());
        assert_eq!(config.recommender().unwrap().weights(), &ScoringWeights::default());
    }

    #[test]
    fn test_catalog_from_path() {
        let path = std::env::temp_dir().join(format!("advisor-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[[engines]]\nengine_name = \"only\"\nmin_ram_gb = 2\nsupported_architectures = [\"x86_64\"]\n",
        )
        .unwrap();
        let config = AdvisorConfig {
            recommend: RecommendConfig {
                top_k: None,
                catalog_path: Some(path.clone()),
            },
            ..AdvisorConfig::default()
        };
        let catalog = config.catalog();
        let _ = std::fs::remove_file(&path);
        assert_eq!(catalog.unwrap().engines()[0].engine_name, "only");
    }

    #[test]
    fn test_from_toml_file() {
        let path = std::env::temp_dir().join(format!("advisor-settings-{}.toml", std::process::id()));
        std::fs::write(&path, "[probes]\ntimeout_ms = 1500\n\n[recommend]\ntop_k = 4\n").unwrap();
        let config = AdvisorConfig::from_toml_file(&path);
        let _ = std::fs::remove_file(&path);
        let config = config.unwrap();
        assert_eq!(config.probes.timeout_ms, 1500);
        assert_eq!(config.recommend.top_k, Some(4));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AdvisorConfig::from_toml_file("/no/such/advisor.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
