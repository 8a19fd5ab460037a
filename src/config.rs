//! Experiment configuration loaded from dilemma_probe.toml and environment
//! variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Main configuration structure. Every section has working defaults, so a
/// missing config file is not an error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Experiment-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentConfig {
    /// Version tag stamped into generated prompts and checked when batches
    /// are loaded.
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

/// Where prompt and response batches live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,
    #[serde(default = "default_responses_dir")]
    pub responses_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prompts_dir: default_prompts_dir(),
            responses_dir: default_responses_dir(),
        }
    }
}

fn default_version() -> String {
    "1.7".to_string()
}

fn default_prompts_dir() -> PathBuf {
    PathBuf::from("data/prompts")
}

fn default_responses_dir() -> PathBuf {
    PathBuf::from("data/responses")
}

impl Config {
    /// Load configuration: .env first, then the TOML file (path overridable
    /// via DILEMMA_PROBE_CONFIG), then environment overrides on top.
    pub fn load() -> Result<Self> {
        crate::load_env();

        let path = std::env::var("DILEMMA_PROBE_CONFIG")
            .unwrap_or_else(|_| "dilemma_probe.toml".to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(body) => toml::from_str(&body).map_err(|err| ProbeError::Config {
                message: format!("{path}: {err}"),
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                return Err(ProbeError::Config {
                    message: format!("{path}: {err}"),
                });
            }
        };

        if let Ok(version) = std::env::var("DILEMMA_PROBE_VERSION") {
            config.experiment.version = version;
        }

        Ok(config)
    }
}
