//! DealCloser configuration stored in `dealcloser.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::context::ContextDefaults;
use crate::core::types::RefineStrategy;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "dealcloser.toml";

/// DealCloser configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below. Command-line flags override whatever is loaded here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DealConfig {
    /// Sender identity used when a request does not name one.
    pub sender_name: String,

    /// Directory generated messages are written to.
    pub output_dir: PathBuf,

    /// Default ideal-customer-profile document.
    pub icp_path: PathBuf,

    /// Default offer document.
    pub offer_path: PathBuf,

    /// Directory with `<channel>.txt` templates replacing the built-in ones.
    pub templates_dir: Option<PathBuf>,

    pub refine: RefineConfig,

    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    /// Model identifier passed to the generation service.
    pub model: String,

    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,

    pub strategy: RefineStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,

    /// Environment variable holding the access credential.
    pub api_key_env: String,

    /// Whole-request timeout in seconds. The only cancellation mechanism.
    pub timeout_secs: u64,
}

impl Default for DealConfig {
    fn default() -> Self {
        Self {
            sender_name: ContextDefaults::default().sender_name,
            output_dir: PathBuf::from("out"),
            icp_path: PathBuf::from("data/icp.yaml"),
            offer_path: PathBuf::from("data/offer.yaml"),
            templates_dir: None,
            refine: RefineConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            strategy: RefineStrategy::Compose,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl DealConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.refine.temperature) {
            return Err(anyhow!(
                "refine.temperature must be within [0, 1], got {}",
                self.refine.temperature
            ));
        }
        if self.refine.model.trim().is_empty() {
            return Err(anyhow!("refine.model must be non-empty"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must be non-empty"));
        }
        if self.api.api_key_env.trim().is_empty() {
            return Err(anyhow!("api.api_key_env must be non-empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn context_defaults(&self) -> ContextDefaults {
        ContextDefaults {
            sender_name: self.sender_name.clone(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DealConfig::default()`.
pub fn load_config(path: &Path) -> Result<DealConfig> {
    if !path.exists() {
        let cfg = DealConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DealConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
