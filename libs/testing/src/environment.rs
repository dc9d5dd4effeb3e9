//! Target environment for scenario runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rigger_api::{ClientConfig, Principal};
use rigger_id::{
    DiskOfferingId, NetworkOfferingId, ServiceOfferingId, TemplateId, VpcOfferingId, ZoneId,
};
use rigger_lifecycle::CascadePolicy;
use serde::{Deserialize, Serialize};

/// Environment variable naming the TOML file to load.
pub const ENV_FILE_VAR: &str = "RIGGER_ENV";

/// Where scenarios run and which pre-existing fixtures they use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEnvironment {
    pub endpoint: String,
    pub api_key: String,
    pub secret_key: String,

    pub zone_id: ZoneId,
    pub template_id: TemplateId,
    pub service_offering_id: ServiceOfferingId,
    pub network_offering_id: NetworkOfferingId,
    #[serde(default)]
    pub vpc_offering_id: Option<VpcOfferingId>,
    #[serde(default)]
    pub disk_offering_id: Option<DiskOfferingId>,

    #[serde(default)]
    pub cascade_policy: CascadePolicy,

    /// Failed teardown reports are written here when set.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    #[serde(default = "default_async_poll_ms")]
    pub async_poll_ms: u64,
    #[serde(default = "default_async_timeout_secs")]
    pub async_timeout_secs: u64,
}

fn default_async_poll_ms() -> u64 {
    2000
}

fn default_async_timeout_secs() -> u64 {
    3600
}

impl TestEnvironment {
    /// Parse a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid test environment")
    }

    /// Read a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read test environment {}", path.display()))?;
        let mut env = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        env.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(env)
    }

    /// Load the file named by `RIGGER_ENV`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ENV_FILE_VAR)
            .with_context(|| format!("{ENV_FILE_VAR} is not set"))?;
        Self::load(Path::new(&path))
    }

    /// Override fields from `RIGGER_*` variables returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("RIGGER_API_URL") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("RIGGER_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("RIGGER_SECRET_KEY") {
            self.secret_key = v;
        }
        if let Some(v) = lookup("RIGGER_ZONE_ID") {
            self.zone_id = v.parse().context("Invalid RIGGER_ZONE_ID")?;
        }
        if let Some(v) = lookup("RIGGER_TEMPLATE_ID") {
            self.template_id = v.parse().context("Invalid RIGGER_TEMPLATE_ID")?;
        }
        if let Some(v) = lookup("RIGGER_CASCADE_POLICY") {
            self.cascade_policy = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("RIGGER_REPORT_DIR") {
            self.report_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("RIGGER_ASYNC_POLL_MS") {
            self.async_poll_ms = v.parse().context("Invalid RIGGER_ASYNC_POLL_MS")?;
        }
        if let Some(v) = lookup("RIGGER_ASYNC_TIMEOUT_SECS") {
            self.async_timeout_secs = v.parse().context("Invalid RIGGER_ASYNC_TIMEOUT_SECS")?;
        }
        Ok(())
    }

    pub fn admin(&self) -> Principal {
        Principal::new(&self.api_key, &self.secret_key).named("admin")
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig::new(&self.endpoint, self.admin())?.with_async_polling(
            Duration::from_millis(self.async_poll_ms),
            Duration::from_secs(self.async_timeout_secs),
        ))
    }
}
