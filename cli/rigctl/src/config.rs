//! Endpoint and API key storage under the user's config directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rigger_api::{Principal, DEFAULT_ENDPOINT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.toml";

fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "rigger", "rigctl")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Read and parse a TOML file; a missing file is `None`.
fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    toml::from_str(&contents)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Management API endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

impl Config {
    /// Load config from disk, or the default when none was saved.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    fn load_from(dir: &Path) -> Result<Self> {
        Ok(read_toml(&dir.join(CONFIG_FILE))?.unwrap_or_default())
    }

    pub fn save(&self) -> Result<PathBuf> {
        self.save_to(&config_dir()?)
    }

    fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        write_private(&dir.join(CONFIG_FILE), &toml::to_string_pretty(self)?)
    }
}

/// Stored API key pair.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Load credentials from disk.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&config_dir()?)
    }

    fn load_from(dir: &Path) -> Result<Option<Self>> {
        read_toml(&dir.join(CREDENTIALS_FILE))
    }

    pub fn save(&self) -> Result<PathBuf> {
        self.save_to(&config_dir()?)
    }

    fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        write_private(&dir.join(CREDENTIALS_FILE), &toml::to_string_pretty(self)?)
    }

    pub fn principal(&self) -> Principal {
        Principal::new(&self.api_key, &self.secret_key)
    }
}

/// Write `contents` readable by the owner only.
fn write_private(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    io::Write::write_all(&mut file, contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_credentials_round_trip_and_redaction() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Credentials::load_from(dir.path()).unwrap().is_none());

        let path = Credentials::new("key", "very-secret")
            .save_to(dir.path())
            .unwrap();
        let loaded = Credentials::load_from(dir.path()).unwrap().unwrap();

        assert_eq!(loaded.api_key, "key");
        assert_eq!(loaded.principal().secret_key(), "very-secret");
        assert!(!format!("{loaded:?}").contains("very-secret"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        Config {
            api_url: "http://cloud.test/client/api".into(),
        }
        .save_to(dir.path())
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.api_url, "http://cloud.test/client/api");
    }
}
