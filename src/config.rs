//! Configuration Management
//!
//! Loads the resource mapping and HTTP settings for the msjsonapi CLI.

use anyhow::{bail, Context, Result};
use microservices_jsonapi::{MicroServiceConfig, ReqwestClient, UpdateManyBody};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAMES: &[&str] = &["config.yaml", "config.yml", "config.json"];

const LOG_FILE_NAME: &str = "msjsonapi.log";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Resource name to service base URL
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
    /// Static headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub update_many_body: Option<UpdateManyBody>,
    /// Where `--log-level` output goes
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Get the config directory
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("msjsonapi"))
    }

    /// Configured log file, else next to the config file, else the temp dir
    pub fn log_path(&self) -> PathBuf {
        if let Some(ref path) = self.log_file {
            return path.clone();
        }
        Self::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(LOG_FILE_NAME)
    }

    /// First existing config file in the config directory
    pub fn default_path() -> Option<PathBuf> {
        let dir = Self::config_dir()?;
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Load from an explicit path, or from the default location if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content, &path)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse by file extension: `.json` as JSON, anything else as YAML
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(content)?)
        } else if content.trim().is_empty() {
            Ok(Self::default())
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    /// Command-line `name=url` pairs win over the file
    pub fn merge_resources(&mut self, overrides: &[(String, String)]) {
        for (name, url) in overrides {
            self.resources.insert(name.clone(), url.clone());
        }
    }

    pub fn provider_config(&self) -> Result<MicroServiceConfig> {
        if self.resources.is_empty() {
            bail!("No resources configured. Add them to the config file or pass --resource name=url");
        }
        Ok(MicroServiceConfig::new(self.resources.clone())?)
    }

    pub fn http_client(&self) -> Result<ReqwestClient> {
        let mut builder = ReqwestClient::builder();
        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        for (name, value) in &self.headers {
            builder = builder.default_header(name.clone(), value.clone());
        }
        builder.build().context("Failed to create HTTP client")
    }
}
