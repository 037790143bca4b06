use crate::errors::MetricsError;
use serde::Deserialize;
use std::fmt;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TABLE: &str = "copilot_usage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrgKind {
    #[default]
    Org,
    Enterprise,
}

impl<'de> Deserialize<'de> for OrgKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        // Anything other than "org" is queried as an enterprise.
        Ok(if value.trim().eq_ignore_ascii_case("org") {
            OrgKind::Org
        } else {
            OrgKind::Enterprise
        })
    }
}

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bearer_token: String,
    #[serde(rename = "type", default)]
    pub kind: OrgKind,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub dbhost: Option<String>,
    #[serde(default)]
    pub dbuser: Option<String>,
    #[serde(default)]
    pub dbpass: Option<String>,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default = "default_table")]
    pub dbtable: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bearer_token", &redact(&self.bearer_token))
            .field("kind", &self.kind)
            .field("org", &self.org)
            .field("dbhost", &self.dbhost)
            .field("dbuser", &self.dbuser)
            .field("dbpass", &self.dbpass.as_deref().map(redact))
            .field("dbname", &self.dbname)
            .field("dbtable", &self.dbtable)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, MetricsError> {
        serde_json::from_str(text)
            .map_err(|err| MetricsError::Config(format!("invalid config: {err}")))
    }

    /// Only the export path names an organization; the dashboard reads the
    /// db keys alone.
    pub fn require_org(&self) -> Result<&str, MetricsError> {
        let org = self.org.trim();
        if org.is_empty() {
            return Err(MetricsError::Config("org must not be empty".into()));
        }
        Ok(org)
    }
}

/// `--config` wins, then `COPILOT_METRICS_CONFIG`, then `./config.json`.
pub fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = env::var("COPILOT_METRICS_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config.json")
}

pub async fn load_config(path: &Path) -> Result<Config, MetricsError> {
    let text = fs::read_to_string(path).await.map_err(|err| {
        MetricsError::Config(format!("cannot read {}: {err}", path.display()))
    })?;
    Config::from_json(&text)
}
