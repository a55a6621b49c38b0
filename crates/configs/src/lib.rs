use anyhow::Result;
use serde::{Deserialize, Serialize};
use anyhow::anyhow;
use thiserror::Error;

/// Upper bound accepted for `query.page_limit`.
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub service: ServiceIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Persist tables and blobs under `data_dir`; in-memory only when false.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), persist: default_persist() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Service-wide page size for index queries. Callers cannot override it.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { page_limit: default_page_limit() }
    }
}

fn default_data_dir() -> String { "data".to_string() }
fn default_persist() -> bool { true }
fn default_page_limit() -> usize { 20 }

/// Service identity metadata surfaced verbatim by the `SERVICE_INFO` operation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceIdentity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A required property could not be supplied by the configuration source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("property `{0}` is not configured")]
    Missing(String),
}

impl ServiceIdentity {
    pub fn new(name: &str, version: &str, env: &str, description: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            env: Some(env.to_string()),
            description: Some(description.to_string()),
        }
    }

    /// Look up a property by its dotted key (`service.name`, `service.version`, ...).
    pub fn require(&self, key: &str) -> Result<&str, PropertyError> {
        let value = match key {
            "service.name" => self.name.as_deref(),
            "service.version" => self.version.as_deref(),
            "service.env" => self.env.as_deref(),
            "service.description" => self.description.as_deref(),
            _ => None,
        };
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PropertyError::Missing(key.to_string()))
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or defaults when it is absent), apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply `SERVER_HOST`, `SERVER_PORT`, `CHATTER_DATA_DIR` and `CHATTER_PAGE_LIMIT`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be a port number, got {port}"))?;
        }
        if let Some(dir) = lookup("CHATTER_DATA_DIR") {
            self.store.data_dir = dir;
        }
        if let Some(limit) = lookup("CHATTER_PAGE_LIMIT") {
            self.query.page_limit = limit
                .parse()
                .map_err(|_| anyhow!("CHATTER_PAGE_LIMIT must be a positive integer, got {limit}"))?;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        // unset lets the runtime fall back to TOKIO_WORKER_THREADS or its own default
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if self.persist && self.data_dir.trim().is_empty() {
            return Err(anyhow!("store.data_dir is empty; set it in config.toml or CHATTER_DATA_DIR"));
        }
        Ok(())
    }
}

impl QueryConfig {
    fn validate(&self) -> Result<()> {
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(anyhow!("query.page_limit must be within 1..={MAX_PAGE_LIMIT}"));
        }
        Ok(())
    }
}
