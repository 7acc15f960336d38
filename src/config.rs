use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ModelTransformClient, DEFAULT_ENDPOINT_PATH};
use crate::transport::ReqwestTransport;

/// Parsed JSON configuration (deserializable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Tenant used when the caller does not name one.
    #[serde(default)]
    #[serde(rename = "TENANT")]
    pub tenant: Option<String>,

    #[serde(default = "default_endpoint_path")]
    #[serde(rename = "ENDPOINT_PATH")]
    pub endpoint_path: String,

    /// Whole-request timeout in milliseconds (0 = none).
    #[serde(default)]
    #[serde(rename = "API_TIMEOUT_MS")]
    pub api_timeout_ms: u64,

    #[serde(default)]
    #[serde(rename = "PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Maximum number of idle connections per host in the shared HTTP pool.
    #[serde(default = "default_pool_max_idle_per_host")]
    #[serde(rename = "POOL_MAX_IDLE_PER_HOST")]
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout in milliseconds (0 = no timeout).
    #[serde(default = "default_pool_idle_timeout_ms")]
    #[serde(rename = "POOL_IDLE_TIMEOUT_MS")]
    pub pool_idle_timeout_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tenant: None,
            endpoint_path: default_endpoint_path(),
            api_timeout_ms: 0,
            proxy_url: None,
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_ms: default_pool_idle_timeout_ms(),
        }
    }
}

/// Runtime configuration: the parsed file plus one shared reqwest::Client.
#[derive(Debug, Clone)]
pub struct Config {
    inner: Arc<ConfigInner>,
}

#[derive(Debug)]
struct ConfigInner {
    file: ConfigFile,
    http_client: reqwest::Client,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;
        let file: ConfigFile =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        Self::from_config_file(file)
    }

    pub fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut client_builder = reqwest::Client::builder()
            .pool_max_idle_per_host(file.pool_max_idle_per_host)
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true);

        if file.api_timeout_ms > 0 {
            client_builder = client_builder.timeout(Duration::from_millis(file.api_timeout_ms));
        }
        if file.pool_idle_timeout_ms > 0 {
            client_builder =
                client_builder.pool_idle_timeout(Duration::from_millis(file.pool_idle_timeout_ms));
        }
        if let Some(proxy_url) = &file.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .context(format!("Invalid PROXY_URL: {}", proxy_url))?;
            client_builder = client_builder.proxy(proxy);
        }

        let http_client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Config {
            inner: Arc::new(ConfigInner { file, http_client }),
        })
    }

    pub fn tenant(&self) -> Option<&str> {
        self.inner.file.tenant.as_deref()
    }

    pub fn endpoint_path(&self) -> &str {
        &self.inner.file.endpoint_path
    }

    pub fn api_timeout_ms(&self) -> u64 {
        self.inner.file.api_timeout_ms
    }

    /// Get the shared HTTP client. One pool for all requests.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.inner.http_client
    }

    pub fn transport(&self) -> ReqwestTransport {
        ReqwestTransport::new(self.http_client().clone())
    }

    /// A client bound to the shared pool and the configured endpoint.
    pub fn client(&self) -> ModelTransformClient {
        ModelTransformClient::with_transport(self.transport())
            .with_endpoint_path(self.endpoint_path())
    }
}

fn default_endpoint_path() -> String {
    DEFAULT_ENDPOINT_PATH.to_string()
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

fn default_pool_idle_timeout_ms() -> u64 {
    90000 // 90 seconds
}
