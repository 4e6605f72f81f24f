use crate::error::{ConfigError, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

// ── Gateway listener ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 3000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

// ── Outbound webhook ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint the relay posts chat payloads to
    #[serde(default = "default_webhook_url")]
    pub url: String,
    /// Deadline for the webhook to produce response headers, in ms
    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_webhook_url() -> String {
    "https://hook.us1.make.com/1452215".into()
}

fn default_webhook_timeout_ms() -> u64 {
    8000
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_webhook_url(),
            timeout_ms: default_webhook_timeout_ms(),
        }
    }
}

// ── Header cache ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Bounded capacity of the per-document header cache
    #[serde(default = "default_header_entries")]
    pub header_entries: usize,
}

fn default_header_entries() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            header_entries: default_header_entries(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        Self::load_from(&home.join(".docrelay"))
    }

    /// Reads `config.toml` under `dir`, seeding it with defaults on first
    /// run. Split from `load_or_init` so tests can point it at a tempdir.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::Io)?;
        }

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(ConfigError::Io)?;
            let mut config: Config =
                toml::from_str(&contents).map_err(|e| ConfigError::Load(e.to_string()))?;
            // Set computed path that is skipped during serialization
            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Webhook URL: DOCRELAY_WEBHOOK_URL or MAKE_WEBHOOK_URL
        if let Ok(url) =
            std::env::var("DOCRELAY_WEBHOOK_URL").or_else(|_| std::env::var("MAKE_WEBHOOK_URL"))
        {
            if !url.is_empty() {
                self.webhook.url = url;
            }
        }

        // Webhook deadline: DOCRELAY_WEBHOOK_TIMEOUT_MS
        if let Ok(timeout_str) = std::env::var("DOCRELAY_WEBHOOK_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout_str.parse::<u64>() {
                if timeout_ms > 0 {
                    self.webhook.timeout_ms = timeout_ms;
                }
            }
        }

        // Gateway port: DOCRELAY_PORT or PORT
        if let Ok(port_str) = std::env::var("DOCRELAY_PORT").or_else(|_| std::env::var("PORT")) {
            if let Ok(port) = port_str.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        // Gateway host: DOCRELAY_HOST or HOST
        if let Ok(host) = std::env::var("DOCRELAY_HOST").or_else(|_| std::env::var("HOST")) {
            if !host.is_empty() {
                self.gateway.host = host;
            }
        }
    }

    /// The webhook URL must be an absolute http(s) URL and the deadline
    /// nonzero; anything else refuses to start rather than failing on
    /// the first request.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.webhook.url)
            .map_err(|e| ConfigError::Validation(format!("webhook.url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "webhook.url must be http or https, got {}",
                url.scheme()
            ))
            .into());
        }
        if self.webhook.timeout_ms == 0 {
            return Err(ConfigError::Validation("webhook.timeout_ms must be nonzero".into()).into());
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Load(e.to_string()))?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::Io)?;
        Ok(())
    }
}
