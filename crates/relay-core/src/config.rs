use crate::adapter::{ServiceConnection, ServiceCredentials};
use crate::catalog;
use crate::error::{RelayError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix marking a credential value that is read from the environment.
pub const ENV_PREFIX: &str = "env:";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// ChatConfig
// ---------------------------------------------------------------------------

/// Command that receives free text typed without a leading `/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackCommand {
    pub service: String,
    pub action: String,
    /// Parameter the free text is bound to.
    pub param: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackCommand>,
}

// ---------------------------------------------------------------------------
// RealtimeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_ping_interval() -> u64 {
    15
}

fn default_backoff_initial() -> u64 {
    1_000
}

fn default_backoff_max() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            backoff_initial_ms: default_backoff_initial(),
            backoff_max_ms: default_backoff_max(),
            max_attempts: default_max_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Per-service base URL and credentials, keyed by service name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, ServiceConnection>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RelayError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Locate and load the config file, falling back to defaults when none
    /// exists. Returns the path that was read, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match paths::resolve_config(explicit) {
            Some(path) => {
                let cfg = Self::load(&path)?;
                Ok((cfg, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// The connection for `service` with every `env:NAME` reference replaced
    /// by the variable's value. `Ok(None)` when the service is not listed.
    pub fn connection(&self, service: &str) -> Result<Option<ServiceConnection>> {
        let Some(conn) = self.services.get(service) else {
            return Ok(None);
        };
        let base_url = conn.base_url.as_deref().map(resolve_value).transpose()?;
        Ok(Some(ServiceConnection {
            base_url,
            credentials: resolve_credentials(&conn.credentials)?,
        }))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.dispatch.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "dispatch.timeout_secs is 0; every call would time out".to_string(),
            });
        }

        if self.realtime.backoff_initial_ms > self.realtime.backoff_max_ms {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "realtime.backoff_initial_ms ({}) exceeds backoff_max_ms ({})",
                    self.realtime.backoff_initial_ms, self.realtime.backoff_max_ms
                ),
            });
        }

        for (name, conn) in &self.services {
            let Some(spec) = catalog::spec(name) else {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown service '{name}' in services"),
                });
                continue;
            };
            if spec.base_url.is_none() && conn.base_url.is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("service '{name}' needs a base_url"),
                });
            }
            let creds = &conn.credentials;
            if creds.token.is_none() && creds.api_key.is_none() && creds.username.is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("service '{name}' has no credentials"),
                });
            }
            if let Err(e) = resolve_credentials(creds) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("service '{name}': {e}"),
                });
            }
        }

        if let Some(fb) = &self.chat.fallback {
            let known = catalog::spec(&fb.service).is_some_and(|spec| {
                spec.operations.iter().any(|op| {
                    op.descriptor.action == fb.action
                        && op.descriptor.parameters.iter().any(|p| p.name == fb.param)
                })
            });
            if !known {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "chat.fallback '{} {} {}' does not name a known tool parameter",
                        fb.service, fb.action, fb.param
                    ),
                });
            }
        }

        warnings
    }
}

fn resolve_value(raw: &str) -> Result<String> {
    match raw.strip_prefix(ENV_PREFIX) {
        Some(var) => std::env::var(var.trim()).map_err(|_| RelayError::MissingEnv(var.trim().to_string())),
        None => Ok(raw.to_string()),
    }
}

fn resolve_opt(v: &Option<String>) -> Result<Option<String>> {
    v.as_deref().map(resolve_value).transpose()
}

fn resolve_credentials(creds: &ServiceCredentials) -> Result<ServiceCredentials> {
    let mut extra = BTreeMap::new();
    for (k, v) in &creds.extra {
        extra.insert(k.clone(), resolve_value(v)?);
    }
    Ok(ServiceCredentials {
        token: resolve_opt(&creds.token)?,
        api_key: resolve_opt(&creds.api_key)?,
        username: resolve_opt(&creds.username)?,
        password: resolve_opt(&creds.password)?,
        extra,
    })
}

/// Starter file written by `relay init`.
pub const STARTER_CONFIG: &str = r#"# relay configuration
server:
  port: 3141
dispatch:
  timeout_secs: 30
# chat:
#   fallback: { service: openai, action: chat, param: prompt }
services:
  # shopify:
  #   base_url: https://my-shop.myshopify.com
  #   credentials: { api_key: env:SHOPIFY_TOKEN }
  # slack:
  #   credentials: { token: env:SLACK_BOT_TOKEN }
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
