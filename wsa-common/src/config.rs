//! Configuration loading
//!
//! Resolution order for every setting:
//! 1. Command-line argument (handled by the binary, applied last)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing config file is not an error; the store credentials are the only
//! settings without a usable default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3001;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default store schema
pub const DEFAULT_SCHEMA: &str = "public";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "WSA_CONFIG";

// ========================================
// TOML file layout
// ========================================

/// Raw contents of `config.toml`; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub store: StoreSection,
    pub twilio: TwilioSection,
    pub wolfram: WolframSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub url: Option<String>,
    pub key: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwilioSection {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WolframSection {
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `wsa_sos=debug`
    pub level: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}

// ========================================
// Resolved configuration
// ========================================

/// Tabular store connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
    pub schema: String,
}

impl StoreConfig {
    /// Reject empty credentials and non-HTTP URLs
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        let key = self.key.trim();

        if url.is_empty() || key.is_empty() {
            return Err(Error::Config(format!(
                "Store URL or key is empty (url_len={}, key_len={}). Set SUPABASE_URL and SUPABASE_KEY.",
                url.len(),
                key.len()
            )));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Store URL must start with http(s). Got: {:?}",
                url
            )));
        }
        Ok(())
    }
}

/// SMS provider credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number; sends fail without it
    pub phone_number: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub store: StoreConfig,
    /// `None` means SMS sending is simulated
    pub twilio: Option<TwilioConfig>,
    pub wolfram_app_id: Option<String>,
    pub log_level: Option<String>,
}

impl ServiceConfig {
    /// Resolve configuration from the environment and an optional config file
    ///
    /// `cli_config` is the `--config` argument, if any. Runs before logging
    /// is initialised, so failures are only reported through the error.
    pub fn load(cli_config: Option<&Path>) -> Result<Self> {
        let file = match resolve_config_path(cli_config) {
            Some(path) => TomlConfig::load(&path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            None => TomlConfig::default(),
        };

        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// Merge a parsed file with environment lookups (env wins)
    pub fn from_sources<F>(file: TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |name: &str, fallback: Option<String>| -> Option<String> {
            env(name)
                .or(fallback)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match env("WSA_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("WSA_PORT is not a port number: {:?}", raw)))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let store = StoreConfig {
            url: setting("SUPABASE_URL", file.store.url).unwrap_or_default(),
            key: setting("SUPABASE_KEY", file.store.key).unwrap_or_default(),
            schema: file
                .store
                .schema
                .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        };
        store.validate()?;

        let twilio = match (
            setting("TWILIO_ACCOUNT_SID", file.twilio.account_sid),
            setting("TWILIO_AUTH_TOKEN", file.twilio.auth_token),
        ) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                phone_number: setting("TWILIO_PHONE_NUMBER", file.twilio.phone_number),
            }),
            _ => None,
        };

        Ok(Self {
            bind_address: file
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            store,
            twilio,
            wolfram_app_id: setting("WOLFRAM_APP_ID", file.wolfram.app_id),
            log_level: file.logging.level,
        })
    }
}

/// Locate the config file
///
/// Priority: CLI argument, `WSA_CONFIG`, `~/.config/wsa/config.toml`,
/// `/etc/wsa/config.toml`. Only the last two are checked for existence.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("wsa").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/wsa/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
