// ============================
// cosmictv-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Interface to bind
    pub host: IpAddr,
    /// Port to bind (`PORT`)
    pub port: u16,
    /// Deployment environment; `production` makes a missing admin key fatal
    pub environment: String,
    /// Static admin API key (`ADMIN_API_KEY`)
    pub admin_api_key: Option<String>,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    pub presence: PresenceSettings,
    pub gateway: GatewaySettings,
    pub chat: ChatSettings,
    pub rate_limit: RateLimitSettings,
}

/// Heartbeat expiry settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceSettings {
    /// Sessions without a ping for longer than this are evicted
    pub heartbeat_timeout_secs: u64,
    /// How often the sweeper runs
    pub sweep_interval_secs: u64,
}

/// Push-channel settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Outbound events buffered per connection before new ones are dropped
    pub outbox_capacity: usize,
}

/// Chat limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSettings {
    /// Messages kept per stream
    pub capacity: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub default_page_size: usize,
}

/// Fixed-window limiter for the admin router
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            environment: "development".to_string(),
            admin_api_key: None,
            log_level: "info".to_string(),
            log_json: false,
            presence: PresenceSettings::default(),
            gateway: GatewaySettings::default(),
            chat: ChatSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 60,
            sweep_interval_secs: 30,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self { outbox_capacity: 64 }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            capacity: 100,
            min_len: 2,
            max_len: 200,
            default_page_size: 50,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

impl PresenceSettings {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from a specific TOML file and the environment.
    /// A missing file is not an error; defaults and env vars still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Provider stack: defaults, file, `COSMICTV_*`, then bare `PORT`/`ADMIN_API_KEY`
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("COSMICTV_").split("__"))
            .merge(Env::raw().only(&["PORT", "ADMIN_API_KEY"]))
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.presence.heartbeat_timeout_secs == 0 {
            bail!("presence.heartbeat_timeout_secs must be positive");
        }
        if self.presence.sweep_interval_secs == 0 {
            bail!("presence.sweep_interval_secs must be positive");
        }
        if self.gateway.outbox_capacity == 0 {
            bail!("gateway.outbox_capacity must be positive");
        }
        if self.chat.capacity == 0 {
            bail!("chat.capacity must be positive");
        }
        if self.chat.min_len > self.chat.max_len {
            bail!(
                "chat.min_len ({}) exceeds chat.max_len ({})",
                self.chat.min_len,
                self.chat.max_len
            );
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate_limit budget must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// The admin key, ignoring blank values
    pub fn admin_key(&self) -> Option<&str> {
        self.admin_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
