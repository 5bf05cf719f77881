//! Buddi application settings
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANDARD_PORT_HTTP: u16 = 3000;
pub const DEFAULT_PORT_HTTP: &str = "3000";

pub const DEFAULT_ACTIVE_USER_TTL_MINUTES: &str = "30";
pub const DEFAULT_CONVERSATION_TTL_HOURS: &str = "24";
pub const DEFAULT_CACHE_TTL_HOURS: &str = "1";
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: &str = "5000";
pub const DEFAULT_RATE_LIMIT_MAX_COMMANDS: &str = "1";
pub const DEFAULT_HISTORY_CAP: &str = "10";
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: &str = "3600";
pub const DEFAULT_RESPONSE_TIMEOUT_MS: &str = "10000";
pub const DEFAULT_DELIVERY_TIMEOUT_MS: &str = "5000";

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Fixed-window admission policy: at most `max_commands` per `window_ms`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitSettings {
    pub window_ms: u64,
    pub max_commands: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_ms: 5000,
            max_commands: 1,
        }
    }
}

impl RateLimitSettings {
    pub fn window_millis(&self) -> i64 {
        self.window_ms as i64
    }
}

/// Expiry policies for every collection held by the state store
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    pub active_user_ttl_minutes: u64,
    pub conversation_ttl_hours: u64,
    pub cache_ttl_hours: u64,
    pub history_cap: usize,
    pub rate_limit: RateLimitSettings,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            active_user_ttl_minutes: 30,
            conversation_ttl_hours: 24,
            cache_ttl_hours: 1,
            history_cap: 10,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl StoreSettings {
    pub fn active_user_ttl_millis(&self) -> i64 {
        self.active_user_ttl_minutes as i64 * MILLIS_PER_MINUTE
    }

    pub fn conversation_ttl_millis(&self) -> i64 {
        self.conversation_ttl_hours as i64 * MILLIS_PER_HOUR
    }

    pub fn cache_ttl_millis(&self) -> i64 {
        self.cache_ttl_hours as i64 * MILLIS_PER_HOUR
    }

    /// Rate windows untouched for this long can never affect admission again
    pub fn stale_rate_window_millis(&self) -> i64 {
        self.rate_limit.window_millis() * 2
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    // Server listen address
    pub listen_address: String,

    // HTTP API listen port
    pub listen_port: u16,

    // Expiry and admission policies
    pub store: StoreSettings,

    // How often the background sweep runs
    pub sweep_interval_seconds: u64,

    // Upper bound on reply generation before falling back
    pub response_timeout_ms: u64,

    // Upper bound on a single outbound delivery
    pub delivery_timeout_ms: u64,

    // Relay endpoint for outbound messages; deliveries are only logged if absent
    pub relay_url: Option<Url>,

    // Expose the JSON `/test` route for local development
    pub test_endpoint: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            listen_port: STANDARD_PORT_HTTP,
            store: StoreSettings::default(),
            sweep_interval_seconds: 3600,
            response_timeout_ms: 10_000,
            delivery_timeout_ms: 5_000,
            relay_url: None,
            test_endpoint: false,
        }
    }
}

impl Settings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}
