//! CLI for this application
//!
use url::Url;

use crate::settings::{self, RateLimitSettings, StoreSettings};

pub use crate::settings::{APP_NAME, APP_VERSION};

#[derive(Clone, Debug, clap::Parser)]
#[command(name = "buddi", version, about)]
pub struct Cli {
    // Server listen address
    #[clap(
        long,
        default_value = "0.0.0.0",
        env("BUDDI_LISTEN_ADDRESS"),
        help = "IP Address to listen on"
    )]
    pub listen_address: String,

    // HTTP API listen port
    #[clap(
        long,
        default_value = settings::DEFAULT_PORT_HTTP,
        env("BUDDI_HTTP_LISTEN_PORT"),
        help = "Port to bind the Buddi HTTP API server to"
    )]
    pub listen_port: u16,

    #[clap(
        long,
        default_value = settings::DEFAULT_ACTIVE_USER_TTL_MINUTES,
        env("BUDDI_ACTIVE_USER_TIMEOUT_MINUTES"),
        help = "Minutes without activity before a sender leaves the group"
    )]
    pub active_user_ttl_minutes: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_CONVERSATION_TTL_HOURS,
        env("BUDDI_CONVERSATION_CLEANUP_HOURS"),
        help = "Hours after creation before a sender's history is dropped"
    )]
    pub conversation_ttl_hours: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_CACHE_TTL_HOURS,
        env("BUDDI_CACHE_EXPIRY_HOURS"),
        help = "Hours a generated reply stays cached"
    )]
    pub cache_ttl_hours: u64,

    // Rate limit settings: window length
    #[clap(
        long,
        default_value = settings::DEFAULT_RATE_LIMIT_WINDOW_MS,
        env("BUDDI_RATE_LIMIT_WINDOW_MS"),
        help = "Rate limit window in milliseconds"
    )]
    pub rate_limit_window_ms: u64,

    // Rate limit settings: max commands (per window)
    #[clap(
        long,
        default_value = settings::DEFAULT_RATE_LIMIT_MAX_COMMANDS,
        env("BUDDI_MAX_COMMANDS_PER_WINDOW"),
        help = "Max commands allowed per window"
    )]
    pub rate_limit_max_commands: u32,

    #[clap(
        long,
        default_value = settings::DEFAULT_HISTORY_CAP,
        env("BUDDI_HISTORY_CAP"),
        help = "Number of history entries kept per sender"
    )]
    pub history_cap: usize,

    #[clap(
        long,
        default_value = settings::DEFAULT_SWEEP_INTERVAL_SECONDS,
        env("BUDDI_SWEEP_INTERVAL_SECONDS"),
        help = "Seconds between background sweeps of expired state"
    )]
    pub sweep_interval_seconds: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_RESPONSE_TIMEOUT_MS,
        env("BUDDI_RESPONSE_TIMEOUT_MS"),
        help = "Milliseconds allowed for reply generation"
    )]
    pub response_timeout_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_DELIVERY_TIMEOUT_MS,
        env("BUDDI_DELIVERY_TIMEOUT_MS"),
        help = "Milliseconds allowed for a single outbound delivery"
    )]
    pub delivery_timeout_ms: u64,

    // Outbound relay
    #[clap(
        long,
        env("BUDDI_RELAY_URL"),
        help = "HTTP endpoint that relays outbound messages (e.g., http://relay:9000/send). If empty, deliveries are only logged."
    )]
    pub relay_url: Option<Url>,

    #[clap(
        long,
        env("BUDDI_TEST_ENDPOINT"),
        help = "Expose POST /test, which accepts JSON messages without the SMS webhook format"
    )]
    pub test_endpoint: bool,
}

impl Cli {
    pub fn into_settings(self) -> settings::Settings {
        settings::Settings {
            listen_address: self.listen_address,
            listen_port: self.listen_port,
            store: StoreSettings {
                active_user_ttl_minutes: self.active_user_ttl_minutes,
                conversation_ttl_hours: self.conversation_ttl_hours,
                cache_ttl_hours: self.cache_ttl_hours,
                history_cap: self.history_cap,
                rate_limit: RateLimitSettings {
                    window_ms: self.rate_limit_window_ms,
                    max_commands: self.rate_limit_max_commands,
                },
            },
            sweep_interval_seconds: self.sweep_interval_seconds,
            response_timeout_ms: self.response_timeout_ms,
            delivery_timeout_ms: self.delivery_timeout_ms,
            relay_url: self.relay_url,
            test_endpoint: self.test_endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_match_settings_defaults() {
        let cli = Cli::try_parse_from(["buddi"]).unwrap();
        let parsed = cli.into_settings();
        let expected = settings::Settings::default();
        assert_eq!(parsed.listen_address, expected.listen_address);
        assert_eq!(parsed.listen_port, expected.listen_port);
        assert_eq!(parsed.store, expected.store);
        assert_eq!(parsed.sweep_interval_seconds, expected.sweep_interval_seconds);
        assert_eq!(parsed.response_timeout_ms, expected.response_timeout_ms);
        assert_eq!(parsed.delivery_timeout_ms, expected.delivery_timeout_ms);
        assert_eq!(parsed.test_endpoint, expected.test_endpoint);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "buddi",
            "--rate-limit-window-ms",
            "250",
            "--rate-limit-max-commands",
            "3",
            "--history-cap",
            "4",
            "--relay-url",
            "http://relay.local:9000/send",
            "--test-endpoint",
        ])
        .unwrap();
        let parsed = cli.into_settings();
        assert_eq!(parsed.store.rate_limit.window_ms, 250);
        assert_eq!(parsed.store.rate_limit.max_commands, 3);
        assert_eq!(parsed.store.history_cap, 4);
        assert!(parsed.test_endpoint);
        assert_eq!(
            parsed.relay_url.map(|u| u.to_string()),
            Some("http://relay.local:9000/send".to_string())
        );
    }
}
