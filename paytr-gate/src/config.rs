//! Configuration module for environment variable parsing.
//!
//! Secrets are optional here on purpose: a missing key or salt is reported
//! per request as a `misconfigured` rejection instead of refusing to boot.

use std::env;
use std::time::Duration;
use tracing::warn;

/// Field order used when `HASH_FIELD_ORDER` is unset or empty.
///
/// This is a placeholder; the authoritative order comes from PayTR's
/// notification documentation.
pub const DEFAULT_FIELD_ORDER: [&str; 3] = ["merchant_oid", "status", "total_amount"];

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// HMAC key shared with PayTR
    pub merchant_key: Option<String>,

    /// Salt appended to the canonical string before signing
    pub merchant_salt: Option<String>,

    /// Form fields concatenated into the canonical string, in order
    pub hash_field_order: Vec<String>,

    /// Port for the web server to listen on
    pub port: u16,

    /// How long an identical raw payload counts as a replay
    pub replay_window: Duration,

    /// Interval of the background fingerprint sweep (`None` disables it)
    pub sweep_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let hash_field_order = parse_csv("HASH_FIELD_ORDER")
            .or_else(|| parse_csv("PAYTR_HASH_FIELDS"))
            .filter(|order| !order.is_empty())
            .unwrap_or_else(default_field_order);

        let sweep_secs = parse_u64("FINGERPRINT_SWEEP_SECS", 60);

        Config {
            merchant_key: secret("MERCHANT_KEY").or_else(|| secret("PAYTR_MERCHANT_KEY")),

            merchant_salt: secret("MERCHANT_SALT").or_else(|| secret("PAYTR_MERCHANT_SALT")),

            hash_field_order,

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),

            replay_window: parse_replay_window("REPLAY_WINDOW_SECS"),

            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        }
    }

    /// Whether both secrets are present.
    pub fn is_signing_configured(&self) -> bool {
        self.merchant_key.is_some() && self.merchant_salt.is_some()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("merchant_key_set", &self.merchant_key.is_some())
            .field("merchant_salt_set", &self.merchant_salt.is_some())
            .field("hash_field_order", &self.hash_field_order)
            .field("port", &self.port)
            .field("replay_window", &self.replay_window)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

pub fn default_field_order() -> Vec<String> {
    DEFAULT_FIELD_ORDER.iter().map(|s| s.to_string()).collect()
}

/// Read a secret, treating blank values as unset.
fn secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Replay window in seconds. Zero would disable replay detection, so it is
/// treated as invalid.
fn parse_replay_window(name: &str) -> Duration {
    const DEFAULT_SECS: u64 = 300;

    match parse_u64(name, DEFAULT_SECS) {
        0 => {
            warn!(env_var = name, "Replay window must be positive, using default");
            Duration::from_secs(DEFAULT_SECS)
        }
        secs => Duration::from_secs(secs),
    }
}

fn parse_u64(name: &str, default: u64) -> u64 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid integer, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| split_csv(&raw))
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
