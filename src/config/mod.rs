//! Application configuration loaded from environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:8080`).
    pub server_addr: SocketAddr,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Shared secret sent and checked in the `X-Game-Secret` header. Empty disables the check.
    pub game_secret: String,
    /// Where presence notifications are posted.
    pub notify_endpoint: String,
    /// Base URL of the Roblox groups API.
    pub groups_api: String,
    /// Group whose members may be tracked. `0` means nobody is tracked.
    pub group_id: u64,
    /// Minimum rank in `group_id` for an actor to count as tracked.
    pub min_rank: u8,
    /// Settings for the tracker core.
    pub tracker: TrackerSettings,
}

/// Timing knobs for the activity tracker and client emitter.
#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    /// Idle time after which a one-shot `inactive` notification fires.
    pub inactivity_threshold: Duration,
    /// How often each actor's monitor checks for idleness.
    pub poll_interval: Duration,
    /// Client-side throttle window for activity signals. Read by
    /// `ActivityEmitter::from_settings`; the server itself never throttles.
    pub throttle_window: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(600),
            poll_interval: Duration::from_secs(30),
            throttle_window: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let server_addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let game_secret = std::env::var("GAME_SECRET").unwrap_or_default();
        let notify_endpoint = std::env::var("NOTIFY_ENDPOINT")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/roblox/presence".to_string());
        let groups_api = std::env::var("ROBLOX_GROUPS_API")
            .unwrap_or_else(|_| "https://groups.roblox.com".to_string());

        let group_id = parse_var("GROUP_ID", 0u64)?;
        let min_rank = parse_var("MIN_RANK", 121u8)?;

        let tracker = TrackerSettings {
            inactivity_threshold: Duration::from_secs(parse_var("INACTIVITY_THRESHOLD_SECS", 600u64)?),
            poll_interval: Duration::from_secs(parse_var("POLL_INTERVAL_SECS", 30u64)?),
            throttle_window: Duration::from_secs(parse_var("CLIENT_THROTTLE_SECS", 5u64)?),
        };
        if tracker.poll_interval.is_zero() {
            return Err(ConfigLoadError::Invalid("POLL_INTERVAL_SECS"));
        }

        Ok(Self {
            server_addr,
            log_level,
            game_secret,
            notify_endpoint,
            groups_api,
            group_id,
            min_rank,
            tracker,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigLoadError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::Invalid(name)),
        _ => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,

    #[error("Invalid value for {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tracker_settings() {
        let s = TrackerSettings::default();
        assert_eq!(s.inactivity_threshold, Duration::from_secs(600));
        assert_eq!(s.poll_interval, Duration::from_secs(30));
        assert_eq!(s.throttle_window, Duration::from_secs(5));
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let v: u64 = parse_var("STAFFCLOCK_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }
}
