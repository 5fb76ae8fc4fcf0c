use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;

/// Process-wide configuration, loaded once at startup from the environment
/// (spec §6) and threaded through the Supervisor by `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    pub ledger_base_url: String,
    pub network_passphrase: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_logs: usize,
    pub prep: Duration,
    pub post: Duration,
    pub seq_ttl: Duration,
    pub poll_interval: Duration,
    pub sweep_interval: Duration,
    pub tx_fee_stroops: u32,
    pub tx_validity_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_base_url: DEFAULT_LEDGER_BASE_URL.to_string(),
            network_passphrase: DEFAULT_NETWORK_PASSPHRASE.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: Vec::new(),
            max_logs: DEFAULT_MAX_LOGS,
            prep: Duration::from_millis(DEFAULT_PREP_MS),
            post: Duration::from_millis(DEFAULT_POST_MS),
            seq_ttl: Duration::from_millis(DEFAULT_SEQ_TTL_MS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            tx_fee_stroops: DEFAULT_TX_FEE_STROOPS,
            tx_validity_secs: DEFAULT_TX_VALIDITY_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to spec
    /// defaults for anything unset. Invalid (but present) values are a
    /// `ConfigError`, causing the caller to abort startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();

        if let Ok(v) = std::env::var("LEDGER_BASE_URL") {
            cfg.ledger_base_url = v;
        }
        if let Ok(v) = std::env::var("NETWORK_PASSPHRASE") {
            cfg.network_passphrase = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            cfg.port = parse_env("PORT", &v)?;
        }
        if let Ok(v) = std::env::var("CORS_ALLOWED_ORIGINS") {
            cfg.cors_allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("MAX_LOGS") {
            cfg.max_logs = parse_env("MAX_LOGS", &v)?;
        }
        if let Ok(v) = std::env::var("PREP_MS") {
            cfg.prep = Duration::from_millis(parse_env("PREP_MS", &v)?);
        }
        if let Ok(v) = std::env::var("POST_MS") {
            cfg.post = Duration::from_millis(parse_env("POST_MS", &v)?);
        }
        if let Ok(v) = std::env::var("SEQ_TTL_MS") {
            cfg.seq_ttl = Duration::from_millis(parse_env("SEQ_TTL_MS", &v)?);
        }
        if let Ok(v) = std::env::var("POLL_INTERVAL") {
            cfg.poll_interval = Duration::from_secs(parse_duration_secs("POLL_INTERVAL", &v)?);
        }
        if let Ok(v) = std::env::var("SWEEP_INTERVAL") {
            cfg.sweep_interval = Duration::from_secs(parse_duration_secs("SWEEP_INTERVAL", &v)?);
        }
        if let Ok(v) = std::env::var("TX_FEE") {
            cfg.tx_fee_stroops = parse_env("TX_FEE", &v)?;
        }
        if let Ok(v) = std::env::var("TX_VALIDITY_S") {
            cfg.tx_validity_secs = parse_env("TX_VALIDITY_S", &v)?;
        }

        if cfg.ledger_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "LEDGER_BASE_URL".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(cfg)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("could not parse {raw:?}"),
    })
}

/// `POLL_INTERVAL`/`SWEEP_INTERVAL` accept either a bare integer (seconds)
/// or a `{n}m`/`{n}s` suffix, matching the "5m" style shown in spec §6.
fn parse_duration_secs(var: &str, raw: &str) -> Result<u64, ConfigError> {
    let raw = raw.trim();
    if let Some(stripped) = raw.strip_suffix('m') {
        return parse_env::<u64>(var, stripped).map(|m| m * 60);
    }
    if let Some(stripped) = raw.strip_suffix('s') {
        return parse_env(var, stripped);
    }
    parse_env(var, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.ledger_base_url, "https://api.mainnet.minepi.com");
        assert_eq!(cfg.network_passphrase, "Pi Network");
        assert_eq!(cfg.max_logs, 500);
        assert_eq!(cfg.prep, Duration::from_millis(2000));
        assert_eq!(cfg.post, Duration::from_millis(5));
    }

    #[test]
    fn duration_suffix_parsing() {
        assert_eq!(parse_duration_secs("X", "5m").unwrap(), 300);
        assert_eq!(parse_duration_secs("X", "30s").unwrap(), 30);
        assert_eq!(parse_duration_secs("X", "90").unwrap(), 90);
    }
}
