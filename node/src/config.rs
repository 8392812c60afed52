// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use rootledger_kernel::config::SECONDS_PER_DAY;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Default epoch length must be greater than zero")]
    ZeroEpochLength,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Epoch length of the default series, in seconds.
    pub default_epoch_length: u64,
    /// Durable event log. `None` runs the ledger in memory only.
    pub event_log_path: Option<PathBuf>,
    pub snapshot_path: Option<PathBuf>,
    pub auto_snapshot_interval_secs: Option<u64>,
    /// Principal allowed to publish into the default series. `None` leaves it open.
    pub admin_principal: Option<String>,
    /// Buffered notifications per `/v1/events/stream` subscriber.
    pub event_channel_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            default_epoch_length: SECONDS_PER_DAY,
            event_log_path: None,
            snapshot_path: None,
            auto_snapshot_interval_secs: None,
            admin_principal: None,
            event_channel_capacity: 1024,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl NodeConfig {
    /// Defaults overridden by `ROOTLEDGER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`NodeConfig::from_env`] but reads through `lookup`, so tests
    /// need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("ROOTLEDGER_BIND_ADDR") {
            cfg.bind_addr = parse_var("ROOTLEDGER_BIND_ADDR", v)?;
        }
        if let Some(v) = lookup("ROOTLEDGER_DEFAULT_EPOCH_LENGTH") {
            cfg.default_epoch_length = parse_var("ROOTLEDGER_DEFAULT_EPOCH_LENGTH", v)?;
        }
        if let Some(v) = lookup("ROOTLEDGER_EVENT_LOG") {
            cfg.event_log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ROOTLEDGER_SNAPSHOT") {
            cfg.snapshot_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ROOTLEDGER_SNAPSHOT_INTERVAL_SECS") {
            let secs: u64 = parse_var("ROOTLEDGER_SNAPSHOT_INTERVAL_SECS", v.clone())?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "ROOTLEDGER_SNAPSHOT_INTERVAL_SECS",
                    value: v,
                });
            }
            cfg.auto_snapshot_interval_secs = Some(secs);
        }
        if let Some(v) = lookup("ROOTLEDGER_ADMIN") {
            let v = v.trim().to_string();
            if !v.is_empty() {
                cfg.admin_principal = Some(v);
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_epoch_length == 0 {
            return Err(ConfigError::ZeroEpochLength);
        }
        Ok(())
    }
}
