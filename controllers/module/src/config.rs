//! Controller configuration, read from environment variables.

use crate::error::ControllerError;
use module_jobs::sign::DEFAULT_SIGNER_IMAGE;
use module_jobs::SignerMode;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_REQUEUE_INTERVAL_SECONDS: u64 = 30;
const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;
const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;
const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch; all namespaces when `None`
    pub watch_namespace: Option<String>,
    /// Image of the signing worker
    pub signer_image: String,
    pub signer_mode: SignerMode,
    /// Delay before re-syncing a Module whose Jobs are still running
    pub requeue_interval: Duration,
    pub backoff_min_minutes: u64,
    pub backoff_max_minutes: u64,
    /// Listen address of the probes and metrics server
    pub probe_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let signer_mode = match get("SIGNER_MODE") {
            Some(mode) => SignerMode::from_str(&mode)
                .map_err(|e| ControllerError::InvalidConfig(format!("SIGNER_MODE: {}", e)))?,
            None => SignerMode::default(),
        };

        let requeue_seconds = parse_or(get("REQUEUE_INTERVAL_SECONDS"), "REQUEUE_INTERVAL_SECONDS", DEFAULT_REQUEUE_INTERVAL_SECONDS)?;
        let backoff_min_minutes = parse_or(get("BACKOFF_MIN_MINUTES"), "BACKOFF_MIN_MINUTES", DEFAULT_BACKOFF_MIN_MINUTES)?;
        let backoff_max_minutes = parse_or(get("BACKOFF_MAX_MINUTES"), "BACKOFF_MAX_MINUTES", DEFAULT_BACKOFF_MAX_MINUTES)?;

        if requeue_seconds == 0 {
            return Err(ControllerError::InvalidConfig(
                "REQUEUE_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }
        if backoff_min_minutes == 0 || backoff_min_minutes > backoff_max_minutes {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < min <= max, got {}..{}",
                backoff_min_minutes, backoff_max_minutes
            )));
        }

        let probe_addr = get("PROBE_ADDR")
            .unwrap_or_else(|| DEFAULT_PROBE_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ControllerError::InvalidConfig(format!("PROBE_ADDR: {}", e)))?;

        Ok(Self {
            watch_namespace: get("WATCH_NAMESPACE"),
            signer_image: get("SIGNER_IMAGE").unwrap_or_else(|| DEFAULT_SIGNER_IMAGE.to_string()),
            signer_mode,
            requeue_interval: Duration::from_secs(requeue_seconds),
            backoff_min_minutes,
            backoff_max_minutes,
            probe_addr,
        })
    }
}

fn parse_or(value: Option<String>, key: &str, default: u64) -> Result<u64, ControllerError> {
    match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|e| ControllerError::InvalidConfig(format!("{}='{}': {}", key, v, e))),
        None => Ok(default),
    }
}
