use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

/// The control-socket port the emulated host binds by default.
const DEFAULT_PORT: u16 = 65221;

/// Compatibility default matching the emulated host's per-connection read
/// cap; a bound, not a protocol constant.
const DEFAULT_MAX_REQUEST_BYTES: usize = 1000;

const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MAX_REQUEST_BYTES must be a positive integer")]
    InvalidMaxRequestBytes,
    #[error("READ_TIMEOUT_SECS must be a positive integer")]
    InvalidReadTimeout,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        let max_request_bytes = env::var("MAX_REQUEST_BYTES")
            .ok()
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|bytes| *bytes > 0)
                    .ok_or(ConfigError::InvalidMaxRequestBytes)
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);
        let read_timeout_secs = env::var("READ_TIMEOUT_SECS")
            .ok()
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidReadTimeout)
            })
            .transpose()?
            .unwrap_or(DEFAULT_READ_TIMEOUT_SECS);

        let config = Self {
            bind_addr,
            bind_port,
            max_request_bytes,
            read_timeout: Duration::from_secs(read_timeout_secs),
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
