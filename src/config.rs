//! Bridge configuration.
//!
//! All settings come from the process environment (a `.env` file in the
//! working directory is loaded first by `main`). Every variable has a local
//! default so a single operator machine runs the bridge with no setup.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const PORT_VAR: &str = "POSNET_BRIDGE_PORT";
pub const API_KEY_VAR: &str = "FISCAL_POSNET_API_KEY";
pub const SPOOL_DIR_VAR: &str = "FISCAL_POSNET_SPOOL_DIR";

pub const DEFAULT_PORT: u16 = 9977;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

/// Runtime settings of the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub port: u16,
    /// Shared secret expected in `x-api-key`. `None` runs the bridge open.
    pub api_key: Option<String>,
    pub spool_dir: PathBuf,
}

impl BridgeConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort {
                    var: PORT_VAR,
                    value: raw.clone(),
                })?,
            None => DEFAULT_PORT,
        };

        let api_key = lookup(API_KEY_VAR).filter(|key| !key.is_empty());

        let spool_dir = match lookup(SPOOL_DIR_VAR).filter(|dir| !dir.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?.join("spool"),
        };

        Ok(Self {
            port,
            api_key,
            spool_dir,
        })
    }

    /// The bridge only ever listens on loopback.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}
