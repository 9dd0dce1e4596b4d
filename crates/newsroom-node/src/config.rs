//! Node configuration.
//!
//! Values are layered, later sources winning:
//!
//! 1. [`NodeConfig::default`]
//! 2. an optional YAML file
//! 3. `NEWSROOM_*` environment variables (e.g. `NEWSROOM_DATABASE_PATH`)
//! 4. command-line flags, applied by the binary

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::observability::LogFormat;

/// Prefix of environment variables read by [`NodeConfig::load`].
pub const ENV_PREFIX: &str = "NEWSROOM";

/// Configuration for the Newsroom node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Snapshot file.
    pub database_path: PathBuf,
    /// Load the snapshot at startup and save it after every mutation.
    pub persistence: bool,
    /// Log level.
    pub log_level: String,
    /// Log format (`pretty` or `json`).
    pub log_format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_path: PathBuf::from("database.yml"),
            persistence: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty.as_str().to_string(),
        }
    }
}

impl NodeConfig {
    /// Loads configuration from defaults, `file` (if given) and the
    /// environment.
    ///
    /// A file that is named but missing is an error.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Parsed log format.
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.log_format)
    }
}
