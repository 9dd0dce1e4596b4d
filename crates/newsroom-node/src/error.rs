//! Error types for the node.

use thiserror::Error;

/// Errors raised outside the request path: configuration, snapshots and
/// the listener.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Filesystem or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot format error: {0}")]
    Snapshot(#[from] serde_yaml::Error),

    /// Configuration sources could not be merged or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The configured host and port do not form a socket address.
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
