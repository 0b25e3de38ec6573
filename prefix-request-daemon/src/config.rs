//! Runtime configuration resolved from the command line and environment.

use std::path::PathBuf;

use prefix_request_auth::Secret;
use prefix_request_core::{Name, NameError};

use crate::args::Args;

const UNIX_SCHEME: &str = "unix://";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported transport {0:?}: only unix sockets are supported")]
    UnsupportedTransport(String),

    #[error("invalid identity name: {0}")]
    InvalidIdentity(#[from] NameError),
}

#[derive(Debug)]
pub struct Config {
    pub secret: Secret,
    pub socket_path: PathBuf,
    pub key_path: PathBuf,
    pub identity: Name,
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if the transport is not a Unix socket or the
    /// identity is not a valid name.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        Ok(Self {
            socket_path: parse_transport(&args.transport)?,
            key_path: args.key.unwrap_or_else(default_key_path),
            identity: Name::from_uri(&args.identity)?,
            secret: Secret::new(args.secret),
        })
    }
}

/// Socket path from a `unix://` URI or a bare path.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedTransport`] for any other scheme.
pub fn parse_transport(uri: &str) -> Result<PathBuf, ConfigError> {
    if let Some(path) = uri.strip_prefix(UNIX_SCHEME) {
        if path.is_empty() {
            return Err(ConfigError::UnsupportedTransport(uri.to_string()));
        }
        return Ok(PathBuf::from(path));
    }
    if uri.contains("://") || uri.is_empty() {
        return Err(ConfigError::UnsupportedTransport(uri.to_string()));
    }
    Ok(PathBuf::from(uri))
}

/// `<data dir>/prefix-request/signing_key.der`.
pub fn default_key_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("prefix-request")
        .join("signing_key.der")
}
