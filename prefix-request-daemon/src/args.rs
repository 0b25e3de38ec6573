//! CLI argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Registers routes toward peers that prove knowledge of a shared secret.
#[derive(Parser)]
#[command(name = "prefix-request", version, about)]
pub struct Args {
    /// Shared secret peers must prove knowledge of
    #[arg(value_name = "SECRET")]
    pub secret: String,

    /// Forwarder socket (unix:///path or a plain path)
    #[arg(
        long,
        env = "NDN_CLIENT_TRANSPORT",
        default_value = "unix:///run/nfd/nfd.sock",
        value_name = "URI"
    )]
    pub transport: String,

    /// PKCS#8 Ed25519 key used to sign replies and commands
    #[arg(long, env = "PREFIX_REQUEST_KEY", value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Identity name that signatures are made under
    #[arg(
        long,
        env = "PREFIX_REQUEST_IDENTITY",
        default_value = "/localhost/prefix-request",
        value_name = "NAME"
    )]
    pub identity: String,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("secret", &"<redacted>")
            .field("transport", &self.transport)
            .field("key", &self.key)
            .field("identity", &self.identity)
            .finish()
    }
}
