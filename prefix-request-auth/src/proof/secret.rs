//! The process-wide shared secret.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Shared secret that peers prove knowledge of.
///
/// # Security
///
/// - Zeroized on drop
/// - No `Debug`/`Display` that would print the secret
/// - Immutable after construction; the daemon shares it read-only
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap the secret bytes.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Borrow the raw secret bytes.
    ///
    /// # Security
    ///
    /// Do not copy the returned slice into long-lived storage.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([redacted])")
    }
}
