//! Strict parsing of a textual prefix claim.
//!
//! The proof binds the raw bytes a peer sent, while the route is installed
//! for the parsed name. Accepting only input that is already in canonical
//! form keeps the two in one-to-one correspondence.

use crate::name::{Name, NameError};

/// Why a prefix claim was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalError {
    /// The bytes are not a decodable name URI.
    #[error("undecodable prefix: {0}")]
    Undecodable(#[source] NameError),

    /// The bytes are not valid UTF-8.
    #[error("undecodable prefix: not UTF-8")]
    NotUtf8,

    /// The name decodes but prints differently.
    #[error("non-canonical prefix (canonical form is {canonical})")]
    NonCanonical { canonical: String },
}

/// Parse `claim` as a name URI and require it to be in canonical form.
///
/// # Errors
///
/// Returns [`CanonicalError`] if the claim is undecodable or its canonical
/// serialization differs from the input bytes.
pub fn canonicalize(claim: &[u8]) -> Result<Name, CanonicalError> {
    let text = std::str::from_utf8(claim).map_err(|_| CanonicalError::NotUtf8)?;
    let name = Name::from_uri(text).map_err(CanonicalError::Undecodable)?;
    let canonical = name.to_uri();
    if canonical.as_bytes() != claim {
        return Err(CanonicalError::NonCanonical { canonical });
    }
    Ok(name)
}
