//! Signing identity used for replies and forwarder commands.
//!
//! - [`PrivateKey`] - Signing key with automatic zeroization on drop
//! - [`PublicKey`] - Verification key for signature checks
//! - [`Signature`] - Ed25519 signature over a message
//!
//! # Example
//!
//! ```
//! use prefix_request_auth::identity::PrivateKey;
//!
//! let private_key = PrivateKey::generate();
//! let signature = private_key.sign(b"signed portion");
//! assert!(private_key.public_key().verify(b"signed portion", &signature));
//! ```

mod keys;

pub use keys::{KeyError, PrivateKey, PublicKey, SecretBytes, Signature};
