//! Pure authentication primitives for the prefix-request daemon.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No logging
//!
//! It holds the two pieces of key material the daemon works with:
//! - [`proof::Secret`] - the shared secret peers prove knowledge of
//! - [`identity::PrivateKey`] - the Ed25519 key replies are signed with
//!
//! # Example
//!
//! ```
//! use prefix_request_auth::proof::{expected_proof, verify_proof, Secret};
//!
//! let secret = Secret::new("s3cr3t");
//! let answer = expected_proof(&secret, b"/a/b");
//! assert!(verify_proof(&secret, b"/a/b", answer.as_bytes()));
//! ```

pub mod identity;
pub mod proof;

pub use identity::{KeyError, PrivateKey, PublicKey, SecretBytes, Signature};
pub use proof::{expected_proof, verify_proof, Secret};
