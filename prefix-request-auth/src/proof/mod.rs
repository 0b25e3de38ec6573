//! Proof of knowledge of the shared secret.
//!
//! A peer requesting a route for `<prefix-uri>` answers with
//! `HEX_UPPER(SHA-256(secret || prefix-uri))`, where `prefix-uri` is the raw
//! component bytes exactly as they arrived on the wire.

mod secret;
mod verify;

pub use secret::Secret;
pub use verify::{compare_answers, expected_proof, verify_proof, Comparison};
