//! Proof computation and timing-safe verification.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::secret::Secret;

/// Result of comparing a supplied answer against the expected one.
///
/// `byte_comparisons` exists so tests can check that the amount of work does
/// not depend on where the first differing byte sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// Whether the answers are identical.
    pub matched: bool,
    /// Number of byte positions that were compared.
    pub byte_comparisons: usize,
}

/// Compute the answer a peer must present for `prefix_uri`.
///
/// `HEX_UPPER(SHA-256(secret || prefix_uri))`
#[must_use]
pub fn expected_proof(secret: &Secret, prefix_uri: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(prefix_uri);
    hex::encode_upper(hasher.finalize())
}

/// Verify a supplied answer for `prefix_uri`.
///
/// Length is checked first; length is not secret-bearing. Every byte position
/// is then visited and differences are OR-accumulated, so a guess that is
/// wrong in its first byte costs as much as one wrong in its last.
#[must_use = "verification result must be checked"]
pub fn verify_proof(secret: &Secret, prefix_uri: &[u8], supplied: &[u8]) -> bool {
    let expected = expected_proof(secret, prefix_uri);
    compare_answers(expected.as_bytes(), supplied).matched
}

/// Timing-safe comparison of two answers.
#[must_use]
pub fn compare_answers(expected: &[u8], supplied: &[u8]) -> Comparison {
    if expected.len() != supplied.len() {
        return Comparison {
            matched: false,
            byte_comparisons: 0,
        };
    }

    let mut diff = 0u8;
    let mut byte_comparisons = 0usize;
    for (a, b) in expected.iter().zip(supplied) {
        diff |= std::hint::black_box(a ^ b);
        byte_comparisons += 1;
    }

    Comparison {
        matched: diff.ct_eq(&0).into(),
        byte_comparisons,
    }
}
