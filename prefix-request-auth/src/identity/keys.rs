//! Ed25519 key material for the daemon's signing identity.
//!
//! The private half never implements `Debug`, and its PKCS#8 export is
//! wiped when dropped.

use ed25519_dalek::Signer;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors from loading or exporting key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Not a PKCS#8 Ed25519 key.
    #[error("invalid key format")]
    InvalidFormat,
}

/// PKCS#8 DER bytes, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The key replies and management commands are signed with.
pub struct PrivateKey(ed25519_dalek::SigningKey);

impl PrivateKey {
    /// Fresh key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng))
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Encode for the on-disk key file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidFormat`] if encoding fails.
    pub fn to_pkcs8_der(&self) -> Result<SecretBytes, KeyError> {
        use ed25519_dalek::pkcs8::EncodePrivateKey;
        let der = self
            .0
            .to_pkcs8_der()
            .map_err(|_| KeyError::InvalidFormat)?;
        Ok(SecretBytes(der.as_bytes().to_vec()))
    }

    /// Decode a key file written by [`PrivateKey::to_pkcs8_der`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidFormat`] for anything else.
    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Self, KeyError> {
        use ed25519_dalek::pkcs8::DecodePrivateKey;
        ed25519_dalek::SigningKey::from_pkcs8_der(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidFormat)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

impl PublicKey {
    /// First 8 bytes of SHA-256 over the key; the last component of the
    /// key name placed in KeyLocators.
    #[must_use]
    pub fn key_id(&self) -> [u8; 8] {
        let hash = Sha256::digest(self.0.as_bytes());
        let mut id = [0u8; 8];
        id.copy_from_slice(&hash[..8]);
        id
    }

    /// Strict verification; small-order keys are rejected.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify_strict(message, &signature.0).is_ok()
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.key_id()))
    }
}

/// An Ed25519 signature, as carried in a SignatureValue element.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    pub const LEN: usize = 64;

    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] unless `bytes` is 64 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; Self::LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&bytes)))
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0.to_bytes()
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.to_bytes()[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::generate();
        let signature = key.sign(b"signed portion");

        assert!(key.public_key().verify(b"signed portion", &signature));
        assert!(!key.public_key().verify(b"other portion", &signature));
    }

    #[test]
    fn test_signature_from_other_key_rejected() {
        let signature = PrivateKey::generate().sign(b"signed portion");

        assert!(!PrivateKey::generate()
            .public_key()
            .verify(b"signed portion", &signature));
    }

    #[test]
    fn test_key_id_is_stable_per_key() {
        let key = PrivateKey::generate();

        assert_eq!(key.public_key().key_id(), key.public_key().key_id());
        assert_ne!(
            key.public_key().key_id(),
            PrivateKey::generate().public_key().key_id()
        );
    }

    #[test]
    fn test_signature_length_checked() {
        assert_eq!(
            Signature::from_bytes(&[0u8; 32]),
            Err(KeyError::InvalidLength {
                expected: 64,
                actual: 32
            })
        );
        assert!(Signature::from_bytes(&[0u8; 65]).is_err());

        let signature = PrivateKey::generate().sign(b"x");
        assert_eq!(Signature::from_bytes(&signature.to_bytes()), Ok(signature));
    }

    #[test]
    fn test_pkcs8_der_restores_same_key() {
        let original = PrivateKey::generate();
        let der = original.to_pkcs8_der().unwrap();
        let restored = PrivateKey::from_pkcs8_der(der.as_bytes()).unwrap();

        assert_eq!(original.public_key(), restored.public_key());
        // deterministic signatures
        assert_eq!(
            original.sign(b"reply").to_bytes(),
            restored.sign(b"reply").to_bytes()
        );
    }

    #[test]
    fn test_pkcs8_der_garbage_rejected() {
        for garbage in [&[0u8; 48][..], &[0xDE, 0xAD, 0xBE, 0xEF], &[]] {
            assert_eq!(
                PrivateKey::from_pkcs8_der(garbage).err(),
                Some(KeyError::InvalidFormat)
            );
        }
    }
}
