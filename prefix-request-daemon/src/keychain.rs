//! Signing identity for replies and management commands.

use std::path::Path;

use prefix_request_auth::{KeyError, PrivateKey, PublicKey};
use prefix_request_core::packet::signature_type;
use prefix_request_core::{Data, Interest, Name, SignatureInfo};

/// Bytes of random SignatureNonce in signed Interests.
const SIGNATURE_NONCE_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum KeyChainError {
    #[error("failed to access signing key at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid signing key: {0}")]
    Key(#[from] KeyError),
}

/// An Ed25519 key and the name it signs under.
pub struct KeyChain {
    key: PrivateKey,
    key_name: Name,
}

impl KeyChain {
    /// Use `key` for `identity`.
    ///
    /// The key name is `<identity>/KEY/<key id>`.
    pub fn new(key: PrivateKey, identity: &Name) -> Self {
        let key_name = identity
            .clone()
            .with("KEY")
            .with(key.public_key().key_id().to_vec());
        Self { key, key_name }
    }

    /// Load the PKCS#8 key at `path`, generating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or does not
    /// hold an Ed25519 key.
    pub fn load_or_generate(path: &Path, identity: &Name) -> Result<Self, KeyChainError> {
        let io_error = |source| KeyChainError::Io {
            path: path.display().to_string(),
            source,
        };

        let key = if path.exists() {
            let der = std::fs::read(path).map_err(io_error)?;
            PrivateKey::from_pkcs8_der(&der)?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
            let key = PrivateKey::generate();
            std::fs::write(path, key.to_pkcs8_der()?.as_bytes()).map_err(io_error)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                    .map_err(io_error)?;
            }
            tracing::info!(path = %path.display(), "Generated signing key");
            key
        };

        Ok(Self::new(key, identity))
    }

    pub fn key_name(&self) -> &Name {
        &self.key_name
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Sign a Data packet in place.
    pub fn sign_data(&self, data: &mut Data) {
        data.signature_info = Some(SignatureInfo::new(
            signature_type::SIGNATURE_ED25519,
            Some(self.key_name.clone()),
        ));
        data.signature_value = self.key.sign(&data.signed_portion()).to_bytes().to_vec();
    }

    /// Sign an Interest in place using the v0.3 signed Interest format.
    ///
    /// Adds empty ApplicationParameters when absent, a random
    /// SignatureNonce and the current SignatureTime, then appends the
    /// ParametersSha256DigestComponent.
    pub fn sign_interest(&self, interest: &mut Interest) {
        if interest.application_parameters.is_none() {
            interest.application_parameters = Some(Vec::new());
        }

        let mut info = SignatureInfo::new(
            signature_type::SIGNATURE_ED25519,
            Some(self.key_name.clone()),
        );
        info.nonce = Some(rand::random::<[u8; SIGNATURE_NONCE_LEN]>().to_vec());
        info.time = u64::try_from(chrono::Utc::now().timestamp_millis()).ok();
        interest.signature_info = Some(info);
        interest.signature_value = None;

        let signature = self.key.sign(&interest.signed_portion());
        interest.signature_value = Some(signature.to_bytes().to_vec());
        interest.update_parameters_digest();
    }
}

impl std::fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyChain")
            .field("key_name", &self.key_name.to_uri())
            .finish_non_exhaustive()
    }
}
