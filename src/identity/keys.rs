//! Ed25519 host keys

use super::{HostPublicKey, IdentityError, Specifier};
use ed25519_dalek::VerifyingKey;

impl From<&VerifyingKey> for HostPublicKey {
    fn from(key: &VerifyingKey) -> Self {
        HostPublicKey::new(Specifier::ED25519, key.to_bytes().to_vec())
    }
}

impl From<VerifyingKey> for HostPublicKey {
    fn from(key: VerifyingKey) -> Self {
        HostPublicKey::from(&key)
    }
}

impl HostPublicKey {
    /// Interpret the key as an Ed25519 verifying key
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, IdentityError> {
        if self.algorithm != Specifier::ED25519 {
            return Err(IdentityError::UnknownAlgorithm(self.algorithm.name()));
        }
        let bytes: [u8; 32] = self.key.as_slice().try_into().map_err(|_| {
            IdentityError::InvalidKey(format!("expected 32 key bytes, got {}", self.key.len()))
        })?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| IdentityError::InvalidKey(e.to_string()))
    }
}

/// Fresh random Ed25519 host key, for tests
#[cfg(test)]
pub(crate) fn random_host_key() -> HostPublicKey {
    let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
    HostPublicKey::from(signing_key.verifying_key())
}
