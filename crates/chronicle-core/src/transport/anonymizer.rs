//! Per-stream transforms for sensitive string fields.

use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};

use crate::error::DomainError;
use crate::stream::StreamId;

/// Transforms sensitive values on the way into and out of storage.
///
/// Which fields are sensitive is declared statically by each transport model
/// (see [`TransportEvent::visit_sensitive`](super::TransportEvent::visit_sensitive)).
pub trait Anonymizer: Send + Sync + fmt::Debug {
    /// Transforms a value before it is stored.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the value cannot be transformed.
    fn anonymize(&self, stream_id: &StreamId, value: &str) -> Result<String, DomainError>;

    /// Reverses [`Anonymizer::anonymize`] where that is possible.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the value cannot be restored.
    fn deanonymize(&self, stream_id: &StreamId, value: &str) -> Result<String, DomainError>;
}

/// Replaces sensitive values with the stream id. The original is lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskingAnonymizer;

impl Anonymizer for MaskingAnonymizer {
    fn anonymize(&self, stream_id: &StreamId, _value: &str) -> Result<String, DomainError> {
        Ok(stream_id.to_string())
    }

    fn deanonymize(&self, _stream_id: &StreamId, value: &str) -> Result<String, DomainError> {
        Ok(value.to_owned())
    }
}

/// Replaces sensitive values with a salted SHA-256 pseudonym.
///
/// The pseudonym is stable for a given salt, stream and value, so equal
/// values stay comparable without being readable.
#[derive(Clone)]
pub struct HashingAnonymizer {
    salt: Vec<u8>,
}

impl HashingAnonymizer {
    /// Prefix of every pseudonym.
    pub const PREFIX: &'static str = "sha256:";

    /// Creates an anonymizer with the given salt.
    #[must_use]
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        Self { salt: salt.into() }
    }
}

impl fmt::Debug for HashingAnonymizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashingAnonymizer")
            .field("salt", &"<redacted>")
            .finish()
    }
}

impl Anonymizer for HashingAnonymizer {
    fn anonymize(&self, stream_id: &StreamId, value: &str) -> Result<String, DomainError> {
        let digest = Sha256::new()
            .chain_update(&self.salt)
            .chain_update([0])
            .chain_update(stream_id.as_str())
            .chain_update([0])
            .chain_update(value)
            .finalize();
        Ok(format!("{}{digest:x}", Self::PREFIX))
    }

    fn deanonymize(&self, _stream_id: &StreamId, value: &str) -> Result<String, DomainError> {
        Ok(value.to_owned())
    }
}

/// Supplies the encryption key of a stream.
///
/// Keys are per stream so that deleting one key makes the personal data
/// of that stream unreadable while the events themselves stay intact.
pub trait SecretProvider: Send + Sync + fmt::Debug {
    /// Returns the 32-byte AES-256 key for `stream_id`.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if no key is available for the stream.
    fn secret_for(&self, stream_id: &StreamId) -> Result<Vec<u8>, DomainError>;
}

/// Uses the same key for every stream.
#[derive(Clone)]
pub struct ConstantSecretProvider {
    secret: Vec<u8>,
}

impl ConstantSecretProvider {
    /// Creates a provider handing out `secret`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for ConstantSecretProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantSecretProvider")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SecretProvider for ConstantSecretProvider {
    fn secret_for(&self, _stream_id: &StreamId) -> Result<Vec<u8>, DomainError> {
        Ok(self.secret.clone())
    }
}

/// Encrypts sensitive values with AES-256-GCM under the stream's key.
///
/// The stored form is the hex encoding of a random 96-bit nonce followed by
/// the ciphertext, so equal values encrypt differently every time.
/// [`Anonymizer::deanonymize`] restores the original value.
#[derive(Debug, Clone)]
pub struct AesAnonymizer {
    secrets: Arc<dyn SecretProvider>,
}

impl AesAnonymizer {
    const NONCE_LEN: usize = 12;

    /// Creates an anonymizer reading keys from `secrets`.
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretProvider>) -> Self {
        Self { secrets }
    }

    fn cipher(&self, stream_id: &StreamId) -> Result<Aes256Gcm, DomainError> {
        let secret = self.secrets.secret_for(stream_id)?;
        Aes256Gcm::new_from_slice(&secret).map_err(|_| {
            DomainError::Configuration(format!(
                "secret for stream {stream_id} must be 32 bytes, got {}",
                secret.len()
            ))
        })
    }
}

impl Anonymizer for AesAnonymizer {
    fn anonymize(&self, stream_id: &StreamId, value: &str) -> Result<String, DomainError> {
        let cipher = self.cipher(stream_id)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher.encrypt(&nonce, value.as_bytes()).map_err(|_| {
            DomainError::Serialization(format!("cannot encrypt value of stream {stream_id}"))
        })?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    fn deanonymize(&self, stream_id: &StreamId, value: &str) -> Result<String, DomainError> {
        let sealed = hex::decode(value).map_err(|e| {
            DomainError::Serialization(format!(
                "encrypted value of stream {stream_id} is not hex: {e}"
            ))
        })?;
        if sealed.len() < Self::NONCE_LEN {
            return Err(DomainError::Serialization(format!(
                "encrypted value of stream {stream_id} is too short"
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(Self::NONCE_LEN);
        let plaintext = self
            .cipher(stream_id)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                DomainError::Serialization(format!("cannot decrypt value of stream {stream_id}"))
            })?;
        String::from_utf8(plaintext).map_err(|e| {
            DomainError::Serialization(format!("decrypted value of stream {stream_id}: {e}"))
        })
    }
}
