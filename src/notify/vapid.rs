//! VAPID key pairs for signing Web Push requests.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::SigningKey;
use rand_core::OsRng;

/// A P-256 key pair in the encodings Web Push uses: the public key is
/// the uncompressed SEC1 point (65 bytes) and the private key is the
/// raw 32 byte scalar, both base64url without padding.
#[derive(Debug, Clone)]
pub struct VapidKeys {
    public_key_b64: String,
    private_key_b64: String,
}

impl VapidKeys {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public_point = signing_key.verifying_key().to_encoded_point(false);
        Self {
            public_key_b64: URL_SAFE_NO_PAD.encode(public_point.as_bytes()),
            private_key_b64: URL_SAFE_NO_PAD.encode(signing_key.to_bytes().as_slice()),
        }
    }

    /// Rebuild a key pair from a configured private key, deriving the
    /// public half. Fails if the private key is not a valid scalar.
    pub fn from_private_key(private_key_b64: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(private_key_b64.trim_end_matches('='))
            .context("Invalid base64url for VAPID private key")?;
        anyhow::ensure!(
            bytes.len() == 32,
            "VAPID private key must be a 32 byte P-256 scalar, got {} bytes",
            bytes.len()
        );
        let signing_key = SigningKey::from_slice(&bytes)
            .context("VAPID private key is not a valid P-256 scalar")?;
        Ok(Self::from_signing_key(&signing_key))
    }

    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }
}
