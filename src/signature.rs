// Verifies that an inbound interaction was signed by the chat platform.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;
use tracing::{error, info, warn};

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("public key is not valid hex: {0}")]
    KeyHex(#[from] hex::FromHexError),
    #[error("public key must be 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("public key is not a valid Ed25519 point")]
    KeyPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Invalid,
}

impl Verification {
    pub fn is_valid(self) -> bool {
        self == Verification::Valid
    }
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Parse the application's hex-encoded public key once at start-up.
    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let raw = hex::decode(public_key.trim())?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::KeyLength(raw.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::KeyPoint)?;
        Ok(SignatureVerifier { key })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        SignatureVerifier { key }
    }

    /// Checks `signature` over `timestamp || body`.
    ///
    /// Fails closed: a missing header, an empty body, or a signature that
    /// cannot even be decoded all yield [`Verification::Invalid`].
    pub fn verify(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
    ) -> Verification {
        let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
            warn!("Missing signature headers.");
            return Verification::Invalid;
        };
        if body.is_empty() {
            warn!("Missing request body.");
            return Verification::Invalid;
        }

        let sig_bytes = match hex::decode(signature.trim()) {
            Ok(b) => b,
            Err(e) => {
                error!("Error decoding signature: {e}");
                return Verification::Invalid;
            }
        };
        let sig = match Signature::from_slice(&sig_bytes) {
            Ok(s) => s,
            Err(e) => {
                error!("Error verifying signature: {e}");
                return Verification::Invalid;
            }
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        match self.key.verify(&message, &sig) {
            Ok(()) => {
                info!("Discord signature has been verified.");
                Verification::Valid
            }
            Err(_) => {
                error!("Signature is invalid");
                Verification::Invalid
            }
        }
    }
}
