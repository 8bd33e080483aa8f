//! Encryption functionality for DLMS/COSEM

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes128Gcm, Aes256Gcm, Key, Nonce,
};
use dlms_core::{DlmsError, DlmsResult};

/// Length of the GCM authentication tag appended to every ciphertext
pub const GCM_TAG_LENGTH: usize = 16;

/// AES-GCM cipher selected by key length
pub enum AesGcmEncryption {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl AesGcmEncryption {
    /// Create a cipher for a 16-byte (AES-128) or 32-byte (AES-256) key
    pub fn new(key: &[u8]) -> DlmsResult<Self> {
        match key.len() {
            16 => Ok(AesGcmEncryption::Aes128(Box::new(Aes128Gcm::new(
                Key::<Aes128Gcm>::from_slice(key),
            )))),
            32 => Ok(AesGcmEncryption::Aes256(Box::new(Aes256Gcm::new(
                Key::<Aes256Gcm>::from_slice(key),
            )))),
            other => Err(DlmsError::Config(format!(
                "Invalid AES-GCM key length: expected 16 or 32 bytes, got {}",
                other
            ))),
        }
    }

    /// Security suite id carried in the security-control byte
    pub fn suite_id(&self) -> u8 {
        match self {
            AesGcmEncryption::Aes128(_) => 0,
            AesGcmEncryption::Aes256(_) => 2,
        }
    }

    /// Encrypt, returning ciphertext followed by the 16-byte tag
    pub fn encrypt(&self, iv: &[u8; 12], plaintext: &[u8], aad: &[u8]) -> DlmsResult<Vec<u8>> {
        let nonce = Nonce::from_slice(iv);
        let payload = Payload { msg: plaintext, aad };
        let result = match self {
            AesGcmEncryption::Aes128(cipher) => cipher.encrypt(nonce, payload),
            AesGcmEncryption::Aes256(cipher) => cipher.encrypt(nonce, payload),
        };
        result.map_err(|e| DlmsError::Security(format!("Encryption failed: {}", e)))
    }

    /// Decrypt ciphertext followed by its tag, rejecting a tag that does not verify
    pub fn decrypt(&self, iv: &[u8; 12], ciphertext: &[u8], aad: &[u8]) -> DlmsResult<Vec<u8>> {
        if ciphertext.len() < GCM_TAG_LENGTH {
            return Err(DlmsError::Security(format!(
                "Ciphertext shorter than the {}-byte tag",
                GCM_TAG_LENGTH
            )));
        }
        let nonce = Nonce::from_slice(iv);
        let payload = Payload { msg: ciphertext, aad };
        let result = match self {
            AesGcmEncryption::Aes128(cipher) => cipher.decrypt(nonce, payload),
            AesGcmEncryption::Aes256(cipher) => cipher.decrypt(nonce, payload),
        };
        result.map_err(|_| DlmsError::Security("Authentication failure: GCM tag mismatch".to_string()))
    }
}

/// Security control byte for DLMS APDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityControl {
    byte: u8,
}

impl SecurityControl {
    pub fn new(security_suite_id: u8, authenticated: bool, encrypted: bool) -> Self {
        let mut byte = security_suite_id & 0x0F;
        if authenticated {
            byte |= 0x10;
        }
        if encrypted {
            byte |= 0x20;
        }
        Self { byte }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self { byte }
    }

    pub fn to_byte(&self) -> u8 {
        self.byte
    }

    pub fn security_suite_id(&self) -> u8 {
        self.byte & 0x0F
    }

    pub fn is_authenticated(&self) -> bool {
        (self.byte & 0x10) != 0
    }

    pub fn is_encrypted(&self) -> bool {
        (self.byte & 0x20) != 0
    }
}
