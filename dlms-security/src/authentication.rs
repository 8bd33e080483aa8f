//! Authentication tags for DLMS/COSEM

use dlms_core::{DlmsError, DlmsResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the truncated authentication tag
pub const AUTH_TAG_LENGTH: usize = 8;

/// Keyed authentication over HMAC-SHA256, truncated to [`AUTH_TAG_LENGTH`]
pub struct HmacAuth {
    key: Vec<u8>,
}

impl HmacAuth {
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    fn mac(&self, data: &[u8]) -> DlmsResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| DlmsError::Security(format!("Failed to create HMAC: {}", e)))?;
        mac.update(data);
        Ok(mac)
    }

    /// Generate the tag for `data`
    pub fn tag(&self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        let digest = self.mac(data)?.finalize().into_bytes();
        Ok(digest[..AUTH_TAG_LENGTH].to_vec())
    }

    /// Verify a tag in constant time
    pub fn verify(&self, data: &[u8], tag: &[u8]) -> DlmsResult<()> {
        if tag.len() != AUTH_TAG_LENGTH {
            return Err(DlmsError::Security(format!(
                "Authentication tag must be {} bytes, got {}",
                AUTH_TAG_LENGTH,
                tag.len()
            )));
        }
        self.mac(data)?
            .verify_truncated_left(tag)
            .map_err(|_| DlmsError::Security("Authentication tag mismatch".to_string()))
    }
}
