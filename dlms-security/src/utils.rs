//! Security utility functions for DLMS/COSEM

use dlms_core::{DlmsError, DlmsResult};
use rand::RngCore;

/// Length of the client-to-server challenge sent in the AARQ
pub const CHALLENGE_LENGTH: usize = 16;

/// Parse a hex-encoded key, tolerating surrounding whitespace
pub fn parse_hex_key(name: &str, value: &str) -> DlmsResult<Vec<u8>> {
    hex::decode(value.trim())
        .map_err(|e| DlmsError::Config(format!("Invalid {}: {}", name, e)))
}

/// Parse a hex-encoded key that must be 16 or 32 bytes long
pub fn parse_aes_key(name: &str, value: &str) -> DlmsResult<Vec<u8>> {
    let key = parse_hex_key(name, value)?;
    match key.len() {
        16 | 32 => Ok(key),
        len => Err(DlmsError::Config(format!(
            "{} must be 16 or 32 bytes, got {}",
            name, len
        ))),
    }
}

/// Generate a random challenge for high-level authentication
pub fn generate_challenge() -> Vec<u8> {
    let mut challenge = vec![0u8; CHALLENGE_LENGTH];
    rand::thread_rng().fill_bytes(&mut challenge);
    challenge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_key() {
        assert_eq!(parse_hex_key("key", " 0a0B ").unwrap(), vec![0x0A, 0x0B]);
        assert!(matches!(parse_hex_key("key", "0g"), Err(DlmsError::Config(_))));
        assert!(parse_hex_key("key", "abc").is_err());
    }

    #[test]
    fn test_parse_aes_key_length() {
        assert_eq!(parse_aes_key("enc", &"00".repeat(16)).unwrap().len(), 16);
        assert_eq!(parse_aes_key("enc", &"ff".repeat(32)).unwrap().len(), 32);
        let err = parse_aes_key("enc", &"00".repeat(15)).unwrap_err();
        assert!(err.to_string().contains("16 or 32"));
    }

    #[test]
    fn test_generate_challenge() {
        let a = generate_challenge();
        let b = generate_challenge();
        assert_eq!(a.len(), CHALLENGE_LENGTH);
        assert_ne!(a, b);
    }
}
