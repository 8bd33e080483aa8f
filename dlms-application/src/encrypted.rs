//! Glo-ciphered APDUs
//!
//! When the security policy encrypts, every xDLMS APDU travels inside its
//! global-ciphering counterpart:
//!
//! ```text
//! glo-tag  length  security-control(1)  frame-counter(4)  ciphertext || GCM tag
//! ```
//!
//! | Plain | Glo  |                      |
//! |-------|------|----------------------|
//! | 0x01  | 0x21 | InitiateRequest      |
//! | 0x08  | 0x28 | InitiateResponse     |
//! | 0xC0  | 0xC8 | GetRequest           |
//! | 0xC1  | 0xC9 | SetRequest           |
//! | 0xC4  | 0xCC | GetResponse          |
//! | 0xC5  | 0xCD | SetResponse          |

use crate::pdu::{expect_end, EXCEPTION_RESPONSE_TAG};
use dlms_asn1::{AxdrDecoder, AxdrEncoder};
use dlms_core::{DlmsError, DlmsResult};
use dlms_security::{SecurityControl, SecuritySuite, SystemTitle};

const TAG_MAP: [(u8, u8); 6] = [
    (0x01, 0x21),
    (0x08, 0x28),
    (0xC0, 0xC8),
    (0xC1, 0xC9),
    (0xC4, 0xCC),
    (0xC5, 0xCD),
];

/// Glo tag protecting the APDU whose first byte is `plain_tag`
pub fn glo_tag_for(plain_tag: u8) -> Option<u8> {
    TAG_MAP
        .iter()
        .find(|(plain, _)| *plain == plain_tag)
        .map(|(_, glo)| *glo)
}

/// Plain tag of the APDU carried under `glo_tag`
pub fn plain_tag_for(glo_tag: u8) -> Option<u8> {
    TAG_MAP
        .iter()
        .find(|(_, glo)| *glo == glo_tag)
        .map(|(plain, _)| *plain)
}

pub fn is_glo_tag(tag: u8) -> bool {
    plain_tag_for(tag).is_some()
}

/// A glo-ciphered APDU as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GloApdu {
    tag: u8,
    security_control: SecurityControl,
    frame_counter: u32,
    /// Ciphertext followed by the GCM authentication tag
    ciphertext: Vec<u8>,
}

impl GloApdu {
    pub fn new(tag: u8, security_control: SecurityControl, frame_counter: u32, ciphertext: Vec<u8>) -> Self {
        Self {
            tag,
            security_control,
            frame_counter,
            ciphertext,
        }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn security_control(&self) -> SecurityControl {
        self.security_control
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = AxdrEncoder::with_capacity(self.ciphertext.len() + 8);
        encoder.encode_u8(self.tag);
        encoder.encode_length(5 + self.ciphertext.len());
        encoder.encode_u8(self.security_control.to_byte());
        encoder.encode_bytes(&self.frame_counter.to_be_bytes());
        encoder.encode_bytes(&self.ciphertext);
        encoder.into_bytes()
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        let tag = decoder.decode_u8()?;
        if !is_glo_tag(tag) {
            return Err(DlmsError::Protocol(format!("Not a glo-ciphered APDU: 0x{:02X}", tag)));
        }
        let length = decoder.decode_length()?;
        if length < 5 {
            return Err(DlmsError::Format(format!("Glo APDU too short: {} bytes", length)));
        }
        let security_control = SecurityControl::from_byte(decoder.decode_u8()?);
        let fc = decoder.decode_fixed_bytes(4)?;
        let frame_counter = u32::from_be_bytes([fc[0], fc[1], fc[2], fc[3]]);
        let ciphertext = decoder.decode_fixed_bytes(length - 5)?;
        expect_end(&decoder, "Glo APDU")?;
        Ok(Self::new(tag, security_control, frame_counter, ciphertext))
    }
}

/// Cipher `apdu` under a freshly reserved frame counter
///
/// Identity when the policy does not encrypt. Every call consumes one counter
/// value, so APDUs ciphered concurrently on a shared suite get distinct IVs.
pub fn protect(suite: &SecuritySuite, apdu: &[u8]) -> DlmsResult<Vec<u8>> {
    if !suite.policy().is_encrypted() {
        return Ok(apdu.to_vec());
    }
    let plain_tag = *apdu
        .first()
        .ok_or_else(|| DlmsError::Format("Cannot cipher an empty APDU".to_string()))?;
    let tag = glo_tag_for(plain_tag).ok_or_else(|| {
        DlmsError::Security(format!("No glo-ciphered form for APDU 0x{:02X}", plain_tag))
    })?;

    let frame_counter = suite.next_frame_counter();
    let ciphertext = suite.encrypt_with(frame_counter, apdu)?;
    Ok(GloApdu::new(tag, suite.security_control(), frame_counter, ciphertext).encode())
}

/// Recover the plain APDU from a meter reply
///
/// `server_title` is the meter's system title, which keys the IV of
/// everything it sends. Under an encrypting policy only an exception response
/// may arrive in the clear.
pub fn unprotect(suite: &SecuritySuite, server_title: &SystemTitle, data: &[u8]) -> DlmsResult<Vec<u8>> {
    let tag = *data
        .first()
        .ok_or_else(|| DlmsError::Format("Empty APDU".to_string()))?;

    if !is_glo_tag(tag) {
        if suite.policy().is_encrypted() && tag != EXCEPTION_RESPONSE_TAG {
            return Err(DlmsError::Security(format!(
                "Unciphered APDU 0x{:02X} under policy {:?}",
                tag,
                suite.policy()
            )));
        }
        return Ok(data.to_vec());
    }
    if !suite.policy().is_encrypted() {
        return Err(DlmsError::Security(format!(
            "Received glo-ciphered APDU 0x{:02X} without encryption configured",
            tag
        )));
    }

    let glo = GloApdu::decode(data)?;
    if !glo.security_control().is_encrypted() {
        return Err(DlmsError::Security(format!(
            "Unsupported security control 0x{:02X}",
            glo.security_control().to_byte()
        )));
    }
    let plain = suite.decrypt_from(server_title, glo.frame_counter(), glo.ciphertext())?;
    match (plain.first(), plain_tag_for(tag)) {
        (Some(inner), Some(expected)) if *inner == expected => Ok(plain),
        (inner, _) => Err(DlmsError::Protocol(format!(
            "Glo APDU 0x{:02X} carries unexpected content {:02X?}",
            tag, inner
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlms_security::SecurityPolicy;

    const AK: [u8; 16] = [0xD0; 16];
    const EK: [u8; 16] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F];
    const CLIENT_TITLE: [u8; 8] = *b"HES00001";
    const METER_TITLE: [u8; 8] = *b"MTR00042";

    fn suite(title: [u8; 8]) -> SecuritySuite {
        SecuritySuite::high_level_security(&AK, &EK, &title).unwrap()
    }

    #[test]
    fn test_tag_mapping() {
        assert_eq!(glo_tag_for(0xC0), Some(0xC8));
        assert_eq!(glo_tag_for(0x01), Some(0x21));
        assert_eq!(glo_tag_for(0xD8), None);
        assert_eq!(plain_tag_for(0xCC), Some(0xC4));
        assert!(is_glo_tag(0x28));
        assert!(!is_glo_tag(0x08));
    }

    #[test]
    fn test_glo_apdu_layout() {
        let glo = GloApdu::new(0xC8, SecurityControl::from_byte(0x30), 0x0102_0304, vec![0xAA; 3]);
        let encoded = glo.encode();
        assert_eq!(encoded, vec![0xC8, 0x08, 0x30, 0x01, 0x02, 0x03, 0x04, 0xAA, 0xAA, 0xAA]);
        assert_eq!(GloApdu::decode(&encoded).unwrap(), glo);
        assert!(GloApdu::decode(&encoded[..9]).is_err());
        assert!(GloApdu::decode(&[0xC0, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_protect_is_identity_without_encryption() {
        let request = [0xC0, 0x01, 0xC1];
        assert_eq!(protect(&SecuritySuite::no_security(), &request).unwrap(), request.to_vec());
        let lls = SecuritySuite::low_level_security(b"12345678");
        assert_eq!(lls.policy(), SecurityPolicy::Authentication);
        assert_eq!(protect(&lls, &request).unwrap(), request.to_vec());
        assert_eq!(
            unprotect(&lls, &SystemTitle::new(METER_TITLE), &request).unwrap(),
            request.to_vec()
        );
    }

    #[test]
    fn test_protect_then_unprotect_by_peer() {
        let client = suite(CLIENT_TITLE);
        let request = [0xC0, 0x01, 0xC1, 0x00, 0x03, 0x01, 0x00, 0x01, 0x07, 0x00, 0xFF, 0x02, 0x00];
        let protected = protect(&client, &request).unwrap();
        assert_eq!(protected[0], 0xC8);
        assert_eq!(protected[2], client.security_control().to_byte());
        assert_ne!(&protected[7..7 + request.len()], &request[..]);

        // the meter decrypts with our title
        let meter = suite(METER_TITLE);
        let plain = unprotect(&meter, &client.system_title(), &protected).unwrap();
        assert_eq!(plain, request.to_vec());
    }

    #[test]
    fn test_protect_reserves_frame_counter() {
        let client = suite(CLIENT_TITLE);
        let request = [0xC0, 0x01, 0xC1, 0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0xFF, 0x02, 0x00];
        let first = GloApdu::decode(&protect(&client, &request).unwrap()).unwrap();
        let second = GloApdu::decode(&protect(&client, &request).unwrap()).unwrap();
        assert_eq!(first.frame_counter(), 0);
        assert_eq!(second.frame_counter(), 1);
        assert_ne!(first.ciphertext(), second.ciphertext());
        assert_eq!(client.frame_counter(), 2);
    }

    #[test]
    fn test_unprotect_rejects_wrong_title() {
        let client = suite(CLIENT_TITLE);
        let protected = protect(&client, &[0xC4, 0x01, 0xC1, 0x00, 0x11, 0x05]).unwrap();
        let err = unprotect(&client, &SystemTitle::new(METER_TITLE), &protected).unwrap_err();
        assert!(matches!(err, DlmsError::Security(_)));
    }

    #[test]
    fn test_unprotect_plain_reply_under_encryption() {
        let client = suite(CLIENT_TITLE);
        let title = SystemTitle::new(METER_TITLE);
        assert_eq!(unprotect(&client, &title, &[0xD8, 0x01, 0x02]).unwrap(), vec![0xD8, 0x01, 0x02]);
        assert!(matches!(
            unprotect(&client, &title, &[0xC4, 0x01, 0xC1, 0x00, 0x11, 0x05]),
            Err(DlmsError::Security(_))
        ));
        assert!(unprotect(&client, &title, &[]).is_err());
    }

    #[test]
    fn test_unprotect_glo_without_keys() {
        let err = unprotect(
            &SecuritySuite::no_security(),
            &SystemTitle::new(METER_TITLE),
            &[0xCC, 0x05, 0x30, 0x00, 0x00, 0x00, 0x01],
        )
        .unwrap_err();
        assert!(matches!(err, DlmsError::Security(_)));
    }
}
