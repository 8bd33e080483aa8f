//! BER decoder for ASN.1 structures

use crate::axdr::LengthEncoding;
use crate::ber::types::BerTag;
use dlms_core::{DlmsError, DlmsResult};

/// Sequential TLV reader over a BER buffer
pub struct BerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BerDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Decode the next TLV, returning its tag and value octets
    pub fn decode_tlv(&mut self) -> DlmsResult<(BerTag, &'a [u8])> {
        let buffer: &'a [u8] = self.buffer;
        let rest = &buffer[self.position..];
        let (&tag_byte, after_tag) = rest
            .split_first()
            .ok_or_else(|| DlmsError::Format("Unexpected end of BER data".to_string()))?;
        let tag = BerTag::decode(tag_byte)?;
        let (length, consumed) = LengthEncoding::decode(after_tag)?;
        let start = 1 + consumed;
        let end = start + length.value();
        if end > rest.len() {
            return Err(DlmsError::Format(format!(
                "BER value of {} bytes overruns buffer ({} left)",
                length.value(),
                rest.len() - start
            )));
        }
        self.position += end;
        Ok((tag, &rest[start..end]))
    }

    /// Decode a TLV and require the given tag
    pub fn expect(&mut self, expected: BerTag) -> DlmsResult<&'a [u8]> {
        let (tag, value) = self.decode_tlv()?;
        if tag != expected {
            return Err(DlmsError::Format(format!(
                "Unexpected BER tag {:?}, expected {:?}",
                tag, expected
            )));
        }
        Ok(value)
    }

    /// Decode a non-negative INTEGER that fits in a `u32`
    pub fn decode_unsigned_integer(&mut self) -> DlmsResult<u32> {
        let value = self.expect(BerTag::INTEGER)?;
        if value.is_empty() || value.len() > 5 || value[0] & 0x80 != 0 {
            return Err(DlmsError::Format(format!("Unsupported BER INTEGER: {:02X?}", value)));
        }
        let wide = value.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        u32::try_from(wide).map_err(|_| DlmsError::Format(format!("BER INTEGER too large: {}", wide)))
    }

    pub fn decode_octet_string(&mut self) -> DlmsResult<Vec<u8>> {
        Ok(self.expect(BerTag::OCTET_STRING)?.to_vec())
    }

    pub fn decode_object_identifier(&mut self) -> DlmsResult<Vec<u8>> {
        Ok(self.expect(BerTag::OBJECT_IDENTIFIER)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tlv_sequence() {
        let data = [0xA2, 0x03, 0x02, 0x01, 0x00, 0x04, 0x02, 0xAA, 0xBB];
        let mut decoder = BerDecoder::new(&data);
        let (tag, value) = decoder.decode_tlv().unwrap();
        assert_eq!(tag, BerTag::context_specific(true, 2));
        assert_eq!(BerDecoder::new(value).decode_unsigned_integer().unwrap(), 0);
        assert_eq!(decoder.decode_octet_string().unwrap(), vec![0xAA, 0xBB]);
        assert!(!decoder.has_remaining());
    }

    #[test]
    fn test_decode_overrun() {
        let mut decoder = BerDecoder::new(&[0x04, 0x05, 0x01]);
        assert!(decoder.decode_tlv().is_err());
    }

    #[test]
    fn test_decode_unexpected_tag() {
        let mut decoder = BerDecoder::new(&[0x04, 0x00]);
        assert!(decoder.decode_unsigned_integer().is_err());
    }
}
