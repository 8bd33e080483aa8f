//! BER encoder for ASN.1 structures

use crate::axdr::LengthEncoding;
use crate::ber::types::BerTag;
use dlms_core::DlmsResult;

/// BER encoder accumulating TLV triplets into a buffer
#[derive(Debug, Default)]
pub struct BerEncoder {
    buffer: Vec<u8>,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// BER definite lengths share the short/long form used by A-XDR.
    pub fn encode_tlv(&mut self, tag: BerTag, value: &[u8]) -> DlmsResult<()> {
        self.buffer.push(tag.encode()?);
        self.buffer
            .extend_from_slice(&LengthEncoding::of(value.len()).encode());
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Encode a non-negative INTEGER small enough for one octet
    pub fn encode_small_integer(&mut self, value: u8) -> DlmsResult<()> {
        if value & 0x80 != 0 {
            self.encode_tlv(BerTag::INTEGER, &[0x00, value])
        } else {
            self.encode_tlv(BerTag::INTEGER, &[value])
        }
    }

    pub fn encode_octet_string(&mut self, value: &[u8]) -> DlmsResult<()> {
        self.encode_tlv(BerTag::OCTET_STRING, value)
    }

    /// Encode an OBJECT IDENTIFIER from its already-encoded content octets
    pub fn encode_object_identifier(&mut self, content: &[u8]) -> DlmsResult<()> {
        self.encode_tlv(BerTag::OBJECT_IDENTIFIER, content)
    }

    /// Wrap already-encoded content in a context-specific tag
    pub fn encode_context_specific(
        &mut self,
        tag_number: u8,
        value: &[u8],
        constructed: bool,
    ) -> DlmsResult<()> {
        self.encode_tlv(BerTag::context_specific(constructed, tag_number), value)
    }

    /// Wrap already-encoded content in an application tag
    pub fn encode_application(
        &mut self,
        tag_number: u8,
        value: &[u8],
        constructed: bool,
    ) -> DlmsResult<()> {
        self.encode_tlv(BerTag::application(constructed, tag_number), value)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}
