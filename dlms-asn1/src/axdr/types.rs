//! A-XDR types for DLMS/COSEM

use dlms_core::{DlmsError, DlmsResult};

/// A-XDR tag values for different data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxdrTag {
    Null = 0x00,
    Boolean = 0x03,
    Integer8 = 0x0F,
    Integer16 = 0x10,
    Integer32 = 0x05,
    Integer64 = 0x14,
    Unsigned8 = 0x11,
    Unsigned16 = 0x12,
    Unsigned32 = 0x06,
    Unsigned64 = 0x15,
    Float32 = 0x17,
    Float64 = 0x18,
    OctetString = 0x09,
    VisibleString = 0x0A,
    Utf8String = 0x0C,
    Bcd = 0x0D,
    BitString = 0x04,
    Date = 0x1A,
    Time = 0x1B,
    DateTime = 0x19,
    Array = 0x01,
    Structure = 0x02,
    CompactArray = 0x13,
    Enumerate = 0x16,
    DontCare = 0xFF,
}

impl AxdrTag {
    const ALL: [AxdrTag; 25] = [
        AxdrTag::Null,
        AxdrTag::Boolean,
        AxdrTag::Integer8,
        AxdrTag::Integer16,
        AxdrTag::Integer32,
        AxdrTag::Integer64,
        AxdrTag::Unsigned8,
        AxdrTag::Unsigned16,
        AxdrTag::Unsigned32,
        AxdrTag::Unsigned64,
        AxdrTag::Float32,
        AxdrTag::Float64,
        AxdrTag::OctetString,
        AxdrTag::VisibleString,
        AxdrTag::Utf8String,
        AxdrTag::Bcd,
        AxdrTag::BitString,
        AxdrTag::Date,
        AxdrTag::Time,
        AxdrTag::DateTime,
        AxdrTag::Array,
        AxdrTag::Structure,
        AxdrTag::CompactArray,
        AxdrTag::Enumerate,
        AxdrTag::DontCare,
    ];

    /// Tag for a wire byte; unknown bytes are a format error
    pub fn from_u8(value: u8) -> DlmsResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_u8() == value)
            .ok_or_else(|| DlmsError::Format(format!("Unknown A-XDR tag: 0x{:02X}", value)))
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Length encoding for variable-length types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoding {
    /// Short form: length < 128, encoded in 1 byte
    Short(u8),
    /// Long form: length >= 128, encoded with length-of-length byte + length bytes
    Long(usize),
}

impl LengthEncoding {
    /// Pick the shortest form able to carry `len`
    pub fn of(len: usize) -> Self {
        if len < 0x80 {
            LengthEncoding::Short(len as u8)
        } else {
            LengthEncoding::Long(len)
        }
    }

    pub fn value(&self) -> usize {
        match self {
            LengthEncoding::Short(len) => *len as usize,
            LengthEncoding::Long(len) => *len,
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            LengthEncoding::Short(len) => vec![*len],
            LengthEncoding::Long(len) => {
                let mut bytes: Vec<u8> = len
                    .to_be_bytes()
                    .into_iter()
                    .skip_while(|&b| b == 0)
                    .collect();
                if bytes.is_empty() {
                    bytes.push(0);
                }
                let mut result = Vec::with_capacity(bytes.len() + 1);
                result.push(0x80 | bytes.len() as u8);
                result.extend_from_slice(&bytes);
                result
            }
        }
    }

    /// Decode length from bytes, returning the length and the bytes consumed
    pub fn decode(bytes: &[u8]) -> DlmsResult<(Self, usize)> {
        let first_byte = *bytes
            .first()
            .ok_or_else(|| DlmsError::Format("Not enough bytes for length".to_string()))?;
        if (first_byte & 0x80) == 0 {
            return Ok((LengthEncoding::Short(first_byte), 1));
        }

        let length_of_length = (first_byte & 0x7F) as usize;
        if length_of_length == 0 || length_of_length > 4 {
            return Err(DlmsError::Format(format!(
                "Invalid length-of-length: {}",
                length_of_length
            )));
        }
        if bytes.len() < 1 + length_of_length {
            return Err(DlmsError::Format("Not enough bytes for long length".to_string()));
        }

        let len = bytes[1..1 + length_of_length]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        Ok((LengthEncoding::Long(len), 1 + length_of_length))
    }
}
