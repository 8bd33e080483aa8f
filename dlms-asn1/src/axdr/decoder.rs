//! A-XDR decoder for DLMS/COSEM

use crate::axdr::types::{AxdrTag, LengthEncoding};
use chrono::NaiveDate;
use dlms_core::{DataObject, DlmsError, DlmsResult};

/// Nesting limit for arrays and structures
const MAX_DEPTH: usize = 16;

/// A-XDR decoder for decoding DLMS/COSEM data types
///
/// Every signed wire width decodes to [`DataObject::Integer`], every
/// unsigned width (including `enum` and `bcd`) to [`DataObject::Unsigned`].
pub struct AxdrDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> AxdrDecoder<'a> {
    /// Create a new decoder
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Decode a DataObject
    pub fn decode_data_object(&mut self) -> DlmsResult<DataObject> {
        self.decode_nested(0)
    }

    fn decode_nested(&mut self, depth: usize) -> DlmsResult<DataObject> {
        if depth > MAX_DEPTH {
            return Err(DlmsError::Format("A-XDR data nested too deeply".to_string()));
        }

        let tag = self.decode_tag()?;
        let value = match tag {
            AxdrTag::Null | AxdrTag::DontCare => DataObject::Null,
            AxdrTag::Boolean => DataObject::Boolean(self.decode_u8()? != 0),
            AxdrTag::Integer8 => DataObject::Integer(i8::from_be_bytes(self.read_array()?) as i64),
            AxdrTag::Integer16 => DataObject::Integer(i16::from_be_bytes(self.read_array()?) as i64),
            AxdrTag::Integer32 => DataObject::Integer(i32::from_be_bytes(self.read_array()?) as i64),
            AxdrTag::Integer64 => DataObject::Integer(i64::from_be_bytes(self.read_array()?)),
            AxdrTag::Unsigned8 | AxdrTag::Enumerate | AxdrTag::Bcd => {
                DataObject::Unsigned(self.decode_u8()? as u64)
            }
            AxdrTag::Unsigned16 => DataObject::Unsigned(self.decode_u16()? as u64),
            AxdrTag::Unsigned32 => DataObject::Unsigned(u32::from_be_bytes(self.read_array()?) as u64),
            AxdrTag::Unsigned64 => DataObject::Unsigned(u64::from_be_bytes(self.read_array()?)),
            AxdrTag::Float32 => DataObject::Float32(f32::from_be_bytes(self.read_array()?)),
            AxdrTag::Float64 => DataObject::Float64(f64::from_be_bytes(self.read_array()?)),
            AxdrTag::OctetString => DataObject::OctetString(self.decode_octet_string()?),
            AxdrTag::VisibleString | AxdrTag::Utf8String => {
                let bytes = self.decode_octet_string()?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| DlmsError::Format(format!("Invalid string data: {}", e)))?;
                DataObject::String(text)
            }
            AxdrTag::BitString => {
                let bits = self.decode_length()?;
                DataObject::BitString(self.decode_fixed_bytes(bits.div_ceil(8))?)
            }
            AxdrTag::DateTime => DataObject::DateTime(self.decode_date_time()?),
            AxdrTag::Array | AxdrTag::Structure => {
                let count = self.decode_length()?;
                // Each element needs at least its tag byte
                if count > self.remaining() {
                    return Err(DlmsError::Format(format!(
                        "Sequence of {} elements exceeds remaining {} bytes",
                        count,
                        self.remaining()
                    )));
                }
                let mut elements = Vec::with_capacity(count);
                for _ in 0..count {
                    elements.push(self.decode_nested(depth + 1)?);
                }
                if tag == AxdrTag::Array {
                    DataObject::Array(elements)
                } else {
                    DataObject::Structure(elements)
                }
            }
            AxdrTag::Date | AxdrTag::Time | AxdrTag::CompactArray => {
                return Err(DlmsError::Format(format!("Unsupported A-XDR type: {:?}", tag)));
            }
        };
        Ok(value)
    }

    fn decode_date_time(&mut self) -> DlmsResult<chrono::NaiveDateTime> {
        let raw: [u8; 12] = self.read_array()?;
        let year = u16::from_be_bytes([raw[0], raw[1]]);
        let hundredths = if raw[8] == 0xFF { 0 } else { raw[8] as u32 };
        NaiveDate::from_ymd_opt(year as i32, raw[2] as u32, raw[3] as u32)
            .and_then(|date| {
                date.and_hms_milli_opt(raw[5] as u32, raw[6] as u32, raw[7] as u32, hundredths * 10)
            })
            .ok_or_else(|| {
                DlmsError::Format(format!("Date-time with unspecified or invalid fields: {:02X?}", raw))
            })
    }

    /// Decode a tag
    pub fn decode_tag(&mut self) -> DlmsResult<AxdrTag> {
        AxdrTag::from_u8(self.read_byte()?)
    }

    pub fn decode_u8(&mut self) -> DlmsResult<u8> {
        self.read_byte()
    }

    pub fn decode_u16(&mut self) -> DlmsResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn decode_length(&mut self) -> DlmsResult<usize> {
        let (length, consumed) = LengthEncoding::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(length.value())
    }

    /// Decode a length-prefixed octet string
    pub fn decode_octet_string(&mut self) -> DlmsResult<Vec<u8>> {
        let len = self.decode_length()?;
        self.decode_fixed_bytes(len)
    }

    /// Decode exactly `len` raw bytes
    pub fn decode_fixed_bytes(&mut self, len: usize) -> DlmsResult<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    fn read_array<const N: usize>(&mut self) -> DlmsResult<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn take(&mut self, len: usize) -> DlmsResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(DlmsError::Format(format!(
                "Unexpected end of data: need {} bytes, {} left",
                len,
                self.remaining()
            )));
        }
        let buffer: &'a [u8] = self.buffer;
        let slice = &buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_byte(&mut self) -> DlmsResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to decode
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

/// Decode exactly one DataObject from `data`, rejecting trailing bytes
pub fn decode_data(data: &[u8]) -> DlmsResult<DataObject> {
    let mut decoder = AxdrDecoder::new(data);
    let obj = decoder.decode_data_object()?;
    if decoder.remaining() != 0 {
        return Err(DlmsError::Format(format!(
            "{} trailing bytes after A-XDR data",
            decoder.remaining()
        )));
    }
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axdr::encoder::encode_data;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_null() {
        assert_eq!(decode_data(&[0x00]).unwrap(), DataObject::Null);
    }

    #[test]
    fn test_decode_boolean() {
        assert_eq!(decode_data(&[0x03, 0x01]).unwrap(), DataObject::Boolean(true));
    }

    #[test]
    fn test_decode_integer32() {
        assert_eq!(
            decode_data(&[0x05, 0x00, 0x00, 0x11, 0x94]).unwrap(),
            DataObject::Integer(4500)
        );
        assert_eq!(
            decode_data(&[0x05, 0xFF, 0xFF, 0xFF, 0xFE]).unwrap(),
            DataObject::Integer(-2)
        );
    }

    #[test]
    fn test_decode_unsigned_family() {
        assert_eq!(decode_data(&[0x12, 0x09, 0x29]).unwrap(), DataObject::Unsigned(2345));
        assert_eq!(decode_data(&[0x16, 0x01]).unwrap(), DataObject::Unsigned(1));
        assert_eq!(
            decode_data(&[0x06, 0x00, 0x01, 0x11, 0x70]).unwrap(),
            DataObject::Unsigned(70_000)
        );
    }

    #[test]
    fn test_decode_nested_structure() {
        let data = [0x02, 0x02, 0x0F, 0xFE, 0x01, 0x01, 0x09, 0x01, 0x7F];
        let obj = decode_data(&data).unwrap();
        assert_eq!(
            obj,
            DataObject::Structure(vec![
                DataObject::Integer(-2),
                DataObject::Array(vec![DataObject::OctetString(vec![0x7F])]),
            ])
        );
    }

    #[test]
    fn test_decode_encoded_values() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();
        for obj in [
            DataObject::DateTime(dt),
            DataObject::String("meter-01".into()),
            DataObject::BitString(vec![0xF0, 0x0F]),
            DataObject::Float64(-1.25),
        ] {
            assert_eq!(decode_data(&encode_data(&obj).unwrap()).unwrap(), obj);
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert!(decode_data(&[0x05, 0x00, 0x01]).is_err());
        assert!(decode_data(&[0x09, 0x05, 0x01]).is_err());
        assert!(decode_data(&[0x01, 0x7F]).is_err());
        assert!(decode_data(&[0x11, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_decode_unspecified_date_time() {
        let mut data = vec![0x19, 0xFF, 0xFF];
        data.extend_from_slice(&[0xFF; 10]);
        assert!(matches!(decode_data(&data), Err(DlmsError::Format(_))));
    }
}
