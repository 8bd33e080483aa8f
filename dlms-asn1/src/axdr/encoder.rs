//! A-XDR encoder for DLMS/COSEM

use crate::axdr::types::{AxdrTag, LengthEncoding};
use chrono::{Datelike, NaiveDateTime, Timelike};
use dlms_core::{DataObject, DlmsError, DlmsResult};

/// Deviation value meaning "not specified"
pub(crate) const DEVIATION_NOT_SPECIFIED: i16 = i16::MIN;

/// A-XDR encoder for encoding DLMS/COSEM data types
///
/// Integers are written with the narrowest A-XDR width able to hold them,
/// so `Integer(4500)` goes out as `long` (0x10) and `Unsigned(300)` as
/// `long-unsigned` (0x12).
#[derive(Debug, Default)]
pub struct AxdrEncoder {
    buffer: Vec<u8>,
}

impl AxdrEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a DataObject
    pub fn encode_data_object(&mut self, obj: &DataObject) -> DlmsResult<()> {
        match obj {
            DataObject::Null => self.encode_tag(AxdrTag::Null),
            DataObject::Boolean(b) => {
                self.encode_tag(AxdrTag::Boolean);
                self.encode_u8(u8::from(*b));
            }
            DataObject::Integer(i) => self.encode_integer(*i),
            DataObject::Unsigned(u) => self.encode_unsigned(*u),
            DataObject::Float32(f) => {
                self.encode_tag(AxdrTag::Float32);
                self.encode_bytes(&f.to_be_bytes());
            }
            DataObject::Float64(f) => {
                self.encode_tag(AxdrTag::Float64);
                self.encode_bytes(&f.to_be_bytes());
            }
            DataObject::OctetString(s) => {
                self.encode_tag(AxdrTag::OctetString);
                self.encode_octet_string(s);
            }
            DataObject::String(s) => {
                let tag = if s.is_ascii() {
                    AxdrTag::VisibleString
                } else {
                    AxdrTag::Utf8String
                };
                self.encode_tag(tag);
                self.encode_octet_string(s.as_bytes());
            }
            DataObject::BitString(bits) => {
                self.encode_tag(AxdrTag::BitString);
                self.encode_length(bits.len() * 8);
                self.encode_bytes(bits);
            }
            DataObject::DateTime(dt) => {
                self.encode_tag(AxdrTag::DateTime);
                self.encode_date_time(dt)?;
            }
            DataObject::Array(elements) => {
                self.encode_tag(AxdrTag::Array);
                self.encode_sequence(elements)?;
            }
            DataObject::Structure(elements) => {
                self.encode_tag(AxdrTag::Structure);
                self.encode_sequence(elements)?;
            }
        }
        Ok(())
    }

    fn encode_integer(&mut self, value: i64) {
        if let Ok(v) = i8::try_from(value) {
            self.encode_tag(AxdrTag::Integer8);
            self.encode_bytes(&v.to_be_bytes());
        } else if let Ok(v) = i16::try_from(value) {
            self.encode_tag(AxdrTag::Integer16);
            self.encode_bytes(&v.to_be_bytes());
        } else if let Ok(v) = i32::try_from(value) {
            self.encode_tag(AxdrTag::Integer32);
            self.encode_bytes(&v.to_be_bytes());
        } else {
            self.encode_tag(AxdrTag::Integer64);
            self.encode_bytes(&value.to_be_bytes());
        }
    }

    fn encode_unsigned(&mut self, value: u64) {
        if let Ok(v) = u8::try_from(value) {
            self.encode_tag(AxdrTag::Unsigned8);
            self.encode_u8(v);
        } else if let Ok(v) = u16::try_from(value) {
            self.encode_tag(AxdrTag::Unsigned16);
            self.encode_bytes(&v.to_be_bytes());
        } else if let Ok(v) = u32::try_from(value) {
            self.encode_tag(AxdrTag::Unsigned32);
            self.encode_bytes(&v.to_be_bytes());
        } else {
            self.encode_tag(AxdrTag::Unsigned64);
            self.encode_bytes(&value.to_be_bytes());
        }
    }

    /// Encode the 12-byte COSEM date-time: year, month, day, weekday, hour,
    /// minute, second, hundredths, deviation (unspecified) and clock status
    fn encode_date_time(&mut self, dt: &NaiveDateTime) -> DlmsResult<()> {
        let year = u16::try_from(dt.year())
            .map_err(|_| DlmsError::Range(format!("Year not representable: {}", dt.year())))?;
        self.encode_bytes(&year.to_be_bytes());
        self.encode_u8(dt.month() as u8);
        self.encode_u8(dt.day() as u8);
        self.encode_u8(dt.weekday().number_from_monday() as u8);
        self.encode_u8(dt.hour() as u8);
        self.encode_u8(dt.minute() as u8);
        self.encode_u8(dt.second() as u8);
        self.encode_u8((dt.nanosecond() / 10_000_000).min(99) as u8);
        self.encode_bytes(&DEVIATION_NOT_SPECIFIED.to_be_bytes());
        self.encode_u8(0x00);
        Ok(())
    }

    fn encode_sequence(&mut self, elements: &[DataObject]) -> DlmsResult<()> {
        self.encode_length(elements.len());
        for element in elements {
            self.encode_data_object(element)?;
        }
        Ok(())
    }

    /// Encode a tag
    pub fn encode_tag(&mut self, tag: AxdrTag) {
        self.buffer.push(tag.to_u8());
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn encode_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn encode_length(&mut self, len: usize) {
        self.buffer.extend_from_slice(&LengthEncoding::of(len).encode());
    }

    /// Encode a length-prefixed octet string
    pub fn encode_octet_string(&mut self, value: &[u8]) {
        self.encode_length(value.len());
        self.encode_bytes(value);
    }

    /// Append raw bytes
    pub fn encode_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Get encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Encode a single DataObject into a fresh buffer
pub fn encode_data(obj: &DataObject) -> DlmsResult<Vec<u8>> {
    let mut encoder = AxdrEncoder::new();
    encoder.encode_data_object(obj)?;
    Ok(encoder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_encode_null() {
        assert_eq!(encode_data(&DataObject::Null).unwrap(), vec![0x00]);
    }

    #[test]
    fn test_encode_boolean() {
        assert_eq!(encode_data(&DataObject::Boolean(true)).unwrap(), vec![0x03, 0x01]);
    }

    #[test]
    fn test_encode_integer_widths() {
        assert_eq!(encode_data(&DataObject::Integer(-1)).unwrap(), vec![0x0F, 0xFF]);
        assert_eq!(encode_data(&DataObject::Integer(4500)).unwrap(), vec![0x10, 0x11, 0x94]);
        assert_eq!(
            encode_data(&DataObject::Integer(0x1234_5678)).unwrap(),
            vec![0x05, 0x12, 0x34, 0x56, 0x78]
        );
        assert_eq!(encode_data(&DataObject::Integer(i64::MAX)).unwrap()[0], 0x14);
    }

    #[test]
    fn test_encode_unsigned_widths() {
        assert_eq!(encode_data(&DataObject::Unsigned(200)).unwrap(), vec![0x11, 0xC8]);
        assert_eq!(encode_data(&DataObject::Unsigned(300)).unwrap(), vec![0x12, 0x01, 0x2C]);
        assert_eq!(
            encode_data(&DataObject::Unsigned(70_000)).unwrap(),
            vec![0x06, 0x00, 0x01, 0x11, 0x70]
        );
        assert_eq!(encode_data(&DataObject::Unsigned(u64::MAX)).unwrap()[0], 0x15);
    }

    #[test]
    fn test_encode_strings() {
        assert_eq!(
            encode_data(&DataObject::OctetString(vec![0xAB, 0xCD])).unwrap(),
            vec![0x09, 0x02, 0xAB, 0xCD]
        );
        assert_eq!(
            encode_data(&DataObject::String("OK".into())).unwrap(),
            vec![0x0A, 0x02, b'O', b'K']
        );
        assert_eq!(encode_data(&DataObject::String("é".into())).unwrap()[0], 0x0C);
        assert_eq!(
            encode_data(&DataObject::BitString(vec![0xA0])).unwrap(),
            vec![0x04, 0x08, 0xA0]
        );
    }

    #[test]
    fn test_encode_structure() {
        let obj = DataObject::Structure(vec![DataObject::Boolean(false), DataObject::Unsigned(1)]);
        assert_eq!(encode_data(&obj).unwrap(), vec![0x02, 0x02, 0x03, 0x00, 0x11, 0x01]);
    }

    #[test]
    fn test_encode_date_time() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 15, 250)
            .unwrap();
        assert_eq!(
            encode_data(&DataObject::DateTime(dt)).unwrap(),
            vec![0x19, 0x07, 0xE8, 0x03, 0x01, 0x05, 0x0C, 0x1E, 0x0F, 0x19, 0x80, 0x00, 0x00]
        );
    }
}
