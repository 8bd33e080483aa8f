use crate::error::{DlmsError, DlmsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OBIS (Object Identification System) code for identifying COSEM objects
///
/// OBIS codes are 6-byte identifiers used in DLMS/COSEM to uniquely identify
/// objects in a logical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObisCode {
    bytes: [u8; 6],
}

impl ObisCode {
    /// Create a new OBIS code from individual bytes
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    /// Create an OBIS code from wide integer components
    ///
    /// Fails with [`DlmsError::Range`] if any component lies outside `0..=255`.
    pub fn of(a: i64, b: i64, c: i64, d: i64, e: i64, f: i64) -> DlmsResult<Self> {
        let mut bytes = [0u8; 6];
        for (i, value) in [a, b, c, d, e, f].into_iter().enumerate() {
            bytes[i] = u8::try_from(value).map_err(|_| {
                DlmsError::Range(format!("OBIS component {} out of range: {}", i, value))
            })?;
        }
        Ok(Self { bytes })
    }

    /// Parse an OBIS code from its dotted-decimal form, e.g. `"1.0.1.7.0.255"`
    pub fn parse(s: &str) -> DlmsResult<Self> {
        if s.is_empty() {
            return Err(DlmsError::Format("Empty OBIS code".to_string()));
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 {
            return Err(DlmsError::Format(format!(
                "Expected 6 dot-separated values, got {} in {:?}",
                parts.len(),
                s
            )));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DlmsError::Format(format!("Invalid OBIS component: {:?}", part)));
            }
            bytes[i] = part
                .parse::<u8>()
                .map_err(|_| DlmsError::Format(format!("OBIS component exceeds 255: {}", part)))?;
        }

        Ok(Self { bytes })
    }

    /// Decode the 6 raw bytes used inside attribute descriptors
    pub fn from_slice(data: &[u8]) -> DlmsResult<Self> {
        let bytes: [u8; 6] = data
            .try_into()
            .map_err(|_| DlmsError::Format(format!("OBIS code needs 6 bytes, got {}", data.len())))?;
        Ok(Self { bytes })
    }

    /// Get the OBIS code as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    pub fn a(&self) -> u8 {
        self.bytes[0]
    }

    pub fn b(&self) -> u8 {
        self.bytes[1]
    }

    pub fn c(&self) -> u8 {
        self.bytes[2]
    }

    pub fn d(&self) -> u8 {
        self.bytes[3]
    }

    pub fn e(&self) -> u8 {
        self.bytes[4]
    }

    pub fn f(&self) -> u8 {
        self.bytes[5]
    }
}

impl FromStr for ObisCode {
    type Err = DlmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2],
            self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obis_code_new() {
        let code = ObisCode::new(1, 0, 1, 7, 0, 255);
        assert_eq!(code.a(), 1);
        assert_eq!(code.c(), 1);
        assert_eq!(code.f(), 255);
    }

    #[test]
    fn test_obis_code_parse() {
        let code = ObisCode::parse("1.0.1.7.0.255").unwrap();
        assert_eq!(code, ObisCode::new(1, 0, 1, 7, 0, 255));
        let code: ObisCode = "0.0.96.3.10.255".parse().unwrap();
        assert_eq!(code.as_bytes(), &[0, 0, 96, 3, 10, 255]);
    }

    #[test]
    fn test_obis_code_display() {
        let code = ObisCode::new(1, 1, 1, 8, 0, 255);
        assert_eq!(format!("{}", code), "1.1.1.8.0.255");
    }

    #[test]
    fn test_obis_code_round_trip() {
        let samples = [0i64, 1, 7, 96, 128, 254, 255];
        for &a in &samples {
            for &c in &samples {
                for &f in &samples {
                    let code = ObisCode::of(a, 0, c, 7, 0, f).unwrap();
                    assert_eq!(ObisCode::parse(&code.to_string()).unwrap(), code);
                }
            }
        }
    }

    #[test]
    fn test_obis_code_parse_rejects_malformed() {
        for input in [
            "",
            "1.0.1.7.0",
            "1.0.1.7.0.255.1",
            "1.0.1.7.0.256",
            "1.0.-1.7.0.255",
            "1.0.x.7.0.255",
            "1.0..7.0.255",
            "1.0.+1.7.0.255",
            "1.0.1.7.0.99999999999999999999",
        ] {
            assert!(
                matches!(ObisCode::parse(input), Err(DlmsError::Format(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_obis_code_of_range() {
        assert!(matches!(ObisCode::of(1, 0, 1, 7, 0, 256), Err(DlmsError::Range(_))));
        assert!(matches!(ObisCode::of(-1, 0, 1, 7, 0, 255), Err(DlmsError::Range(_))));
    }

    #[test]
    fn test_obis_code_from_slice() {
        let code = ObisCode::from_slice(&[0, 0, 1, 0, 0, 255]).unwrap();
        assert_eq!(code.to_string(), "0.0.1.0.0.255");
        assert!(ObisCode::from_slice(&[0, 0, 1]).is_err());
    }
}
