//! Frame Check Sequence (FCS) calculation for HDLC

use dlms_core::{DlmsError, DlmsResult};

/// FCS calculation constants
const INITIAL_FCS: u16 = 0xFFFF;
pub const GOOD_FCS: u16 = 0xF0B8;
const KEY: u16 = 0x8408; // Bit-reversed 1021

/// Precomputed FCS table
static FCS_TABLE: once_cell::sync::Lazy<[u16; 256]> = once_cell::sync::Lazy::new(|| {
    let mut table = [0u16; 256];
    for (b, entry) in table.iter_mut().enumerate() {
        let mut v = b as u16;
        for _ in 0..8 {
            if (v & 1) == 1 {
                v = (v >> 1) ^ KEY;
            } else {
                v >>= 1;
            }
        }
        *entry = v;
    }
    table
});

/// Frame Check Sequence calculator
#[derive(Debug, Clone)]
pub struct FcsCalc {
    fcs_value: u16,
}

impl FcsCalc {
    /// Create a new FCS calculator
    pub fn new() -> Self {
        Self {
            fcs_value: INITIAL_FCS,
        }
    }

    pub fn reset(&mut self) {
        self.fcs_value = INITIAL_FCS;
    }

    /// Update the FCS value with a single byte
    pub fn update(&mut self, data: u8) {
        self.fcs_value =
            (self.fcs_value >> 8) ^ FCS_TABLE[((self.fcs_value ^ data as u16) & 0xFF) as usize];
    }

    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Complemented FCS, low byte first as transmitted
    pub fn fcs_value_bytes(&self) -> [u8; 2] {
        (self.fcs_value ^ 0xFFFF).to_le_bytes()
    }

    /// Validate a calculator that has consumed a frame including its FCS
    pub fn validate(&self) -> DlmsResult<()> {
        if self.fcs_value != GOOD_FCS {
            Err(DlmsError::Protocol(format!(
                "FCS has wrong value: 0x{:04X}, expected 0x{:04X}",
                self.fcs_value, GOOD_FCS
            )))
        } else {
            Ok(())
        }
    }

    pub fn value(&self) -> u16 {
        self.fcs_value
    }
}

impl Default for FcsCalc {
    fn default() -> Self {
        Self::new()
    }
}

/// FCS bytes for `data`
pub fn fcs(data: &[u8]) -> [u8; 2] {
    let mut calc = FcsCalc::new();
    calc.update_bytes(data);
    calc.fcs_value_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcs_check_string() {
        // CRC-16/X-25 check value for "123456789" is 0x906E
        assert_eq!(fcs(b"123456789"), [0x6E, 0x90]);
    }

    #[test]
    fn test_fcs_table_entries() {
        assert_eq!(FCS_TABLE[0], 0x0000);
        assert_eq!(FCS_TABLE[1], 0x1189);
        assert_eq!(FCS_TABLE[255], 0x0F78);
    }

    #[test]
    fn test_fcs_residue_validates() {
        let data = [0xA0, 0x11, 0x01, 0x93];
        let mut calc = FcsCalc::new();
        calc.update_bytes(&data);
        calc.update_bytes(&fcs(&data));
        assert_eq!(calc.value(), GOOD_FCS);
        assert!(calc.validate().is_ok());

        let mut corrupted = FcsCalc::new();
        corrupted.update_bytes(&[0xA0, 0x11, 0x01, 0x73]);
        corrupted.update_bytes(&fcs(&data));
        assert!(matches!(corrupted.validate(), Err(DlmsError::Protocol(_))));
    }

    #[test]
    fn test_fcs_reset() {
        let mut calc = FcsCalc::new();
        calc.update(0x01);
        calc.reset();
        assert_eq!(calc.value(), INITIAL_FCS);
    }
}
