//! BER tag types

use dlms_core::{DlmsError, DlmsResult};

/// Tag class, bits 8-7 of the identifier octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BerTagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl BerTagClass {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            BerTagClass::Universal => 0,
            BerTagClass::Application => 1,
            BerTagClass::ContextSpecific => 2,
            BerTagClass::Private => 3,
        }
    }
}

/// Single-octet BER identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerTag {
    class: BerTagClass,
    constructed: bool,
    number: u8,
}

impl BerTag {
    pub const INTEGER: BerTag = BerTag::universal(false, 2);
    pub const BIT_STRING: BerTag = BerTag::universal(false, 3);
    pub const OCTET_STRING: BerTag = BerTag::universal(false, 4);
    pub const OBJECT_IDENTIFIER: BerTag = BerTag::universal(false, 6);

    pub const fn new(class: BerTagClass, constructed: bool, number: u8) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    pub const fn universal(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    pub const fn application(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    pub const fn context_specific(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    pub fn class(&self) -> BerTagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Identifier octet
    pub fn encode(&self) -> DlmsResult<u8> {
        if self.number > 30 {
            return Err(DlmsError::Format(format!(
                "Extended BER tag numbers are not supported: {}",
                self.number
            )));
        }
        let constructed = if self.constructed { 0x20 } else { 0x00 };
        Ok((self.class.to_bits() << 6) | constructed | self.number)
    }

    pub fn decode(byte: u8) -> DlmsResult<Self> {
        let number = byte & 0x1F;
        if number == 0x1F {
            return Err(DlmsError::Format(format!(
                "Extended BER tag 0x{:02X} is not supported",
                byte
            )));
        }
        Ok(Self {
            class: BerTagClass::from_bits(byte >> 6),
            constructed: byte & 0x20 != 0,
            number,
        })
    }
}
