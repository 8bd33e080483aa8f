//! COSEM object descriptors and the catalog of objects the head-end addresses

use crate::error::{DlmsError, DlmsResult};
use crate::obis_code::ObisCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute access rights as advertised by the association object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    NoAccess,
    ReadOnly,
    WriteOnly,
    ReadWrite,
    AuthenticatedReadOnly,
    AuthenticatedWriteOnly,
    AuthenticatedReadWrite,
}

impl AccessLevel {
    pub fn code(self) -> u8 {
        match self {
            AccessLevel::NoAccess => 0,
            AccessLevel::ReadOnly => 1,
            AccessLevel::WriteOnly => 2,
            AccessLevel::ReadWrite => 3,
            AccessLevel::AuthenticatedReadOnly => 4,
            AccessLevel::AuthenticatedWriteOnly => 5,
            AccessLevel::AuthenticatedReadWrite => 6,
        }
    }

    pub fn from_code(code: u8) -> DlmsResult<Self> {
        match code {
            0 => Ok(AccessLevel::NoAccess),
            1 => Ok(AccessLevel::ReadOnly),
            2 => Ok(AccessLevel::WriteOnly),
            3 => Ok(AccessLevel::ReadWrite),
            4 => Ok(AccessLevel::AuthenticatedReadOnly),
            5 => Ok(AccessLevel::AuthenticatedWriteOnly),
            6 => Ok(AccessLevel::AuthenticatedReadWrite),
            _ => Err(DlmsError::Range(format!("Unknown access level: {}", code))),
        }
    }

    pub fn can_read(self) -> bool {
        matches!(
            self,
            AccessLevel::ReadOnly
                | AccessLevel::ReadWrite
                | AccessLevel::AuthenticatedReadOnly
                | AccessLevel::AuthenticatedReadWrite
        )
    }

    pub fn can_write(self) -> bool {
        matches!(
            self,
            AccessLevel::WriteOnly
                | AccessLevel::ReadWrite
                | AccessLevel::AuthenticatedWriteOnly
                | AccessLevel::AuthenticatedReadWrite
        )
    }

    pub fn requires_authentication(self) -> bool {
        self.code() >= 4
    }
}

/// Reference to one attribute of one COSEM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CosemObject {
    class_id: u16,
    obis_code: ObisCode,
    attribute_id: i8,
    data_index: u16,
    access_level: AccessLevel,
}

impl CosemObject {
    pub const CLOCK: CosemObject =
        CosemObject::new(8, ObisCode::new(0, 0, 1, 0, 0, 255), 2, 0, AccessLevel::ReadWrite);
    pub const ASSOCIATION_LN: CosemObject =
        CosemObject::new(15, ObisCode::new(0, 0, 40, 0, 0, 255), 2, 0, AccessLevel::ReadOnly);
    pub const ACTIVE_POWER_IMPORT: CosemObject =
        CosemObject::new(3, ObisCode::new(1, 0, 1, 7, 0, 255), 2, 0, AccessLevel::ReadOnly);
    pub const VOLTAGE_L1: CosemObject =
        CosemObject::new(3, ObisCode::new(1, 0, 32, 7, 0, 255), 2, 0, AccessLevel::ReadOnly);
    pub const CURRENT_L1: CosemObject =
        CosemObject::new(3, ObisCode::new(1, 0, 31, 7, 0, 255), 2, 0, AccessLevel::ReadOnly);
    pub const RELAY_CONTROL: CosemObject =
        CosemObject::new(70, ObisCode::new(0, 0, 96, 3, 10, 255), 3, 0, AccessLevel::ReadWrite);

    /// Every catalog entry paired with its lookup name
    pub const CATALOG: [(&'static str, CosemObject); 6] = [
        ("CLOCK", Self::CLOCK),
        ("ASSOCIATION_LN", Self::ASSOCIATION_LN),
        ("ACTIVE_POWER_IMPORT", Self::ACTIVE_POWER_IMPORT),
        ("VOLTAGE_L1", Self::VOLTAGE_L1),
        ("CURRENT_L1", Self::CURRENT_L1),
        ("RELAY_CONTROL", Self::RELAY_CONTROL),
    ];

    pub const fn new(
        class_id: u16,
        obis_code: ObisCode,
        attribute_id: i8,
        data_index: u16,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            class_id,
            obis_code,
            attribute_id,
            data_index,
            access_level,
        }
    }

    /// Case-insensitive catalog lookup
    pub fn by_name(name: &str) -> DlmsResult<Self> {
        Self::CATALOG
            .iter()
            .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
            .map(|(_, object)| *object)
            .ok_or_else(|| DlmsError::Format(format!("Unknown COSEM object: {}", name)))
    }

    pub fn class_id(&self) -> u16 {
        self.class_id
    }

    pub fn obis_code(&self) -> ObisCode {
        self.obis_code
    }

    pub fn attribute_id(&self) -> i8 {
        self.attribute_id
    }

    pub fn data_index(&self) -> u16 {
        self.data_index
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }
}

impl fmt::Display for CosemObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.class_id, self.obis_code, self.attribute_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup_ignores_case() {
        let obj = CosemObject::by_name("active_power_import").unwrap();
        assert_eq!(obj, CosemObject::ACTIVE_POWER_IMPORT);
        assert_eq!(obj.class_id(), 3);
        assert_eq!(obj.obis_code().to_string(), "1.0.1.7.0.255");
        assert_eq!(obj.attribute_id(), 2);
        assert_eq!(obj.data_index(), 0);
        assert!(CosemObject::by_name("no_such_object").is_err());
    }

    #[test]
    fn test_catalog_entries() {
        assert_eq!(CosemObject::RELAY_CONTROL.class_id(), 70);
        assert_eq!(CosemObject::RELAY_CONTROL.attribute_id(), 3);
        assert_eq!(CosemObject::CLOCK.obis_code(), ObisCode::new(0, 0, 1, 0, 0, 255));
        for (name, obj) in CosemObject::CATALOG {
            assert_eq!(CosemObject::by_name(name).unwrap(), obj);
        }
    }

    #[test]
    fn test_access_level_codes() {
        for code in 0..=6 {
            assert_eq!(AccessLevel::from_code(code).unwrap().code(), code);
        }
        assert!(AccessLevel::from_code(7).is_err());
        assert!(AccessLevel::ReadOnly.can_read());
        assert!(!AccessLevel::ReadOnly.can_write());
        assert!(AccessLevel::AuthenticatedReadWrite.can_write());
        assert!(AccessLevel::AuthenticatedWriteOnly.requires_authentication());
        assert!(!AccessLevel::NoAccess.can_read());
    }
}
