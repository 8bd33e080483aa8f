//! Data object types for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container holding a value sent to or received from a meter
///
/// Exactly one variant is active. The `as_*` accessors return a
/// [`DlmsError::Type`] when asked for any other variant, and the byte-bearing
/// accessors hand out owned copies so callers never alias stored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataObject {
    /// Null data
    Null,
    /// Boolean value
    Boolean(bool),
    /// Signed integer of any wire width
    Integer(i64),
    /// Unsigned integer of any wire width
    Unsigned(u64),
    /// Float 32-bit
    Float32(f32),
    /// Float 64-bit
    Float64(f64),
    /// Octet string
    OctetString(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Visible or UTF-8 string
    String(String),
    /// Bit string, packed most significant bit first
    BitString(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Date and time
    DateTime(NaiveDateTime),
    /// Array of DataObjects
    Array(Vec<DataObject>),
    /// Structure (ordered list of DataObjects)
    Structure(Vec<DataObject>),
}

/// Type enumeration for DataObject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataObjectType {
    Null,
    Boolean,
    Integer,
    Unsigned,
    Float32,
    Float64,
    OctetString,
    String,
    BitString,
    DateTime,
    Array,
    Structure,
}

impl fmt::Display for DataObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl DataObject {
    /// Get the type of this data object
    pub fn data_type(&self) -> DataObjectType {
        match self {
            DataObject::Null => DataObjectType::Null,
            DataObject::Boolean(_) => DataObjectType::Boolean,
            DataObject::Integer(_) => DataObjectType::Integer,
            DataObject::Unsigned(_) => DataObjectType::Unsigned,
            DataObject::Float32(_) => DataObjectType::Float32,
            DataObject::Float64(_) => DataObjectType::Float64,
            DataObject::OctetString(_) => DataObjectType::OctetString,
            DataObject::String(_) => DataObjectType::String,
            DataObject::BitString(_) => DataObjectType::BitString,
            DataObject::DateTime(_) => DataObjectType::DateTime,
            DataObject::Array(_) => DataObjectType::Array,
            DataObject::Structure(_) => DataObjectType::Structure,
        }
    }

    fn type_error(&self, expected: DataObjectType) -> DlmsError {
        DlmsError::Type(format!("Cannot convert {} to {}", self.data_type(), expected))
    }

    pub fn new_null() -> Self {
        DataObject::Null
    }

    pub fn new_boolean(value: bool) -> Self {
        DataObject::Boolean(value)
    }

    pub fn new_integer(value: i64) -> Self {
        DataObject::Integer(value)
    }

    /// Create an unsigned value, rejecting negative input with [`DlmsError::Range`]
    pub fn new_unsigned(value: i64) -> DlmsResult<Self> {
        u64::try_from(value)
            .map(DataObject::Unsigned)
            .map_err(|_| DlmsError::Range(format!("Unsigned value cannot be negative: {}", value)))
    }

    pub fn new_float32(value: f32) -> Self {
        DataObject::Float32(value)
    }

    pub fn new_float64(value: f64) -> Self {
        DataObject::Float64(value)
    }

    /// Create an octet string holding a private copy of `value`
    pub fn new_octet_string(value: &[u8]) -> Self {
        DataObject::OctetString(value.to_vec())
    }

    pub fn new_string(value: impl Into<String>) -> Self {
        DataObject::String(value.into())
    }

    /// Create a bit string holding a private copy of `value`
    pub fn new_bit_string(value: &[u8]) -> Self {
        DataObject::BitString(value.to_vec())
    }

    pub fn new_date_time(value: NaiveDateTime) -> Self {
        DataObject::DateTime(value)
    }

    pub fn new_array(elements: Vec<DataObject>) -> Self {
        DataObject::Array(elements)
    }

    pub fn new_structure(elements: Vec<DataObject>) -> Self {
        DataObject::Structure(elements)
    }

    pub fn as_boolean(&self) -> DlmsResult<bool> {
        match self {
            DataObject::Boolean(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::Boolean)),
        }
    }

    pub fn as_integer(&self) -> DlmsResult<i64> {
        match self {
            DataObject::Integer(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::Integer)),
        }
    }

    pub fn as_unsigned(&self) -> DlmsResult<u64> {
        match self {
            DataObject::Unsigned(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::Unsigned)),
        }
    }

    pub fn as_float32(&self) -> DlmsResult<f32> {
        match self {
            DataObject::Float32(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::Float32)),
        }
    }

    pub fn as_float64(&self) -> DlmsResult<f64> {
        match self {
            DataObject::Float64(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::Float64)),
        }
    }

    /// Returns a copy of the stored octets
    pub fn as_octet_string(&self) -> DlmsResult<Vec<u8>> {
        match self {
            DataObject::OctetString(v) => Ok(v.clone()),
            _ => Err(self.type_error(DataObjectType::OctetString)),
        }
    }

    pub fn as_string(&self) -> DlmsResult<&str> {
        match self {
            DataObject::String(v) => Ok(v),
            _ => Err(self.type_error(DataObjectType::String)),
        }
    }

    /// Returns a copy of the stored bits
    pub fn as_bit_string(&self) -> DlmsResult<Vec<u8>> {
        match self {
            DataObject::BitString(v) => Ok(v.clone()),
            _ => Err(self.type_error(DataObjectType::BitString)),
        }
    }

    pub fn as_date_time(&self) -> DlmsResult<NaiveDateTime> {
        match self {
            DataObject::DateTime(v) => Ok(*v),
            _ => Err(self.type_error(DataObjectType::DateTime)),
        }
    }

    pub fn as_array(&self) -> DlmsResult<&[DataObject]> {
        match self {
            DataObject::Array(v) => Ok(v),
            _ => Err(self.type_error(DataObjectType::Array)),
        }
    }

    pub fn as_structure(&self) -> DlmsResult<&[DataObject]> {
        match self {
            DataObject::Structure(v) => Ok(v),
            _ => Err(self.type_error(DataObjectType::Structure)),
        }
    }
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataObject::Null => write!(f, "NULL"),
            DataObject::Boolean(b) => write!(f, "BOOLEAN: {}", b),
            DataObject::Integer(i) => write!(f, "INTEGER: {}", i),
            DataObject::Unsigned(u) => write!(f, "UNSIGNED: {}", u),
            DataObject::Float32(v) => write!(f, "FLOAT32: {}", v),
            DataObject::Float64(v) => write!(f, "FLOAT64: {}", v),
            DataObject::OctetString(s) => {
                write!(f, "OCTET_STRING:")?;
                for byte in s {
                    write!(f, " {:02X}", byte)?;
                }
                Ok(())
            }
            DataObject::String(s) => write!(f, "STRING: {}", s),
            DataObject::BitString(s) => {
                write!(f, "BIT_STRING: ")?;
                for byte in s {
                    write!(f, "{:08b}", byte)?;
                }
                Ok(())
            }
            DataObject::DateTime(dt) => write!(f, "DATE_TIME: {}", dt),
            DataObject::Array(arr) => write!(f, "ARRAY: {} element(s)", arr.len()),
            DataObject::Structure(s) => write!(f, "STRUCTURE: {} element(s)", s.len()),
        }
    }
}
