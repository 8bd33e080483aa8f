//! Core types and utilities for DLMS/COSEM protocol
//!
//! This crate provides the error taxonomy, OBIS codes, the `DataObject`
//! value container and the catalog of COSEM objects the head-end addresses.

pub mod error;
pub mod obis_code;
pub mod datatypes;
pub mod cosem_object;

pub use error::{DlmsError, DlmsResult};
pub use obis_code::ObisCode;
pub use datatypes::{DataObject, DataObjectType};
pub use cosem_object::{AccessLevel, CosemObject};
