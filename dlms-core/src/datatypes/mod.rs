//! Data types for DLMS/COSEM protocol

pub mod data_object;

pub use data_object::{DataObject, DataObjectType};
