//! Service layer for DLMS/COSEM application layer
//!
//! - **GET**: read one attribute, optionally one entry of a buffer
//! - **SET**: write one attribute
//!
//! Requests always use the `-Normal` variants with invoke-id-and-priority
//! `0xC1`; block transfer and `-WithList` are not negotiated.

pub mod get;
pub mod set;

pub use get::{GetDataResult, GetRequestNormal, GetResponseNormal, GetService};
pub use set::{SetRequestNormal, SetResponseNormal, SetService};
