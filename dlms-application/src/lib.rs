//! Application layer module for DLMS/COSEM protocol
//!
//! - [`pdu`]: xDLMS InitiateRequest/Response, attribute descriptors, error APDUs
//! - [`service`]: Get and Set request/response codecs
//! - [`encrypted`]: glo-ciphering of APDUs under an encrypting security policy
//! - [`association`]: [`CosemAssociation`], the AARQ/AARE handshake and
//!   Get/Set over an established association

pub mod association;
pub mod encrypted;
pub mod pdu;
pub mod service;

pub use association::{AssociationContext, AssociationState, CosemAssociation, OperationResult};
pub use pdu::{Conformance, DataAccessResult};
