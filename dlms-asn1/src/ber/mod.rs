//! BER (Basic Encoding Rules) encoder and decoder for ASN.1
//!
//! The ACSE APDUs that open and close a COSEM association (AARQ, AARE,
//! RLRQ, RLRE) are BER-encoded, unlike the A-XDR used by xDLMS services.
//! Every value is a Tag-Length-Value triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! Only low tag numbers (0..=30) and definite lengths occur in these APDUs,
//! so extended tags and indefinite lengths are rejected.

pub mod encoder;
pub mod decoder;
pub mod types;

pub use encoder::BerEncoder;
pub use decoder::BerDecoder;
pub use types::{BerTag, BerTagClass};
