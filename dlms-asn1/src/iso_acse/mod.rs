//! ISO-ACSE association PDUs
//!
//! - **AARQ**: Association Request (Application tag 0)
//! - **AARE**: Association Response (Application tag 1)
//! - **RLRQ**: Release Request (Application tag 2)
//! - **RLRE**: Release Response (Application tag 3)
//!
//! Object identifiers are kept as their encoded content octets; DLMS only
//! uses a handful of fixed OIDs under `{2 16 756 5 8}`.

pub mod pdu;

pub use pdu::{AARQApdu, AAREApdu, AssociateResult, RLREApdu, RLRQApdu};

/// Logical-name referencing, no ciphering: `{2 16 756 5 8 1 1}`
pub const APPLICATION_CONTEXT_LN: [u8; 7] = [0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01];

/// Logical-name referencing with ciphering: `{2 16 756 5 8 1 3}`
pub const APPLICATION_CONTEXT_LN_CIPHERED: [u8; 7] = [0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x03];

/// Low-level security (password) mechanism: `{2 16 756 5 8 2 1}`
pub const MECHANISM_LOW_LEVEL: [u8; 7] = [0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x01];

/// High-level security with GMAC: `{2 16 756 5 8 2 5}`
pub const MECHANISM_HIGH_LEVEL_GMAC: [u8; 7] = [0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x05];
