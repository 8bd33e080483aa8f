//! ASN.1 processing for DLMS/COSEM
//!
//! - [`axdr`]: A-XDR codec mapping wire data to [`dlms_core::DataObject`]
//! - [`ber`]: the BER subset needed by ACSE
//! - [`iso_acse`]: AARQ/AARE/RLRQ/RLRE

pub mod axdr;
pub mod ber;
pub mod iso_acse;

pub use axdr::{decode_data, encode_data, AxdrDecoder, AxdrEncoder, AxdrTag, LengthEncoding};
pub use ber::{BerDecoder, BerEncoder, BerTag, BerTagClass};
pub use iso_acse::{AARQApdu, AAREApdu, AssociateResult, RLREApdu, RLRQApdu};
