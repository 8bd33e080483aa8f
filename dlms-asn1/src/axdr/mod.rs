//! A-XDR encoding/decoding module

pub mod encoder;
pub mod decoder;
pub mod types;

pub use encoder::{encode_data, AxdrEncoder};
pub use decoder::{decode_data, AxdrDecoder};
pub use types::{AxdrTag, LengthEncoding};
