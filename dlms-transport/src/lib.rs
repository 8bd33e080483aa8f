//! Transport layer module for DLMS/COSEM protocol
//!
//! This crate provides the byte-stream access used underneath the HDLC and
//! TCP-wrapper session layers.

pub mod stream;
pub mod tcp;

pub use stream::{IoStream, StreamAccessor};
pub use tcp::{TcpSettings, TcpTransport};
