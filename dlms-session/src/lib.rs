//! Session layer module for DLMS/COSEM protocol
//!
//! This crate frames application PDUs for the wire. Two interchangeable
//! implementations of [`Transport`] are provided: HDLC framing and the
//! IEC 62056-47 TCP wrapper.

pub mod hdlc;
pub mod wrapper;

use async_trait::async_trait;
use dlms_core::DlmsResult;

pub use hdlc::{HdlcFrame, HdlcParameters, HdlcTransport};
pub use wrapper::{TcpWrapperTransport, WrapperHeader, WrapperPdu, WRAPPER_BUFFER_SIZE, WRAPPER_HEADER_LENGTH};

/// Request/response channel to a meter
#[async_trait]
pub trait Transport: Send {
    /// Bring the link up (e.g. the SNRM/UA handshake)
    async fn establish(&mut self) -> DlmsResult<()>;

    /// Take the link down. Failures are logged, not returned.
    async fn disconnect(&mut self) -> DlmsResult<()>;

    /// Send one APDU and return the APDU carried by the reply
    async fn send(&mut self, data: &[u8]) -> DlmsResult<Vec<u8>>;

    /// Close the underlying stream
    async fn close(&mut self) -> DlmsResult<()>;
}
