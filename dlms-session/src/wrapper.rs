//! Wrapper session layer for DLMS/COSEM

use crate::Transport;
use async_trait::async_trait;
use dlms_core::{DlmsError, DlmsResult};
use dlms_transport::StreamAccessor;

/// Wrapper header length
pub const WRAPPER_HEADER_LENGTH: usize = 8;

/// Receive buffer capacity, header included
pub const WRAPPER_BUFFER_SIZE: usize = 2048;

/// Wrapper protocol version
pub const WRAPPER_VERSION: u16 = 1;

/// Wrapper header
///
/// Layout on the wire, all fields big-endian:
/// `version(2) length(2) source(2) destination(2)`, where `length` counts
/// the header itself plus the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperHeader {
    version: u16,
    length: u16,
    source: u16,
    destination: u16,
}

impl WrapperHeader {
    /// Create a new wrapper header for a payload of `payload_length` bytes
    pub fn new(source: u16, destination: u16, payload_length: usize) -> DlmsResult<Self> {
        let length = u16::try_from(payload_length + WRAPPER_HEADER_LENGTH).map_err(|_| {
            DlmsError::Protocol(format!("Wrapper payload too large: {} bytes", payload_length))
        })?;
        Ok(Self {
            version: WRAPPER_VERSION,
            length,
            source,
            destination,
        })
    }

    /// Encode header to bytes (big-endian)
    pub fn encode(&self) -> [u8; WRAPPER_HEADER_LENGTH] {
        let mut result = [0u8; WRAPPER_HEADER_LENGTH];
        result[0..2].copy_from_slice(&self.version.to_be_bytes());
        result[2..4].copy_from_slice(&self.length.to_be_bytes());
        result[4..6].copy_from_slice(&self.source.to_be_bytes());
        result[6..8].copy_from_slice(&self.destination.to_be_bytes());
        result
    }

    /// Decode header from bytes
    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        if data.len() < WRAPPER_HEADER_LENGTH {
            return Err(DlmsError::Protocol(format!(
                "Wrapper header too short: expected {}, got {}",
                WRAPPER_HEADER_LENGTH,
                data.len()
            )));
        }

        Ok(Self {
            version: u16::from_be_bytes([data[0], data[1]]),
            length: u16::from_be_bytes([data[2], data[3]]),
            source: u16::from_be_bytes([data[4], data[5]]),
            destination: u16::from_be_bytes([data[6], data[7]]),
        })
    }

    /// Payload length declared by the header
    ///
    /// Fails unless the payload is non-empty and fits the receive buffer.
    pub fn data_length(&self) -> DlmsResult<usize> {
        let data_length = self.length as isize - WRAPPER_HEADER_LENGTH as isize;
        if data_length <= 0 || data_length as usize > WRAPPER_BUFFER_SIZE - WRAPPER_HEADER_LENGTH {
            return Err(DlmsError::Protocol(format!(
                "Invalid DLMS wrapper length: {}",
                data_length
            )));
        }
        Ok(data_length as usize)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Total length including the header
    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn source(&self) -> u16 {
        self.source
    }

    pub fn destination(&self) -> u16 {
        self.destination
    }
}

/// Wrapper PDU (Protocol Data Unit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperPdu {
    header: WrapperHeader,
    data: Vec<u8>,
}

impl WrapperPdu {
    pub fn new(source: u16, destination: u16, data: Vec<u8>) -> DlmsResult<Self> {
        let header = WrapperHeader::new(source, destination, data.len())?;
        Ok(Self { header, data })
    }

    /// Encode PDU to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(WRAPPER_HEADER_LENGTH + self.data.len());
        result.extend_from_slice(&self.header.encode());
        result.extend_from_slice(&self.data);
        result
    }

    /// Decode a complete PDU from bytes
    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let header = WrapperHeader::decode(data)?;
        let data_length = header.data_length()?;
        let payload = &data[WRAPPER_HEADER_LENGTH..];
        if payload.len() != data_length {
            return Err(DlmsError::Protocol(format!(
                "Wrapper payload length mismatch: header says {}, got {}",
                data_length,
                payload.len()
            )));
        }
        Ok(Self {
            header,
            data: payload.to_vec(),
        })
    }

    /// Read one PDU from a stream
    pub async fn read_from<S: StreamAccessor + ?Sized>(stream: &mut S) -> DlmsResult<Self> {
        let mut header_bytes = [0u8; WRAPPER_HEADER_LENGTH];
        stream.read_exact(&mut header_bytes).await?;
        let header = WrapperHeader::decode(&header_bytes)?;

        let mut data = vec![0u8; header.data_length()?];
        stream.read_exact(&mut data).await?;
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &WrapperHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// TCP wrapper framing on top of a [`StreamAccessor`]
#[derive(Debug)]
pub struct TcpWrapperTransport<S> {
    stream: S,
    source: u16,
    destination: u16,
}

impl<S: StreamAccessor> TcpWrapperTransport<S> {
    /// `source` is the client wPort, `destination` the server's
    pub fn new(stream: S, source: u16, destination: u16) -> Self {
        Self {
            stream,
            source,
            destination,
        }
    }
}

#[async_trait]
impl<S: StreamAccessor> Transport for TcpWrapperTransport<S> {
    async fn establish(&mut self) -> DlmsResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> DlmsResult<()> {
        if let Err(e) = self.stream.close().await {
            log::warn!("Error closing TCP connection: {}", e);
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        let pdu = WrapperPdu::new(self.source, self.destination, data.to_vec())?;
        self.stream.write_all(&pdu.encode()).await?;
        self.stream.flush().await?;

        let reply = WrapperPdu::read_from(&mut self.stream).await?;
        Ok(reply.into_data())
    }

    async fn close(&mut self) -> DlmsResult<()> {
        self.stream.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlms_transport::IoStream;
    use tokio_test::io::Builder;

    fn header_with_length(length: u16) -> [u8; WRAPPER_HEADER_LENGTH] {
        let [hi, lo] = length.to_be_bytes();
        [0x00, 0x01, hi, lo, 0x00, 0x01, 0x00, 0x01]
    }

    #[test]
    fn test_wrapper_header_layout() {
        let header = WrapperHeader::new(0x0001, 0x0010, 3).unwrap();
        assert_eq!(header.encode(), [0x00, 0x01, 0x00, 0x0B, 0x00, 0x01, 0x00, 0x10]);

        let decoded = WrapperHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.version(), 1);
        assert_eq!(decoded.data_length().unwrap(), 3);
    }

    #[test]
    fn test_wrapper_pdu_encode_decode() {
        let pdu = WrapperPdu::new(1, 1, vec![0xC0, 0x01, 0xC1]).unwrap();
        let encoded = pdu.encode();
        assert_eq!(encoded.len(), 11);
        assert_eq!(&encoded[8..], &[0xC0, 0x01, 0xC1]);
        assert_eq!(WrapperPdu::decode(&encoded).unwrap(), pdu);
        assert!(WrapperPdu::decode(&encoded[..10]).is_err());
    }

    #[test]
    fn test_data_length_bounds() {
        for length in [0u16, 7, 8, 2049, u16::MAX] {
            let header = WrapperHeader::decode(&header_with_length(length)).unwrap();
            assert!(
                matches!(header.data_length(), Err(DlmsError::Protocol(_))),
                "accepted length {}",
                length
            );
        }
        for length in [9u16, 100, 2048] {
            let header = WrapperHeader::decode(&header_with_length(length)).unwrap();
            assert_eq!(header.data_length().unwrap(), length as usize - 8);
        }
    }

    #[test]
    fn test_round_trip_at_buffer_capacity() {
        let capacity = WRAPPER_BUFFER_SIZE - WRAPPER_HEADER_LENGTH;
        let payload: Vec<u8> = (0..capacity).map(|i| i as u8).collect();
        let pdu = WrapperPdu::new(0x0010, 0x0001, payload.clone()).unwrap();
        let encoded = pdu.encode();
        assert_eq!(&encoded[2..4], &[0x08, 0x00]);

        let decoded = WrapperPdu::decode(&encoded).unwrap();
        assert_eq!(decoded.header().data_length().unwrap(), 2040);
        assert_eq!(decoded.header().source(), 0x0010);
        assert_eq!(decoded.header().destination(), 0x0001);
        assert_eq!(decoded.into_data(), payload);

        // one byte past the receive buffer
        let oversized = WrapperPdu::new(1, 1, vec![0x5A; capacity + 1]).unwrap().encode();
        assert_eq!(&oversized[2..4], &[0x08, 0x01]);
        assert!(matches!(WrapperPdu::decode(&oversized), Err(DlmsError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_read_from_at_buffer_capacity() {
        let payload = vec![0xA5; 2040];
        let mock = Builder::new()
            .read(&header_with_length(2048))
            .read(&payload[..1000])
            .read(&payload[1000..])
            .build();
        let mut stream = IoStream::new(mock, None);
        let pdu = WrapperPdu::read_from(&mut stream).await.unwrap();
        assert_eq!(pdu.data(), &payload[..]);

        let mock = Builder::new().read(&header_with_length(2049)).build();
        let mut stream = IoStream::new(mock, None);
        assert!(matches!(
            WrapperPdu::read_from(&mut stream).await,
            Err(DlmsError::Protocol(_))
        ));
    }

    #[test]
    fn test_oversized_payload_rejected_on_send() {
        assert!(WrapperHeader::new(1, 1, u16::MAX as usize).is_err());
    }

    #[tokio::test]
    async fn test_send_strips_reply_header() {
        let mock = Builder::new()
            .write(&[0x00, 0x01, 0x00, 0x0A, 0x00, 0x01, 0x00, 0x01, 0xAA, 0xBB])
            .read(&[0x00, 0x01, 0x00, 0x0B, 0x00, 0x01, 0x00, 0x01])
            .read(&[0x01, 0x02])
            .read(&[0x03])
            .build();
        let mut transport = TcpWrapperTransport::new(IoStream::new(mock, None), 1, 1);
        transport.establish().await.unwrap();
        assert_eq!(transport.send(&[0xAA, 0xBB]).await.unwrap(), vec![0x01, 0x02, 0x03]);
    }

    #[tokio::test]
    async fn test_send_rejects_empty_reply() {
        let mock = Builder::new()
            .write(&[0x00, 0x01, 0x00, 0x09, 0x00, 0x01, 0x00, 0x01, 0xAA])
            .read(&header_with_length(8))
            .build();
        let mut transport = TcpWrapperTransport::new(IoStream::new(mock, None), 1, 1);
        assert!(matches!(transport.send(&[0xAA]).await, Err(DlmsError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_send_truncated_reply() {
        let mock = Builder::new()
            .write(&[0x00, 0x01, 0x00, 0x09, 0x00, 0x01, 0x00, 0x01, 0xAA])
            .read(&header_with_length(12))
            .read(&[0x01])
            .build();
        let mut transport = TcpWrapperTransport::new(IoStream::new(mock, None), 1, 1);
        assert!(matches!(transport.send(&[0xAA]).await, Err(DlmsError::Connection(_))));
    }

    #[tokio::test]
    async fn test_disconnect_closes_stream() {
        let mock = Builder::new().build();
        let mut transport = TcpWrapperTransport::new(IoStream::new(mock, None), 1, 1);
        transport.disconnect().await.unwrap();
        // already closed
        transport.close().await.unwrap();
        assert!(transport.send(&[0x01]).await.is_err());
    }
}
