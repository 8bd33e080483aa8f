//! HDLC transport: SNRM/UA link setup and I-frame exchange over a byte stream

use crate::hdlc::frame::{
    information_control, HdlcFrame, CONTROL_DISC, CONTROL_SNRM, FLAG, MIN_FRAME_BODY,
};
use crate::Transport;
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use dlms_core::{DlmsError, DlmsResult};
use dlms_transport::StreamAccessor;
use std::io;

/// Default maximum information field length
pub const DEFAULT_MAX_INFORMATION_LENGTH: usize = 128;

const READ_CHUNK: usize = 256;

/// HDLC link parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdlcParameters {
    /// Our (client) address, the source of every frame we send
    pub client_address: u8,
    /// The meter's address, the destination of every frame we send
    pub server_address: u8,
    /// Largest information field accepted from the meter
    pub max_information_length: usize,
}

impl HdlcParameters {
    /// Addresses are the low bytes of the client id and server lower MAC address
    pub fn new(client_id: u16, server_lower_mac_address: u16) -> Self {
        Self {
            client_address: (client_id & 0xFF) as u8,
            server_address: (server_lower_mac_address & 0xFF) as u8,
            max_information_length: DEFAULT_MAX_INFORMATION_LENGTH,
        }
    }

    pub fn with_max_information_length(mut self, length: usize) -> Self {
        self.max_information_length = length;
        self
    }

    fn max_frame_body(&self) -> usize {
        self.max_information_length + MIN_FRAME_BODY
    }
}

/// HDLC framing on top of a [`StreamAccessor`]
pub struct HdlcTransport<S> {
    stream: S,
    params: HdlcParameters,
    send_seq: u8,
    rx: BytesMut,
}

impl<S: StreamAccessor> HdlcTransport<S> {
    pub fn new(stream: S, params: HdlcParameters) -> Self {
        Self {
            stream,
            params,
            send_seq: 0,
            rx: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub fn parameters(&self) -> &HdlcParameters {
        &self.params
    }

    /// Sequence number the next I-frame will carry
    pub fn send_sequence(&self) -> u8 {
        self.send_seq
    }

    async fn write_frame(&mut self, control: u8, information: &[u8]) -> DlmsResult<()> {
        let frame = HdlcFrame::new(
            self.params.server_address,
            self.params.client_address,
            control,
            information.to_vec(),
        );
        self.stream.write_all(&frame.encode()).await?;
        self.stream.flush().await
    }

    /// Read exactly one frame: skip to an opening flag, collect up to the next flag
    async fn read_frame(&mut self) -> DlmsResult<HdlcFrame> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(body) = self.take_frame_body()? {
                return HdlcFrame::decode(&body);
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(DlmsError::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "End of stream before closing HDLC flag",
                )));
            }
            self.rx.extend_from_slice(&chunk[..n]);
        }
    }

    fn take_frame_body(&mut self) -> DlmsResult<Option<Bytes>> {
        let max_body = self.params.max_frame_body();
        loop {
            let Some(start) = self.rx.iter().position(|&b| b == FLAG) else {
                self.rx.clear();
                return Ok(None);
            };
            self.rx.advance(start);

            match self.rx[1..].iter().position(|&b| b == FLAG) {
                None => {
                    if self.rx.len() - 1 > max_body {
                        self.rx.clear();
                        return Err(DlmsError::Protocol(format!(
                            "HDLC frame exceeds maximum length of {} bytes",
                            max_body
                        )));
                    }
                    return Ok(None);
                }
                // back-to-back flags
                Some(0) => self.rx.advance(1),
                Some(end) => {
                    // the closing flag stays buffered; it may open the next frame
                    let mut body = self.rx.split_to(end + 1);
                    body.advance(1);
                    if body.len() > max_body {
                        return Err(DlmsError::Protocol(format!(
                            "HDLC frame exceeds maximum length of {} bytes",
                            max_body
                        )));
                    }
                    return Ok(Some(body.freeze()));
                }
            }
        }
    }
}

#[async_trait]
impl<S: StreamAccessor> Transport for HdlcTransport<S> {
    async fn establish(&mut self) -> DlmsResult<()> {
        self.send_seq = 0;
        self.rx.clear();
        self.write_frame(CONTROL_SNRM, &[]).await?;

        let reply = self.read_frame().await?;
        if !reply.is_unnumbered_acknowledge() {
            return Err(DlmsError::Connect(format!(
                "Invalid response to SNRM: control 0x{:02X}",
                reply.control()
            )));
        }
        log::debug!("HDLC link established with server 0x{:02X}", self.params.server_address);
        Ok(())
    }

    async fn disconnect(&mut self) -> DlmsResult<()> {
        if let Err(e) = self.write_frame(CONTROL_DISC, &[]).await {
            log::warn!("Failed to send HDLC DISC: {}", e);
            return Ok(());
        }
        match self.read_frame().await {
            Ok(reply) if reply.is_unnumbered_acknowledge() => {
                log::debug!("HDLC link released");
            }
            Ok(reply) => {
                log::warn!("Invalid response to DISC: control 0x{:02X}", reply.control());
            }
            Err(e) => {
                log::warn!("No response to DISC: {}", e);
            }
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        let control = information_control(self.send_seq);
        self.send_seq = (self.send_seq + 1) % 8;
        self.write_frame(control, data).await?;

        let reply = self.read_frame().await?;
        Ok(reply.into_information_field())
    }

    async fn close(&mut self) -> DlmsResult<()> {
        self.stream.close().await
    }
}
