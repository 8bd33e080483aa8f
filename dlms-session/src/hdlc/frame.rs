//! HDLC frame structure and encoding/decoding

use crate::hdlc::fcs::{fcs, FcsCalc};
use dlms_core::{DlmsError, DlmsResult};
use std::fmt;

/// HDLC frame flag
pub const FLAG: u8 = 0x7E;

/// Frame format byte
pub const FORMAT_TYPE: u8 = 0xA0;

/// Control byte for SNRM (Set Normal Response Mode)
pub const CONTROL_SNRM: u8 = 0x93;

/// Control byte for DISC (Disconnect)
pub const CONTROL_DISC: u8 = 0x53;

/// Smallest frame body: format, two addresses, control and FCS
pub const MIN_FRAME_BODY: usize = 6;

/// HDLC frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Information,
    ReceiveReady,
    ReceiveNotReady,
    SetNormalResponseMode,
    Disconnect,
    UnnumberedAcknowledge,
    DisconnectMode,
    FrameReject,
    UnnumberedInformation,
    InvalidType,
}

impl FrameType {
    /// Get frame type from control byte
    pub fn from_control_byte(control_byte: u8) -> Self {
        match control_byte {
            x if (x & 0x01) == 0x00 => FrameType::Information,
            x if (x & 0x0F) == 0x01 => FrameType::ReceiveReady,
            x if (x & 0x0F) == 0x05 => FrameType::ReceiveNotReady,
            x if (x & 0xEF) == 0x83 => FrameType::SetNormalResponseMode,
            x if (x & 0xEF) == 0x43 => FrameType::Disconnect,
            x if (x & 0xEF) == 0x63 => FrameType::UnnumberedAcknowledge,
            x if (x & 0xEF) == 0x0F => FrameType::DisconnectMode,
            x if (x & 0xEF) == 0x87 => FrameType::FrameReject,
            x if (x & 0xEF) == 0x03 => FrameType::UnnumberedInformation,
            _ => FrameType::InvalidType,
        }
    }
}

/// Control byte of an I-frame carrying send sequence `send_seq`
pub fn information_control(send_seq: u8) -> u8 {
    send_seq << 1
}

/// HDLC frame
///
/// Addresses are single bytes. The FCS covers every byte between the outer
/// flags and is appended little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdlcFrame {
    destination: u8,
    source: u8,
    control: u8,
    information_field: Vec<u8>,
}

impl HdlcFrame {
    /// Create a new HDLC frame
    pub fn new(destination: u8, source: u8, control: u8, information_field: Vec<u8>) -> Self {
        Self {
            destination,
            source,
            control,
            information_field,
        }
    }

    /// Encode the frame including both flags
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(MIN_FRAME_BODY + self.information_field.len());
        body.push(FORMAT_TYPE);
        body.push(self.destination);
        body.push(self.source);
        body.push(self.control);
        body.extend_from_slice(&self.information_field);
        let check = fcs(&body);

        let mut frame = Vec::with_capacity(body.len() + 4);
        frame.push(FLAG);
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&check);
        frame.push(FLAG);
        frame
    }

    /// Decode a frame body, i.e. the bytes between the two flags
    pub fn decode(body: &[u8]) -> DlmsResult<Self> {
        if body.len() < MIN_FRAME_BODY {
            return Err(DlmsError::Protocol(format!(
                "HDLC frame too short: {} bytes",
                body.len()
            )));
        }

        let mut calc = FcsCalc::new();
        calc.update_bytes(body);
        calc.validate()?;

        Ok(Self {
            destination: body[1],
            source: body[2],
            control: body[3],
            information_field: body[4..body.len() - 2].to_vec(),
        })
    }

    pub fn frame_type(&self) -> FrameType {
        FrameType::from_control_byte(self.control)
    }

    /// UA frames are recognised on the control byte with the poll/final bit masked
    pub fn is_unnumbered_acknowledge(&self) -> bool {
        (self.control & 0xEF) == 0x63
    }

    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn information_field(&self) -> &[u8] {
        &self.information_field
    }

    pub fn into_information_field(self) -> Vec<u8> {
        self.information_field
    }
}

impl fmt::Display for HdlcFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HdlcFrame({:?}, dest=0x{:02X}, src=0x{:02X}, control=0x{:02X}, info={} bytes)",
            self.frame_type(),
            self.destination,
            self.source,
            self.control,
            self.information_field.len()
        )
    }
}
