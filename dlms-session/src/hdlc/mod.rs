//! HDLC session layer module

pub mod fcs;
pub mod frame;
pub mod transport;

pub use fcs::{FcsCalc, GOOD_FCS};
pub use frame::{FrameType, HdlcFrame, CONTROL_DISC, CONTROL_SNRM, FLAG, FORMAT_TYPE};
pub use transport::{HdlcParameters, HdlcTransport};
