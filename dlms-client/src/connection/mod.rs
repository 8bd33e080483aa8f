//! Connection management module

pub mod builder;
pub mod connector;
pub mod protocol;

pub use builder::ConnectionBuilder;
pub use connector::{Connector, TcpConnector};
pub use protocol::{DlmsProtocol, CONNECT_FAILED, NOT_CONNECTED};
