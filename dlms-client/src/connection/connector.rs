//! Opening the byte stream to a meter
//!
//! [`DlmsProtocol`](super::DlmsProtocol) never dials sockets itself; it asks a
//! [`Connector`] for a [`StreamAccessor`] and layers the session framing on
//! top. Production code uses [`TcpConnector`].

use crate::config::DlmsConfig;
use async_trait::async_trait;
use dlms_core::DlmsResult;
use dlms_transport::{StreamAccessor, TcpSettings, TcpTransport};

/// Source of connected streams
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a stream to `address:port` honouring the configured timeouts
    async fn connect(
        &self,
        address: &str,
        port: u16,
        config: &DlmsConfig,
    ) -> DlmsResult<Box<dyn StreamAccessor>>;
}

/// Plain TCP connector
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn settings(address: &str, port: u16, config: &DlmsConfig) -> TcpSettings {
        TcpSettings::new(address, port)
            .with_connect_timeout(config.connect_timeout())
            .with_read_timeout(Some(config.read_timeout()))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        address: &str,
        port: u16,
        config: &DlmsConfig,
    ) -> DlmsResult<Box<dyn StreamAccessor>> {
        let transport = TcpTransport::connect(&Self::settings(address, port, config)).await?;
        Ok(Box::new(transport))
    }
}
