//! Connection builder for DLMS/COSEM client
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use dlms_client::connection::ConnectionBuilder;
//! use dlms_client::DlmsConfig;
//! use dlms_core::CosemObject;
//!
//! # async fn run() -> dlms_core::DlmsResult<()> {
//! let mut protocol = ConnectionBuilder::new()
//!     .tcp("192.168.1.100", 4059)
//!     .config(DlmsConfig::default().with_hdlc(false))
//!     .build()?;
//!
//! if protocol.connect().await {
//!     let reading = protocol.get(&CosemObject::ACTIVE_POWER_IMPORT).await;
//!     println!("{}", reading);
//! }
//! protocol.close().await;
//! # Ok(())
//! # }
//! ```

use super::connector::{Connector, TcpConnector};
use super::protocol::DlmsProtocol;
use crate::config::DlmsConfig;
use dlms_core::{DlmsError, DlmsResult};
use dlms_security::SecuritySuite;
use std::sync::Arc;

/// Builder for [`DlmsProtocol`]
///
/// Only the target is mandatory. The configuration defaults to
/// [`DlmsConfig::default`], the connector to [`TcpConnector`], and the
/// security suite to the one the configuration describes.
#[derive(Clone)]
pub struct ConnectionBuilder {
    target: Option<(String, u16)>,
    config: DlmsConfig,
    security_suite: Option<Arc<SecuritySuite>>,
    connector: Option<Arc<dyn Connector>>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self {
            target: None,
            config: DlmsConfig::default(),
            security_suite: None,
            connector: None,
        }
    }

    /// Configure the meter's TCP endpoint
    ///
    /// # Arguments
    /// * `address` - Host name or IP address of the meter
    /// * `port` - TCP port (4059 is the IANA-registered DLMS port)
    pub fn tcp(mut self, address: &str, port: u16) -> Self {
        self.target = Some((address.to_string(), port));
        self
    }

    pub fn config(mut self, config: DlmsConfig) -> Self {
        self.config = config;
        self
    }

    /// Shortcut for HDLC addressing on top of the current configuration
    pub fn hdlc_addresses(mut self, client_id: u16, server_lower_mac_address: u16) -> Self {
        self.config = self.config.with_hdlc(true).with_addresses(client_id, server_lower_mac_address);
        self
    }

    /// Shortcut for TCP wrapper wPorts on top of the current configuration
    pub fn wrapper_ids(mut self, client_id: u16, logical_device: u16) -> Self {
        self.config.client_id = client_id;
        self.config = self.config.with_hdlc(false).with_logical_device(logical_device);
        self
    }

    /// Use an already built suite instead of deriving one from the configuration
    ///
    /// Sharing one suite between sessions keeps a single frame counter.
    pub fn security(mut self, suite: Arc<SecuritySuite>) -> Self {
        self.security_suite = Some(suite);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the session, not yet connected
    ///
    /// # Errors
    /// [`DlmsError::Config`] if no target was given, the configuration does
    /// not validate, or its key material is malformed.
    pub fn build(self) -> DlmsResult<DlmsProtocol> {
        let (address, port) = self
            .target
            .ok_or_else(|| DlmsError::Config("Meter address must be configured".to_string()))?;
        self.config.validate()?;

        let security = match self.security_suite {
            Some(suite) => suite,
            None => Arc::new(self.config.security_suite()?),
        };
        let connector = self.connector.unwrap_or_else(|| Arc::new(TcpConnector));

        Ok(DlmsProtocol::new(address, port, Arc::new(self.config), security, connector))
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
