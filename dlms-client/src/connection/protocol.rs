//! One scoped session with a meter
//!
//! # Connection Flow
//!
//! 1. **Transport Open**: the [`Connector`] opens the socket
//! 2. **Session Open**: HDLC SNRM/UA, or nothing for the TCP wrapper
//! 3. **Association**: AARQ/AARE through [`CosemAssociation`]
//! 4. **Ready**: Get and Set until [`DlmsProtocol::close`]
//!
//! Closing runs the steps backwards: release the association, disconnect the
//! session, close the socket. A failure at one step is logged and the next
//! step still runs.

use super::connector::Connector;
use crate::config::DlmsConfig;
use dlms_application::{AssociationContext, CosemAssociation, OperationResult};
use dlms_core::{CosemObject, DataObject, DlmsError, DlmsResult};
use dlms_security::SecuritySuite;
use dlms_session::{HdlcParameters, HdlcTransport, TcpWrapperTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Failure message when the meter cannot be reached or refuses the association
pub const CONNECT_FAILED: &str = "Failed to connect to meter";

/// Failure message for Get/Set outside a session
pub const NOT_CONNECTED: &str = "Not connected to meter";

/// Session with one meter: transport, framing and association
pub struct DlmsProtocol {
    address: String,
    port: u16,
    config: Arc<DlmsConfig>,
    security: Arc<SecuritySuite>,
    connector: Arc<dyn Connector>,
    association: Option<CosemAssociation>,
    connected: bool,
}

impl DlmsProtocol {
    pub fn new(
        address: impl Into<String>,
        port: u16,
        config: Arc<DlmsConfig>,
        security: Arc<SecuritySuite>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            config,
            security,
            connector,
            association: None,
            connected: false,
        }
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Open the session; `false` on any failure, with partial resources released
    pub async fn connect(&mut self) -> bool {
        match self.open().await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to connect to {}: {}", self.target(), e);
                false
            }
        }
    }

    /// Open the session, reporting why it failed
    ///
    /// A refused association surfaces as [`DlmsError::Association`] carrying
    /// [`CONNECT_FAILED`].
    pub async fn open(&mut self) -> DlmsResult<()> {
        if self.connected {
            return Ok(());
        }

        let stream = self
            .connector
            .connect(&self.address, self.port, &self.config)
            .await?;

        let mut transport: Box<dyn Transport> = if self.config.use_hdlc {
            let params = HdlcParameters::new(self.config.client_id, self.config.server_lower_mac_address)
                .with_max_information_length(self.config.max_info_length);
            Box::new(HdlcTransport::new(stream, params))
        } else {
            Box::new(TcpWrapperTransport::new(
                stream,
                self.config.client_id,
                self.config.logical_device,
            ))
        };

        if let Err(e) = transport.establish().await {
            if let Err(close_err) = transport.close().await {
                log::warn!("Error closing socket to {}: {}", self.target(), close_err);
            }
            return Err(e);
        }

        let context = AssociationContext::with_defaults().with_max_pdu_size(self.config.receive_pdu_size());
        let mut association =
            CosemAssociation::with_context(transport, Arc::clone(&self.security), context);

        let associated = match tokio::time::timeout(
            Duration::from_millis(self.config.association_timeout_ms),
            association.associate(),
        )
        .await
        {
            Ok(associated) => associated,
            Err(_) => {
                log::error!("Association with {} timed out", self.target());
                false
            }
        };

        self.association = Some(association);
        if !associated {
            self.close().await;
            return Err(DlmsError::Association(CONNECT_FAILED.to_string()));
        }

        self.connected = true;
        log::debug!("Connected to meter {}", self.target());
        Ok(())
    }

    /// Read one attribute
    pub async fn get(&mut self, object: &CosemObject) -> OperationResult {
        if !object.access_level().can_read() {
            return OperationResult::failure(format!("{} is not readable", object));
        }
        match self.association_mut() {
            Some(association) => association.get(object).await,
            None => OperationResult::failure(NOT_CONNECTED),
        }
    }

    /// Write one attribute
    pub async fn set(&mut self, object: &CosemObject, value: &DataObject) -> OperationResult {
        if !object.access_level().can_write() {
            return OperationResult::failure(format!("{} is not writable", object));
        }
        match self.association_mut() {
            Some(association) => association.set(object, value).await,
            None => OperationResult::failure(NOT_CONNECTED),
        }
    }

    /// Release, disconnect, close; safe to call in any state
    pub async fn close(&mut self) {
        self.connected = false;
        let Some(mut association) = self.association.take() else {
            return;
        };

        let release_timeout = Duration::from_millis(self.config.release_timeout_ms);
        if tokio::time::timeout(release_timeout, association.release())
            .await
            .is_err()
        {
            log::warn!("Release from {} timed out", self.target());
        }

        let transport = association.transport_mut();
        if let Err(e) = transport.disconnect().await {
            log::warn!("Error disconnecting from {}: {}", self.target(), e);
        }
        if let Err(e) = transport.close().await {
            log::debug!("Error closing socket to {}: {}", self.target(), e);
        }
    }

    fn association_mut(&mut self) -> Option<&mut CosemAssociation> {
        if self.connected {
            self.association.as_mut()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, MeterBehaviour};

    fn protocol(connector: &FakeConnector) -> DlmsProtocol {
        let config = DlmsConfig::default()
            .with_hdlc(false)
            .with_read_timeout(Duration::from_millis(500));
        DlmsProtocol::new(
            "127.0.0.1",
            4059,
            Arc::new(config),
            Arc::new(SecuritySuite::no_security()),
            Arc::new(connector.clone()),
        )
    }

    #[tokio::test]
    async fn test_connect_get_close() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let mut protocol = protocol(&connector);

        assert!(protocol.connect().await);
        assert!(protocol.is_connected());

        let result = protocol.get(&CosemObject::ACTIVE_POWER_IMPORT).await;
        assert!(result.success, "{:?}", result);
        assert_eq!(result.value, Some(DataObject::Integer(4500)));

        protocol.close().await;
        assert!(!protocol.is_connected());
        assert_eq!(connector.request_tags(), vec![0x60, 0xC0, 0x62]);
    }

    #[tokio::test]
    async fn test_set_over_session() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let mut protocol = protocol(&connector);
        assert!(protocol.connect().await);

        let result = protocol.set(&CosemObject::RELAY_CONTROL, &DataObject::Integer(0)).await;
        assert!(result.success, "{:?}", result);
        protocol.close().await;
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let mut protocol = protocol(&connector);

        let result = protocol.get(&CosemObject::CLOCK).await;
        assert_eq!(result.error(), Some(NOT_CONNECTED));
        let result = protocol.set(&CosemObject::CLOCK, &DataObject::Null).await;
        assert_eq!(result.error(), Some(NOT_CONNECTED));
        assert_eq!(connector.connections(), 0);

        // closing a session that never opened is harmless
        protocol.close().await;
    }

    #[tokio::test]
    async fn test_access_level_is_enforced_locally() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let mut protocol = protocol(&connector);
        assert!(protocol.connect().await);

        let result = protocol
            .set(&CosemObject::ACTIVE_POWER_IMPORT, &DataObject::Integer(1))
            .await;
        assert!(!result.success);
        assert!(result.error().unwrap().contains("not writable"));

        protocol.close().await;
        // AARQ and RLRQ only
        assert_eq!(connector.request_tags(), vec![0x60, 0x62]);
    }

    #[tokio::test]
    async fn test_rejected_association_closes_session() {
        let connector = FakeConnector::new(MeterBehaviour::RejectAssociation);
        let mut protocol = protocol(&connector);

        assert!(!protocol.connect().await);
        assert!(!protocol.is_connected());
        assert_eq!(connector.request_tags(), vec![0x60]);

        let err = protocol.open().await.unwrap_err();
        assert!(matches!(err, DlmsError::Association(ref msg) if msg == CONNECT_FAILED));
    }

    #[tokio::test]
    async fn test_connector_failure() {
        let connector = FakeConnector::new(MeterBehaviour::RefuseConnection);
        let mut protocol = protocol(&connector);
        assert!(!protocol.connect().await);
        assert!(matches!(protocol.open().await, Err(DlmsError::Connect(_))));
    }
}
