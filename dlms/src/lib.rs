//! DLMS/COSEM head-end client engine
//!
//! Reads and writes COSEM attributes on electricity meters over TCP, with
//! HDLC or TCP-wrapper framing, ACSE association and optional xDLMS
//! authentication and ciphering.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dlms-core`: Core types and error handling
//! - `dlms-asn1`: A-XDR and BER encoding/decoding, ACSE APDUs
//! - `dlms-transport`: Transport layer (TCP streams)
//! - `dlms-session`: Session layer (HDLC, Wrapper)
//! - `dlms-security`: Security layer (encryption, authentication)
//! - `dlms-application`: Application layer (association, Get/Set)
//! - `dlms-client`: Sessions, transactions, resilient communication service
//!
//! # Usage
//!
//! ```no_run
//! use dlms::client::{DlmsConfig, MeterCommunicationService};
//! use dlms::CosemObject;
//!
//! # async fn run() -> dlms::DlmsResult<()> {
//! let service = MeterCommunicationService::new(DlmsConfig::default().with_hdlc(false))?;
//! let handle = service.read("192.168.1.100", 4059, CosemObject::ACTIVE_POWER_IMPORT);
//! if let Ok(result) = handle.await {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use dlms_core::{AccessLevel, CosemObject, DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};
pub use dlms_application::OperationResult;

// Re-export client API
pub mod client {
    pub use dlms_client::*;
}

pub mod security {
    pub use dlms_security::{SecurityPolicy, SecuritySuite, SecurityVersion, SystemTitle};
}

pub mod codec {
    pub use dlms_asn1::{AxdrDecoder, AxdrEncoder};
}

pub mod transport {
    pub use dlms_transport::{StreamAccessor, TcpSettings, TcpTransport};
}

pub mod session {
    pub use dlms_session::{HdlcParameters, HdlcTransport, TcpWrapperTransport, Transport};
}

pub mod application {
    pub use dlms_application::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_reachable_from_facade() {
        let object = CosemObject::by_name("active_power_import").unwrap();
        assert_eq!(object, CosemObject::ACTIVE_POWER_IMPORT);
        assert_eq!(object.obis_code(), "1.0.1.7.0.255".parse::<ObisCode>().unwrap());
        assert!(object.access_level().can_read());
        assert!(!object.access_level().can_write());
    }

    #[test]
    fn test_default_client_config() {
        let config = client::DlmsConfig::default();
        assert!(config.use_hdlc);
        let suite = config.security_suite().unwrap();
        assert_eq!(suite.policy(), security::SecurityPolicy::None);
    }
}
