//! Client configuration
//!
//! [`DlmsConfig`] is a plain serde struct; where it is loaded from is the
//! embedding application's business. Every field has a default, so a partial
//! document deserializes into a usable configuration.

use dlms_core::{DlmsError, DlmsResult};
use dlms_security::{parse_aes_key, parse_hex_key, SecuritySuite};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DlmsConfig {
    pub read_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_retries: u32,
    /// HDLC framing when true, TCP wrapper otherwise
    pub use_hdlc: bool,
    pub client_id: u16,
    pub server_lower_mac_address: u16,
    pub server_upper_mac_address: u16,
    /// Server wPort of the TCP wrapper
    pub logical_device: u16,
    /// Hex encoded
    pub authentication_key: Option<String>,
    /// Hex encoded, 16 or 32 bytes
    pub encryption_key: Option<String>,
    /// Hex encoded, 8 bytes
    pub system_title: Option<String>,
    pub use_high_level_security: bool,
    /// Largest APDU we offer to receive, see [`DlmsConfig::receive_pdu_size`]
    pub max_pdu_size: u16,
    pub window_size: u8,
    /// Largest HDLC information field accepted from the meter
    ///
    /// Frames are not segmented, so under HDLC a reply APDU must fit in one
    /// information field; longer replies are rejected.
    pub max_info_length: usize,
    pub association_timeout_ms: u64,
    pub release_timeout_ms: u64,
    pub frame_timeout_ms: u64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_ms: u64,
}

impl Default for DlmsConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 5000,
            connect_timeout_ms: 10000,
            max_retries: 3,
            use_hdlc: true,
            client_id: 1,
            server_lower_mac_address: 17,
            server_upper_mac_address: 0,
            logical_device: 1,
            authentication_key: None,
            encryption_key: None,
            system_title: None,
            use_high_level_security: false,
            max_pdu_size: 1024,
            window_size: 1,
            max_info_length: 128,
            association_timeout_ms: 120_000,
            release_timeout_ms: 5000,
            frame_timeout_ms: 1000,
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown_ms: 30_000,
        }
    }
}

impl DlmsConfig {
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_hdlc(mut self, use_hdlc: bool) -> Self {
        self.use_hdlc = use_hdlc;
        self
    }

    pub fn with_addresses(mut self, client_id: u16, server_lower_mac_address: u16) -> Self {
        self.client_id = client_id;
        self.server_lower_mac_address = server_lower_mac_address;
        self
    }

    pub fn with_logical_device(mut self, logical_device: u16) -> Self {
        self.logical_device = logical_device;
        self
    }

    pub fn with_authentication_key(mut self, key: impl Into<String>) -> Self {
        self.authentication_key = Some(key.into());
        self
    }

    /// Keys and title for authenticated encryption; enables high-level security
    pub fn with_high_level_security(
        mut self,
        authentication_key: impl Into<String>,
        encryption_key: impl Into<String>,
        system_title: impl Into<String>,
    ) -> Self {
        self.authentication_key = Some(authentication_key.into());
        self.encryption_key = Some(encryption_key.into());
        self.system_title = Some(system_title.into());
        self.use_high_level_security = true;
        self
    }

    pub fn with_max_pdu_size(mut self, max_pdu_size: u16) -> Self {
        self.max_pdu_size = max_pdu_size;
        self
    }

    pub fn with_max_info_length(mut self, max_info_length: usize) -> Self {
        self.max_info_length = max_info_length;
        self
    }

    pub fn with_circuit_breaker(mut self, threshold: u32, cooldown: Duration) -> Self {
        self.circuit_breaker_threshold = threshold;
        self.circuit_breaker_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn circuit_breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_cooldown_ms)
    }

    /// Max receive PDU size proposed in the AARQ
    ///
    /// Under HDLC the meter is held to one information field per reply.
    pub fn receive_pdu_size(&self) -> u16 {
        if self.use_hdlc {
            let info_length = u16::try_from(self.max_info_length).unwrap_or(u16::MAX);
            self.max_pdu_size.min(info_length)
        } else {
            self.max_pdu_size
        }
    }

    /// Reject values no session could work with, and malformed key material
    pub fn validate(&self) -> DlmsResult<()> {
        if self.read_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(DlmsError::Config("Timeouts must be positive".to_string()));
        }
        if self.max_pdu_size < 12 {
            return Err(DlmsError::Config(format!(
                "max_pdu_size too small: {}",
                self.max_pdu_size
            )));
        }
        if self.max_info_length == 0 {
            return Err(DlmsError::Config("max_info_length must be positive".to_string()));
        }
        if self.window_size == 0 {
            return Err(DlmsError::Config("window_size must be positive".to_string()));
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(DlmsError::Config(
                "circuit_breaker_threshold must be positive".to_string(),
            ));
        }
        self.security_suite().map(|_| ())
    }

    /// Security suite described by this configuration
    ///
    /// High-level security needs all three of authentication key, encryption
    /// key and system title. Otherwise an authentication key alone selects
    /// low-level security, and no key at all selects none.
    pub fn security_suite(&self) -> DlmsResult<SecuritySuite> {
        if self.use_high_level_security {
            let authentication_key = parse_hex_key(
                "authentication_key",
                required(&self.authentication_key, "authentication_key")?,
            )?;
            let encryption_key =
                parse_aes_key("encryption_key", required(&self.encryption_key, "encryption_key")?)?;
            let system_title =
                parse_hex_key("system_title", required(&self.system_title, "system_title")?)?;
            return SecuritySuite::high_level_security(&authentication_key, &encryption_key, &system_title);
        }

        match &self.authentication_key {
            Some(key) => Ok(SecuritySuite::low_level_security(&parse_hex_key(
                "authentication_key",
                key,
            )?)),
            None => Ok(SecuritySuite::no_security()),
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> DlmsResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| DlmsError::Config(format!("{} is required for high-level security", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlms_security::SecurityPolicy;

    #[test]
    fn test_defaults() {
        let config = DlmsConfig::default();
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert!(config.use_hdlc);
        assert_eq!(config.client_id, 1);
        assert_eq!(config.server_lower_mac_address, 17);
        assert_eq!(config.max_pdu_size, 1024);
        assert_eq!(config.max_info_length, 128);
        assert_eq!(config.circuit_breaker_threshold, 5);
        assert_eq!(config.circuit_breaker_cooldown(), Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_security_suite_selection() {
        let none = DlmsConfig::default().security_suite().unwrap();
        assert_eq!(none.policy(), SecurityPolicy::None);

        let lls = DlmsConfig::default()
            .with_authentication_key("3132333435363738")
            .security_suite()
            .unwrap();
        assert_eq!(lls.policy(), SecurityPolicy::Authentication);
        assert_eq!(lls.authentication_key(), b"12345678".to_vec());

        let hls = DlmsConfig::default()
            .with_high_level_security("D0".repeat(16), "00".repeat(16), "4845533030303031")
            .security_suite()
            .unwrap();
        assert_eq!(hls.policy(), SecurityPolicy::AuthenticationEncryption);
        assert_eq!(hls.system_title().as_bytes(), b"HES00001");
    }

    #[test]
    fn test_invalid_key_material_is_config_error() {
        let bad_hex = DlmsConfig::default().with_authentication_key("zz");
        assert!(matches!(bad_hex.validate(), Err(DlmsError::Config(_))));

        let short_title = DlmsConfig::default().with_high_level_security("D0".repeat(16), "00".repeat(16), "0102");
        assert!(matches!(short_title.security_suite(), Err(DlmsError::Config(_))));

        let mut missing = DlmsConfig::default();
        missing.use_high_level_security = true;
        let err = missing.security_suite().unwrap_err();
        assert!(err.to_string().contains("authentication_key is required"));
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        assert!(DlmsConfig::default().with_read_timeout(Duration::ZERO).validate().is_err());
        assert!(DlmsConfig::default().with_max_pdu_size(4).validate().is_err());
        assert!(DlmsConfig::default()
            .with_circuit_breaker(0, Duration::from_secs(1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_receive_pdu_size_fits_one_hdlc_frame() {
        let config = DlmsConfig::default();
        assert_eq!(config.receive_pdu_size(), 128);
        assert_eq!(config.clone().with_max_info_length(2048).receive_pdu_size(), 1024);
        assert_eq!(config.with_hdlc(false).receive_pdu_size(), 1024);
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: DlmsConfig = serde_json::from_str(r#"{"use_hdlc": false, "max_retries": 1}"#).unwrap();
        assert!(!config.use_hdlc);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.read_timeout_ms, 5000);
    }
}
