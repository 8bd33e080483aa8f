//! Security suite configuration for DLMS/COSEM

use crate::authentication::HmacAuth;
use crate::encryption::{AesGcmEncryption, SecurityControl};
use crate::xdlms::{build_iv, FrameCounter, SystemTitle};
use dlms_core::{DlmsError, DlmsResult};
use std::fmt;

/// Security policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    /// No encryption and authentication
    None,
    /// All messages to be authenticated
    Authentication,
    /// All messages to be encrypted
    Encryption,
    /// All messages to be authenticated and encrypted
    AuthenticationEncryption,
}

impl SecurityPolicy {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SecurityPolicy::Authentication | SecurityPolicy::AuthenticationEncryption)
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, SecurityPolicy::Encryption | SecurityPolicy::AuthenticationEncryption)
    }
}

/// Security suite version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityVersion {
    None,
    V1,
    V2,
}

/// Builder for [`SecuritySuite`]
#[derive(Debug, Clone)]
pub struct SecuritySuiteBuilder {
    policy: SecurityPolicy,
    version: Option<SecurityVersion>,
    authentication_key: Vec<u8>,
    encryption_key: Vec<u8>,
    system_title: SystemTitle,
    frame_counter: u32,
}

impl SecuritySuiteBuilder {
    pub fn new() -> Self {
        Self {
            policy: SecurityPolicy::None,
            version: None,
            authentication_key: Vec::new(),
            encryption_key: Vec::new(),
            system_title: SystemTitle::default(),
            frame_counter: 0,
        }
    }

    pub fn set_security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_security_version(mut self, version: SecurityVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn set_authentication_key(mut self, key: &[u8]) -> Self {
        self.authentication_key = key.to_vec();
        self
    }

    pub fn set_encryption_key(mut self, key: &[u8]) -> Self {
        self.encryption_key = key.to_vec();
        self
    }

    pub fn set_system_title(mut self, system_title: SystemTitle) -> Self {
        self.system_title = system_title;
        self
    }

    /// Resume from a persisted frame counter
    pub fn set_frame_counter(mut self, frame_counter: u32) -> Self {
        self.frame_counter = frame_counter;
        self
    }

    /// Build the suite, validating key material against the policy
    pub fn build(self) -> DlmsResult<SecuritySuite> {
        let cipher = if self.policy.is_encrypted() {
            Some(AesGcmEncryption::new(&self.encryption_key)?)
        } else {
            None
        };
        if self.policy == SecurityPolicy::AuthenticationEncryption && self.authentication_key.is_empty() {
            return Err(DlmsError::Config(
                "Authenticated encryption requires an authentication key".to_string(),
            ));
        }

        let version = self.version.unwrap_or(match self.policy {
            SecurityPolicy::None => SecurityVersion::None,
            SecurityPolicy::Authentication => SecurityVersion::V1,
            SecurityPolicy::Encryption | SecurityPolicy::AuthenticationEncryption => SecurityVersion::V2,
        });

        Ok(SecuritySuite {
            policy: self.policy,
            version,
            auth: HmacAuth::new(&self.authentication_key),
            authentication_key: self.authentication_key,
            encryption_key: self.encryption_key,
            cipher,
            system_title: self.system_title,
            frame_counter: FrameCounter::with_initial(self.frame_counter),
        })
    }
}

impl Default for SecuritySuiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Security suite: policy, key material, system title and frame counter
///
/// Keys are copied in at construction and only handed out as copies. The
/// frame counter is the single piece of mutable state: ciphering reserves a
/// value with [`SecuritySuite::next_frame_counter`], other secured exchanges
/// call [`SecuritySuite::increment_frame_counter`].
pub struct SecuritySuite {
    policy: SecurityPolicy,
    version: SecurityVersion,
    authentication_key: Vec<u8>,
    encryption_key: Vec<u8>,
    auth: HmacAuth,
    cipher: Option<AesGcmEncryption>,
    system_title: SystemTitle,
    frame_counter: FrameCounter,
}

impl SecuritySuite {
    pub fn builder() -> SecuritySuiteBuilder {
        SecuritySuiteBuilder::new()
    }

    /// Suite with no authentication and no encryption
    pub fn no_security() -> Self {
        SecuritySuite {
            policy: SecurityPolicy::None,
            version: SecurityVersion::None,
            authentication_key: Vec::new(),
            encryption_key: Vec::new(),
            auth: HmacAuth::new(&[]),
            cipher: None,
            system_title: SystemTitle::default(),
            frame_counter: FrameCounter::new(),
        }
    }

    /// Password-style authentication with the given key, no encryption
    pub fn low_level_security(authentication_key: &[u8]) -> Self {
        SecuritySuite {
            policy: SecurityPolicy::Authentication,
            version: SecurityVersion::V1,
            authentication_key: authentication_key.to_vec(),
            encryption_key: Vec::new(),
            auth: HmacAuth::new(authentication_key),
            cipher: None,
            system_title: SystemTitle::default(),
            frame_counter: FrameCounter::new(),
        }
    }

    /// Authenticated encryption with AES-GCM
    pub fn high_level_security(
        authentication_key: &[u8],
        encryption_key: &[u8],
        system_title: &[u8],
    ) -> DlmsResult<Self> {
        Self::builder()
            .set_security_policy(SecurityPolicy::AuthenticationEncryption)
            .set_security_version(SecurityVersion::V2)
            .set_authentication_key(authentication_key)
            .set_encryption_key(encryption_key)
            .set_system_title(SystemTitle::from_slice(system_title)?)
            .build()
    }

    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    pub fn version(&self) -> SecurityVersion {
        self.version
    }

    pub fn authentication_key(&self) -> Vec<u8> {
        self.authentication_key.clone()
    }

    pub fn encryption_key(&self) -> Vec<u8> {
        self.encryption_key.clone()
    }

    pub fn system_title(&self) -> SystemTitle {
        self.system_title
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter.get()
    }

    /// Reserve a frame counter value for one ciphered APDU
    ///
    /// Returns the value to put in the IV; no other caller sharing this suite
    /// gets it until the counter wraps.
    pub fn next_frame_counter(&self) -> u32 {
        self.frame_counter.next()
    }

    /// Big-endian increment with carry, wrapping at 2^32
    pub fn increment_frame_counter(&self) -> u32 {
        self.frame_counter.increment()
    }

    /// Security-control byte describing this suite's protection
    pub fn security_control(&self) -> SecurityControl {
        let suite_id = self.cipher.as_ref().map(|c| c.suite_id()).unwrap_or(0);
        SecurityControl::new(suite_id, self.policy.is_authenticated(), self.policy.is_encrypted())
    }

    /// Additional authenticated data: `SC ‖ AK` when authenticating, empty otherwise
    fn aad(&self, security_control: SecurityControl) -> Vec<u8> {
        if security_control.is_authenticated() {
            let mut aad = Vec::with_capacity(1 + self.authentication_key.len());
            aad.push(security_control.to_byte());
            aad.extend_from_slice(&self.authentication_key);
            aad
        } else {
            Vec::new()
        }
    }

    /// Authentication tag for `data`; identity when the policy is `None`
    pub fn authenticate(&self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        if self.policy == SecurityPolicy::None {
            return Ok(data.to_vec());
        }
        self.auth.tag(data)
    }

    /// Verify a tag produced by [`SecuritySuite::authenticate`]
    pub fn verify(&self, data: &[u8], tag: &[u8]) -> DlmsResult<()> {
        if self.policy == SecurityPolicy::None {
            return if data == tag {
                Ok(())
            } else {
                Err(DlmsError::Security("Authentication tag mismatch".to_string()))
            };
        }
        self.auth.verify(data, tag)
    }

    /// Encrypt under the current frame counter
    pub fn encrypt(&self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        self.encrypt_with(self.frame_counter(), data)
    }

    /// Encrypt under an explicit frame counter value
    pub fn encrypt_with(&self, frame_counter: u32, data: &[u8]) -> DlmsResult<Vec<u8>> {
        match &self.cipher {
            None => Ok(data.to_vec()),
            Some(cipher) => {
                let iv = build_iv(&self.system_title, frame_counter);
                cipher.encrypt(&iv, data, &self.aad(self.security_control()))
            }
        }
    }

    /// Decrypt data this suite encrypted under the current frame counter
    pub fn decrypt(&self, data: &[u8]) -> DlmsResult<Vec<u8>> {
        self.decrypt_from(&self.system_title, self.frame_counter(), data)
    }

    /// Decrypt a peer's data using the peer's system title and frame counter
    pub fn decrypt_from(
        &self,
        system_title: &SystemTitle,
        frame_counter: u32,
        data: &[u8],
    ) -> DlmsResult<Vec<u8>> {
        match &self.cipher {
            None => Ok(data.to_vec()),
            Some(cipher) => {
                let iv = build_iv(system_title, frame_counter);
                cipher.decrypt(&iv, data, &self.aad(self.security_control()))
            }
        }
    }
}

impl fmt::Debug for SecuritySuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecuritySuite")
            .field("policy", &self.policy)
            .field("version", &self.version)
            .field("system_title", &self.system_title)
            .field("frame_counter", &self.frame_counter.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SecuritySuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SecuritySuite(policy={:?}, version={:?}, system_title={})",
            self.policy, self.version, self.system_title
        )
    }
}
