//! Association module for DLMS/COSEM connections
//!
//! [`CosemAssociation`] drives COSEM-OPEN and COSEM-RELEASE over a
//! [`Transport`] and carries Get/Set requests while associated.
//!
//! ```text
//!   associate()                         release()
//!  (AARQ sent)                         (RLRQ sent)
//! Inactive -> AssociationPending -> Associated -> Inactive
//! ```
//!
//! Operations never return `Err`: every outcome, including "Not associated",
//! is folded into an [`OperationResult`].

pub mod context;
pub mod result;

pub use context::{AssociationContext, AssociationState, NegotiatedParameters, DEFAULT_MAX_PDU_SIZE};
pub use result::OperationResult;

use crate::encrypted::{protect, unprotect};
use crate::pdu::{
    ConfirmedServiceError, ExceptionResponse, InitiateResponse, CONFIRMED_SERVICE_ERROR_TAG,
    EXCEPTION_RESPONSE_TAG, INVOKE_ID_AND_PRIORITY,
};
use crate::service::{GetResponseNormal, GetService, SetResponseNormal, SetService};
use dlms_asn1::iso_acse::{
    APPLICATION_CONTEXT_LN, APPLICATION_CONTEXT_LN_CIPHERED, MECHANISM_HIGH_LEVEL_GMAC,
    MECHANISM_LOW_LEVEL,
};
use dlms_asn1::{AARQApdu, AAREApdu, RLRQApdu};
use dlms_core::{CosemObject, DataObject, DlmsError, DlmsResult};
use dlms_security::{generate_challenge, SecurityPolicy, SecuritySuite, SystemTitle};
use dlms_session::Transport;
use std::fmt;
use std::sync::Arc;

/// DLMS/COSEM Application Association
pub struct CosemAssociation {
    transport: Box<dyn Transport>,
    security: Arc<SecuritySuite>,
    context: AssociationContext,
}

impl CosemAssociation {
    pub fn new(transport: Box<dyn Transport>, security: Arc<SecuritySuite>) -> Self {
        Self::with_context(transport, security, AssociationContext::with_defaults())
    }

    pub fn with_context(
        transport: Box<dyn Transport>,
        security: Arc<SecuritySuite>,
        context: AssociationContext,
    ) -> Self {
        Self {
            transport,
            security,
            context,
        }
    }

    pub fn context(&self) -> &AssociationContext {
        &self.context
    }

    pub fn security(&self) -> &Arc<SecuritySuite> {
        &self.security
    }

    pub fn is_associated(&self) -> bool {
        self.context.is_active()
    }

    /// The link underneath, e.g. to disconnect it once released
    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    /// COSEM-OPEN: send the AARQ and check the AARE
    ///
    /// Returns `false` on any failure; the reason is logged.
    pub async fn associate(&mut self) -> bool {
        self.context.transition_to(AssociationState::AssociationPending);
        match self.try_associate().await {
            Ok(()) => {
                log::info!(
                    "COSEM association established (conformance {}, max PDU {})",
                    self.context
                        .negotiated_params()
                        .map(|p| p.conformance.to_string())
                        .unwrap_or_default(),
                    self.context.pdu_size()
                );
                true
            }
            Err(e) => {
                log::error!("Failed to establish COSEM association: {}", e);
                self.context.reset();
                false
            }
        }
    }

    /// COSEM-RELEASE: best effort, errors are logged and swallowed
    pub async fn release(&mut self) {
        if !self.is_associated() {
            return;
        }
        let outcome = match RLRQApdu.encode() {
            Ok(rlrq) => self.send_counted(&rlrq).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            log::error!("Error during COSEM release: {}", e);
        }
        self.context.reset();
    }

    pub async fn get(&mut self, object: &CosemObject) -> OperationResult {
        if !self.is_associated() {
            return OperationResult::failure("Not associated");
        }
        match self.try_get(object).await {
            Ok(value) => OperationResult::success(Some(value)),
            Err(e) => {
                log::debug!("Get {} failed: {}", object, e);
                OperationResult::from(e)
            }
        }
    }

    pub async fn set(&mut self, object: &CosemObject, value: &DataObject) -> OperationResult {
        if !self.is_associated() {
            return OperationResult::failure("Not associated");
        }
        match self.try_set(object, value).await {
            Ok(()) => OperationResult::success(None),
            Err(e) => {
                log::debug!("Set {} failed: {}", object, e);
                OperationResult::from(e)
            }
        }
    }

    fn build_aarq(&self) -> DlmsResult<Vec<u8>> {
        let policy = self.security.policy();
        let context_name = if policy.is_encrypted() {
            &APPLICATION_CONTEXT_LN_CIPHERED
        } else {
            &APPLICATION_CONTEXT_LN
        };
        let mut aarq = AARQApdu::new(context_name);

        match policy {
            SecurityPolicy::None => {}
            SecurityPolicy::Authentication => {
                aarq.mechanism_name = Some(MECHANISM_LOW_LEVEL.to_vec());
                aarq.calling_authentication_value = Some(self.security.authentication_key());
            }
            SecurityPolicy::Encryption => {
                aarq.calling_ap_title = Some(self.security.system_title().as_bytes().to_vec());
            }
            SecurityPolicy::AuthenticationEncryption => {
                aarq.calling_ap_title = Some(self.security.system_title().as_bytes().to_vec());
                aarq.mechanism_name = Some(MECHANISM_HIGH_LEVEL_GMAC.to_vec());
                aarq.calling_authentication_value = Some(generate_challenge());
            }
        }

        let initiate = self.context.initiate_request().encode();
        aarq.user_information = Some(protect(&self.security, &initiate)?);
        aarq.encode()
    }

    async fn try_associate(&mut self) -> DlmsResult<()> {
        let aarq = self.build_aarq()?;
        let reply = self.send_counted(&aarq).await?;
        let aare = AAREApdu::decode(&reply)?;

        if !aare.is_accepted() {
            return Err(DlmsError::Association(format!(
                "Association rejected: {:?}, diagnostic {:?}",
                aare.result, aare.diagnostic
            )));
        }

        let server_title = match &aare.responding_ap_title {
            Some(title) => SystemTitle::from_slice(title)
                .map_err(|_| DlmsError::Association(format!("Invalid responding AP title: {:02X?}", title)))?,
            None => self.security.system_title(),
        };

        let user_information = aare
            .user_information
            .ok_or_else(|| DlmsError::Association("AARE without user information".to_string()))?;
        if user_information.first() == Some(&CONFIRMED_SERVICE_ERROR_TAG) {
            let error = ConfirmedServiceError::decode(&user_information)?;
            return Err(DlmsError::Association(error.to_string()));
        }
        let initiate = unprotect(&self.security, &server_title, &user_information)?;
        let response = InitiateResponse::decode(&initiate)?;

        self.context.accept(&response, server_title);
        Ok(())
    }

    async fn try_get(&mut self, object: &CosemObject) -> DlmsResult<DataObject> {
        let request = GetService::create_request(object).encode();
        let reply = self.exchange(&request).await?;
        let response = GetResponseNormal::decode(&reply)?;
        check_invoke_id(response.invoke_id_and_priority)?;
        GetService::process_response(&response)
    }

    async fn try_set(&mut self, object: &CosemObject, value: &DataObject) -> DlmsResult<()> {
        let request = SetService::create_request(object, value.clone()).encode()?;
        let reply = self.exchange(&request).await?;
        let response = SetResponseNormal::decode(&reply)?;
        check_invoke_id(response.invoke_id_and_priority)?;
        SetService::process_response(&response)
    }

    /// Send one APDU as a secured exchange
    ///
    /// Ciphered APDUs already reserved their frame counter in `protect`.
    /// Under authentication only, the counter advances before the send.
    async fn send_counted(&mut self, apdu: &[u8]) -> DlmsResult<Vec<u8>> {
        let policy = self.security.policy();
        if policy != SecurityPolicy::None && !policy.is_encrypted() {
            self.security.increment_frame_counter();
        }
        self.transport.send(apdu).await
    }

    /// Cipher, send, decipher; an exception response becomes an error
    async fn exchange(&mut self, apdu: &[u8]) -> DlmsResult<Vec<u8>> {
        let request = protect(&self.security, apdu)?;
        let reply = self.send_counted(&request).await?;

        let server_title = self
            .context
            .remote_title
            .unwrap_or_else(|| self.security.system_title());
        let plain = unprotect(&self.security, &server_title, &reply)?;
        if plain.first() == Some(&EXCEPTION_RESPONSE_TAG) {
            return Err(ExceptionResponse::decode(&plain)?.into());
        }
        Ok(plain)
    }
}

fn check_invoke_id(invoke_id_and_priority: u8) -> DlmsResult<()> {
    if invoke_id_and_priority != INVOKE_ID_AND_PRIORITY {
        return Err(DlmsError::Protocol(format!(
            "Invoke id mismatch: expected 0x{:02X}, got 0x{:02X}",
            INVOKE_ID_AND_PRIORITY, invoke_id_and_priority
        )));
    }
    Ok(())
}

impl fmt::Debug for CosemAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosemAssociation")
            .field("state", &self.context.state)
            .field("security", &self.security)
            .finish()
    }
}
