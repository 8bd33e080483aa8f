//! Association context for DLMS/COSEM connections
//!
//! Holds what the client proposes in the AARQ and what the meter agreed to in
//! the AARE.

use crate::pdu::{Conformance, InitiateRequest, InitiateResponse};
use dlms_security::SystemTitle;

/// Default client maximum receive PDU size
pub const DEFAULT_MAX_PDU_SIZE: u16 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationState {
    #[default]
    Inactive,
    /// AARQ sent, AARE not yet accepted
    AssociationPending,
    Associated,
}

/// Negotiated protocol parameters from the InitiateRequest/Response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParameters {
    pub dlms_version: u8,
    pub conformance: Conformance,
    pub client_max_receive_pdu_size: u16,
    pub server_max_receive_pdu_size: u16,
}

impl NegotiatedParameters {
    pub fn from_initiate(request: &InitiateRequest, response: &InitiateResponse) -> Self {
        Self {
            dlms_version: response.negotiated_dlms_version_number,
            conformance: response.negotiated_conformance,
            client_max_receive_pdu_size: request.client_max_receive_pdu_size,
            server_max_receive_pdu_size: response.server_max_receive_pdu_size,
        }
    }

    /// Largest PDU either side accepts
    pub fn negotiated_pdu_size(&self) -> u16 {
        self.client_max_receive_pdu_size
            .min(self.server_max_receive_pdu_size)
    }
}

/// Association context
#[derive(Debug, Clone)]
pub struct AssociationContext {
    pub state: AssociationState,

    /// Conformance proposed in the InitiateRequest
    pub proposed_conformance: Conformance,

    /// Client maximum receive PDU size proposed in the InitiateRequest
    pub max_pdu_size: u16,

    /// Meter system title from the AARE, keying the IVs of its replies
    pub remote_title: Option<SystemTitle>,

    pub negotiated_params: Option<NegotiatedParameters>,
}

impl AssociationContext {
    pub fn new(proposed_conformance: Conformance, max_pdu_size: u16) -> Self {
        Self {
            state: AssociationState::Inactive,
            proposed_conformance,
            max_pdu_size,
            remote_title: None,
            negotiated_params: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Conformance::TYPICAL_CLIENT_LN, DEFAULT_MAX_PDU_SIZE)
    }

    pub fn with_max_pdu_size(mut self, max_pdu_size: u16) -> Self {
        self.max_pdu_size = max_pdu_size;
        self
    }

    pub fn initiate_request(&self) -> InitiateRequest {
        InitiateRequest::new(self.proposed_conformance, self.max_pdu_size)
    }

    pub fn is_active(&self) -> bool {
        self.state == AssociationState::Associated
    }

    pub fn transition_to(&mut self, state: AssociationState) {
        self.state = state;
    }

    /// Record the meter's answer and enter `Associated`
    pub fn accept(&mut self, response: &InitiateResponse, remote_title: SystemTitle) {
        self.negotiated_params = Some(NegotiatedParameters::from_initiate(
            &self.initiate_request(),
            response,
        ));
        self.remote_title = Some(remote_title);
        self.state = AssociationState::Associated;
    }

    /// Forget everything negotiated and return to `Inactive`
    pub fn reset(&mut self) {
        self.state = AssociationState::Inactive;
        self.remote_title = None;
        self.negotiated_params = None;
    }

    pub fn negotiated_params(&self) -> Option<&NegotiatedParameters> {
        self.negotiated_params.as_ref()
    }

    /// Negotiated PDU size, or the proposed one before negotiation
    pub fn pdu_size(&self) -> u16 {
        self.negotiated_params
            .as_ref()
            .map(|p| p.negotiated_pdu_size())
            .unwrap_or(self.max_pdu_size)
    }

    /// False until negotiated, then whether the meter granted `feature`
    pub fn supports(&self, feature: Conformance) -> bool {
        self.negotiated_params
            .as_ref()
            .map(|p| p.conformance.contains(feature))
            .unwrap_or(false)
    }

    pub fn supports_get(&self) -> bool {
        self.supports(Conformance::GET)
    }

    pub fn supports_set(&self) -> bool {
        self.supports(Conformance::SET)
    }

    pub fn supports_selective_access(&self) -> bool {
        self.supports(Conformance::SELECTIVE_ACCESS)
    }
}

impl Default for AssociationContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}
