//! PDU (Protocol Data Unit) handling for DLMS/COSEM application layer
//!
//! xDLMS APDUs carried inside an association: the InitiateRequest/Response
//! pair negotiated in the AARQ/AARE user-information field, the attribute
//! descriptor shared by Get and Set, and the error APDUs a meter may send back.
//! All encodings are A-XDR.

use dlms_asn1::{AxdrDecoder, AxdrEncoder, AxdrTag};
use dlms_core::{CosemObject, DlmsError, DlmsResult, ObisCode};
use std::fmt;
use std::ops::BitAnd;

/// DLMS protocol version number
pub const DLMS_VERSION_6: u8 = 6;

/// Invoke id 1, confirmed service class, high priority
pub const INVOKE_ID_AND_PRIORITY: u8 = 0xC1;

pub const INITIATE_REQUEST_TAG: u8 = 0x01;
pub const INITIATE_RESPONSE_TAG: u8 = 0x08;
pub const CONFIRMED_SERVICE_ERROR_TAG: u8 = 0x0E;
pub const GET_REQUEST_TAG: u8 = 0xC0;
pub const SET_REQUEST_TAG: u8 = 0xC1;
pub const GET_RESPONSE_TAG: u8 = 0xC4;
pub const SET_RESPONSE_TAG: u8 = 0xC5;
pub const EXCEPTION_RESPONSE_TAG: u8 = 0xD8;

/// Choice value of the `-Normal` request/response variants
pub const NORMAL_CHOICE: u8 = 0x01;

/// Tag and length prefix of the 24-bit conformance bit string
const CONFORMANCE_PREFIX: [u8; 4] = [0x5F, 0x1F, 0x04, 0x00];

/// VAA name of a logical-name referencing association
const VAA_NAME_LN: u16 = 0x0007;

/// Conformance block: the 24 service flags negotiated at association time
///
/// Bit constants follow the on-wire bit string order, so bit 0 of the
/// Green Book numbering is the most significant bit of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Conformance {
    bits: u32,
}

impl Conformance {
    pub const GENERAL_PROTECTION: Self = Self::bit(1);
    pub const GENERAL_BLOCK_TRANSFER: Self = Self::bit(2);
    pub const ATTRIBUTE_0_SUPPORTED_WITH_SET: Self = Self::bit(8);
    pub const PRIORITY_MGMT_SUPPORTED: Self = Self::bit(9);
    pub const ATTRIBUTE_0_SUPPORTED_WITH_GET: Self = Self::bit(10);
    pub const BLOCK_TRANSFER_WITH_GET_OR_READ: Self = Self::bit(11);
    pub const BLOCK_TRANSFER_WITH_SET_OR_WRITE: Self = Self::bit(12);
    pub const BLOCK_TRANSFER_WITH_ACTION: Self = Self::bit(13);
    pub const MULTIPLE_REFERENCES: Self = Self::bit(14);
    pub const DATA_NOTIFICATION: Self = Self::bit(16);
    pub const ACCESS: Self = Self::bit(17);
    pub const GET: Self = Self::bit(19);
    pub const SET: Self = Self::bit(20);
    pub const SELECTIVE_ACCESS: Self = Self::bit(21);
    pub const EVENT_NOTIFICATION: Self = Self::bit(22);
    pub const ACTION: Self = Self::bit(23);

    /// What a logical-name client proposes by default
    pub const TYPICAL_CLIENT_LN: Self = Self { bits: 0x007E1F };

    const fn bit(n: u32) -> Self {
        Self { bits: 1 << (23 - n) }
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self { bits: bits & 0x00FF_FFFF }
    }

    pub const fn bits(&self) -> u32 {
        self.bits
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::from_bits(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        let [_, a, b, c] = self.bits.to_be_bytes();
        [a, b, c]
    }

    pub fn contains(&self, other: Conformance) -> bool {
        self.bits & other.bits == other.bits
    }

    pub fn with(self, other: Conformance) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

impl BitAnd for Conformance {
    type Output = Conformance;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits & rhs.bits,
        }
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X}", self.bits)
    }
}

fn encode_conformance(encoder: &mut AxdrEncoder, conformance: Conformance) {
    encoder.encode_bytes(&CONFORMANCE_PREFIX);
    encoder.encode_bytes(&conformance.to_bytes());
}

fn decode_conformance(decoder: &mut AxdrDecoder<'_>) -> DlmsResult<Conformance> {
    let prefix = decoder.decode_fixed_bytes(CONFORMANCE_PREFIX.len())?;
    if prefix != CONFORMANCE_PREFIX {
        return Err(DlmsError::Format(format!(
            "Invalid conformance block header: {:02X?}",
            prefix
        )));
    }
    let bytes = decoder.decode_fixed_bytes(3)?;
    Ok(Conformance::from_bytes([bytes[0], bytes[1], bytes[2]]))
}

pub(crate) fn expect_tag(decoder: &mut AxdrDecoder<'_>, expected: u8, name: &str) -> DlmsResult<()> {
    let tag = decoder.decode_u8()?;
    if tag != expected {
        return Err(DlmsError::Protocol(format!(
            "Expected {} (0x{:02X}), got 0x{:02X}",
            name, expected, tag
        )));
    }
    Ok(())
}

pub(crate) fn expect_end(decoder: &AxdrDecoder<'_>, name: &str) -> DlmsResult<()> {
    if decoder.remaining() != 0 {
        return Err(DlmsError::Format(format!(
            "{} has {} trailing bytes",
            name,
            decoder.remaining()
        )));
    }
    Ok(())
}

/// xDLMS InitiateRequest, carried in the AARQ user-information field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiateRequest {
    pub proposed_dlms_version_number: u8,
    pub proposed_conformance: Conformance,
    pub client_max_receive_pdu_size: u16,
}

impl InitiateRequest {
    pub fn new(conformance: Conformance, max_pdu_size: u16) -> Self {
        Self {
            proposed_dlms_version_number: DLMS_VERSION_6,
            proposed_conformance: conformance,
            client_max_receive_pdu_size: max_pdu_size,
        }
    }

    /// `01 00 00 00 06 5F 1F 04 00 <conformance:3> <max-pdu:2>`
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = AxdrEncoder::with_capacity(14);
        encoder.encode_u8(INITIATE_REQUEST_TAG);
        encoder.encode_u8(0x00); // dedicated-key absent
        encoder.encode_u8(0x00); // response-allowed, default TRUE
        encoder.encode_u8(0x00); // proposed-quality-of-service absent
        encoder.encode_u8(self.proposed_dlms_version_number);
        encode_conformance(&mut encoder, self.proposed_conformance);
        encoder.encode_u16(self.client_max_receive_pdu_size);
        encoder.into_bytes()
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, INITIATE_REQUEST_TAG, "InitiateRequest")?;
        if decoder.decode_u8()? != 0 {
            let key = decoder.decode_octet_string()?;
            log::debug!("Ignoring {}-byte dedicated key", key.len());
        }
        if decoder.decode_u8()? != 0 {
            decoder.decode_u8()?;
        }
        if decoder.decode_u8()? != 0 {
            decoder.decode_u8()?;
        }
        let proposed_dlms_version_number = decoder.decode_u8()?;
        let proposed_conformance = decode_conformance(&mut decoder)?;
        let client_max_receive_pdu_size = decoder.decode_u16()?;
        expect_end(&decoder, "InitiateRequest")?;
        Ok(Self {
            proposed_dlms_version_number,
            proposed_conformance,
            client_max_receive_pdu_size,
        })
    }
}

/// xDLMS InitiateResponse, carried in the AARE user-information field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiateResponse {
    pub negotiated_dlms_version_number: u8,
    pub negotiated_conformance: Conformance,
    pub server_max_receive_pdu_size: u16,
    pub vaa_name: u16,
}

impl InitiateResponse {
    pub fn new(conformance: Conformance, max_pdu_size: u16) -> Self {
        Self {
            negotiated_dlms_version_number: DLMS_VERSION_6,
            negotiated_conformance: conformance,
            server_max_receive_pdu_size: max_pdu_size,
            vaa_name: VAA_NAME_LN,
        }
    }

    /// `08 00 06 5F 1F 04 00 <conformance:3> <max-pdu:2> 00 07`
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = AxdrEncoder::with_capacity(14);
        encoder.encode_u8(INITIATE_RESPONSE_TAG);
        encoder.encode_u8(0x00); // negotiated-quality-of-service absent
        encoder.encode_u8(self.negotiated_dlms_version_number);
        encode_conformance(&mut encoder, self.negotiated_conformance);
        encoder.encode_u16(self.server_max_receive_pdu_size);
        encoder.encode_u16(self.vaa_name);
        encoder.into_bytes()
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, INITIATE_RESPONSE_TAG, "InitiateResponse")?;
        if decoder.decode_u8()? != 0 {
            decoder.decode_u8()?;
        }
        let negotiated_dlms_version_number = decoder.decode_u8()?;
        let negotiated_conformance = decode_conformance(&mut decoder)?;
        let server_max_receive_pdu_size = decoder.decode_u16()?;
        let vaa_name = decoder.decode_u16()?;
        expect_end(&decoder, "InitiateResponse")?;
        Ok(Self {
            negotiated_dlms_version_number,
            negotiated_conformance,
            server_max_receive_pdu_size,
            vaa_name,
        })
    }
}

/// ConfirmedServiceError, sent instead of an InitiateResponse on refusal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedServiceError {
    /// Service that failed (1 = initiate-error)
    pub service: u8,
    /// ServiceError choice (6 = initiate)
    pub error_class: u8,
    pub error_value: u8,
}

impl ConfirmedServiceError {
    pub fn encode(&self) -> Vec<u8> {
        vec![CONFIRMED_SERVICE_ERROR_TAG, self.service, self.error_class, self.error_value]
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, CONFIRMED_SERVICE_ERROR_TAG, "ConfirmedServiceError")?;
        Ok(Self {
            service: decoder.decode_u8()?,
            error_class: decoder.decode_u8()?,
            error_value: decoder.decode_u8()?,
        })
    }
}

impl fmt::Display for ConfirmedServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfirmedServiceError(service={}, class={}, value={})",
            self.service, self.error_class, self.error_value
        )
    }
}

/// ExceptionResponse: the meter could not process the request at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub state_error: u8,
    pub service_error: u8,
}

impl ExceptionResponse {
    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, EXCEPTION_RESPONSE_TAG, "ExceptionResponse")?;
        Ok(Self {
            state_error: decoder.decode_u8()?,
            service_error: decoder.decode_u8()?,
        })
    }

    fn state_error_name(&self) -> &'static str {
        match self.state_error {
            1 => "service-not-allowed",
            2 => "service-unknown",
            _ => "unknown-state-error",
        }
    }

    fn service_error_name(&self) -> &'static str {
        match self.service_error {
            1 => "operation-not-possible",
            2 => "service-not-supported",
            3 => "other-reason",
            4 => "pdu-too-long",
            5 => "deciphering-error",
            6 => "invocation-counter-error",
            _ => "unknown-service-error",
        }
    }
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exception response: {} / {}",
            self.state_error_name(),
            self.service_error_name()
        )
    }
}

impl From<ExceptionResponse> for DlmsError {
    fn from(exception: ExceptionResponse) -> Self {
        DlmsError::Protocol(exception.to_string())
    }
}

/// Result code of a data access (Get/Set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataAccessResult {
    Success,
    HardwareFault,
    TemporaryFailure,
    ReadWriteDenied,
    ObjectUndefined,
    ObjectClassInconsistent,
    ObjectUnavailable,
    TypeUnmatched,
    ScopeOfAccessViolated,
    DataBlockUnavailable,
    LongGetAborted,
    NoLongGetInProgress,
    LongSetAborted,
    NoLongSetInProgress,
    DataBlockNumberInvalid,
    OtherReason,
    Unknown(u8),
}

impl DataAccessResult {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DataAccessResult::Success,
            1 => DataAccessResult::HardwareFault,
            2 => DataAccessResult::TemporaryFailure,
            3 => DataAccessResult::ReadWriteDenied,
            4 => DataAccessResult::ObjectUndefined,
            9 => DataAccessResult::ObjectClassInconsistent,
            11 => DataAccessResult::ObjectUnavailable,
            12 => DataAccessResult::TypeUnmatched,
            13 => DataAccessResult::ScopeOfAccessViolated,
            14 => DataAccessResult::DataBlockUnavailable,
            15 => DataAccessResult::LongGetAborted,
            16 => DataAccessResult::NoLongGetInProgress,
            17 => DataAccessResult::LongSetAborted,
            18 => DataAccessResult::NoLongSetInProgress,
            19 => DataAccessResult::DataBlockNumberInvalid,
            250 => DataAccessResult::OtherReason,
            other => DataAccessResult::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DataAccessResult::Success => 0,
            DataAccessResult::HardwareFault => 1,
            DataAccessResult::TemporaryFailure => 2,
            DataAccessResult::ReadWriteDenied => 3,
            DataAccessResult::ObjectUndefined => 4,
            DataAccessResult::ObjectClassInconsistent => 9,
            DataAccessResult::ObjectUnavailable => 11,
            DataAccessResult::TypeUnmatched => 12,
            DataAccessResult::ScopeOfAccessViolated => 13,
            DataAccessResult::DataBlockUnavailable => 14,
            DataAccessResult::LongGetAborted => 15,
            DataAccessResult::NoLongGetInProgress => 16,
            DataAccessResult::LongSetAborted => 17,
            DataAccessResult::NoLongSetInProgress => 18,
            DataAccessResult::DataBlockNumberInvalid => 19,
            DataAccessResult::OtherReason => 250,
            DataAccessResult::Unknown(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == DataAccessResult::Success
    }
}

impl fmt::Display for DataAccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataAccessResult::Success => "success",
            DataAccessResult::HardwareFault => "hardware-fault",
            DataAccessResult::TemporaryFailure => "temporary-failure",
            DataAccessResult::ReadWriteDenied => "read-write-denied",
            DataAccessResult::ObjectUndefined => "object-undefined",
            DataAccessResult::ObjectClassInconsistent => "object-class-inconsistent",
            DataAccessResult::ObjectUnavailable => "object-unavailable",
            DataAccessResult::TypeUnmatched => "type-unmatched",
            DataAccessResult::ScopeOfAccessViolated => "scope-of-access-violated",
            DataAccessResult::DataBlockUnavailable => "data-block-unavailable",
            DataAccessResult::LongGetAborted => "long-get-aborted",
            DataAccessResult::NoLongGetInProgress => "no-long-get-in-progress",
            DataAccessResult::LongSetAborted => "long-set-aborted",
            DataAccessResult::NoLongSetInProgress => "no-long-set-in-progress",
            DataAccessResult::DataBlockNumberInvalid => "data-block-number-invalid",
            DataAccessResult::OtherReason => "other-reason",
            DataAccessResult::Unknown(code) => return write!(f, "data-access-result({})", code),
        };
        f.write_str(name)
    }
}

/// Class id, logical name and attribute index of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosemAttributeDescriptor {
    pub class_id: u16,
    pub instance_id: ObisCode,
    pub attribute_id: i8,
}

impl CosemAttributeDescriptor {
    pub fn new(class_id: u16, instance_id: ObisCode, attribute_id: i8) -> Self {
        Self {
            class_id,
            instance_id,
            attribute_id,
        }
    }

    pub fn encode(&self, encoder: &mut AxdrEncoder) {
        encoder.encode_u16(self.class_id);
        encoder.encode_bytes(self.instance_id.as_bytes());
        encoder.encode_u8(self.attribute_id as u8);
    }

    pub fn decode(decoder: &mut AxdrDecoder<'_>) -> DlmsResult<Self> {
        let class_id = decoder.decode_u16()?;
        let instance_id = ObisCode::from_slice(&decoder.decode_fixed_bytes(6)?)?;
        let attribute_id = decoder.decode_u8()? as i8;
        Ok(Self::new(class_id, instance_id, attribute_id))
    }
}

impl From<&CosemObject> for CosemAttributeDescriptor {
    fn from(object: &CosemObject) -> Self {
        Self::new(object.class_id(), object.obis_code(), object.attribute_id())
    }
}

/// Entry descriptor selective access (selector 2) for a single entry
///
/// Selects the rows `from_entry..=to_entry` of a buffer, all columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectiveAccessDescriptor {
    pub from_entry: u32,
    pub to_entry: u32,
}

impl SelectiveAccessDescriptor {
    pub const ENTRY_DESCRIPTOR: u8 = 2;

    /// A non-zero data index selects that single entry
    pub fn for_data_index(data_index: u16) -> Option<Self> {
        (data_index != 0).then(|| Self {
            from_entry: data_index as u32,
            to_entry: data_index as u32,
        })
    }

    pub fn encode(&self, encoder: &mut AxdrEncoder) {
        encoder.encode_u8(Self::ENTRY_DESCRIPTOR);
        encoder.encode_tag(AxdrTag::Structure);
        encoder.encode_length(4);
        encoder.encode_tag(AxdrTag::Unsigned32);
        encoder.encode_bytes(&self.from_entry.to_be_bytes());
        encoder.encode_tag(AxdrTag::Unsigned32);
        encoder.encode_bytes(&self.to_entry.to_be_bytes());
        // from_selected_value = 1, to_selected_value = 0 (all columns)
        encoder.encode_tag(AxdrTag::Unsigned16);
        encoder.encode_u16(1);
        encoder.encode_tag(AxdrTag::Unsigned16);
        encoder.encode_u16(0);
    }
}

/// Encode an optional access selection (`00`, or `01` followed by the selector)
pub(crate) fn encode_access_selection(
    encoder: &mut AxdrEncoder,
    access: Option<&SelectiveAccessDescriptor>,
) {
    match access {
        None => encoder.encode_u8(0x00),
        Some(access) => {
            encoder.encode_u8(0x01);
            access.encode(encoder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance_bits() {
        assert_eq!(Conformance::GET.bits(), 0x000010);
        assert_eq!(Conformance::SET.bits(), 0x000008);
        assert_eq!(Conformance::ACTION.bits(), 0x000001);
        assert_eq!(Conformance::BLOCK_TRANSFER_WITH_GET_OR_READ.bits(), 0x001000);
        let typical = Conformance::TYPICAL_CLIENT_LN;
        assert!(typical.contains(Conformance::GET.with(Conformance::SELECTIVE_ACCESS)));
        assert!(!typical.contains(Conformance::GENERAL_PROTECTION));
        assert_eq!(typical.to_bytes(), [0x00, 0x7E, 0x1F]);
        assert_eq!((typical & Conformance::GET).bits(), Conformance::GET.bits());
        assert_eq!(typical.to_string(), "0x007E1F");
    }

    #[test]
    fn test_initiate_request_bytes() {
        let request = InitiateRequest::new(Conformance::TYPICAL_CLIENT_LN, 1024);
        let encoded = request.encode();
        assert_eq!(
            encoded,
            vec![0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F, 0x04, 0x00]
        );
        assert_eq!(InitiateRequest::decode(&encoded).unwrap(), request);
    }

    #[test]
    fn test_initiate_response_bytes() {
        let bytes = [
            0x08, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x50, 0x1F, 0x01, 0xF4, 0x00, 0x07,
        ];
        let response = InitiateResponse::decode(&bytes).unwrap();
        assert_eq!(response.negotiated_dlms_version_number, 6);
        assert_eq!(response.negotiated_conformance.bits(), 0x00501F);
        assert_eq!(response.server_max_receive_pdu_size, 500);
        assert_eq!(response.vaa_name, 0x0007);
        assert_eq!(response.encode(), bytes.to_vec());
    }

    #[test]
    fn test_initiate_response_rejects_malformed() {
        assert!(InitiateResponse::decode(&[0x08, 0x00, 0x06]).is_err());
        assert!(matches!(
            InitiateResponse::decode(&[0x0E, 0x01, 0x06, 0x01]),
            Err(DlmsError::Protocol(_))
        ));
        let bad_prefix = [
            0x08, 0x00, 0x06, 0x5F, 0x1E, 0x04, 0x00, 0x00, 0x50, 0x1F, 0x01, 0xF4, 0x00, 0x07,
        ];
        assert!(matches!(InitiateResponse::decode(&bad_prefix), Err(DlmsError::Format(_))));
    }

    #[test]
    fn test_confirmed_service_error() {
        let error = ConfirmedServiceError::decode(&[0x0E, 0x01, 0x06, 0x01]).unwrap();
        assert_eq!(error.service, 1);
        assert_eq!(error.error_class, 6);
        assert_eq!(error.encode(), vec![0x0E, 0x01, 0x06, 0x01]);
    }

    #[test]
    fn test_exception_response() {
        let exception = ExceptionResponse::decode(&[0xD8, 0x01, 0x02]).unwrap();
        assert_eq!(exception.to_string(), "Exception response: service-not-allowed / service-not-supported");
        let err: DlmsError = exception.into();
        assert!(matches!(err, DlmsError::Protocol(_)));
    }

    #[test]
    fn test_data_access_result_codes() {
        for code in [0u8, 1, 2, 3, 4, 9, 11, 12, 13, 14, 15, 16, 17, 18, 19, 250, 77] {
            assert_eq!(DataAccessResult::from_code(code).code(), code);
        }
        assert!(DataAccessResult::from_code(0).is_success());
        assert_eq!(DataAccessResult::from_code(3).to_string(), "read-write-denied");
        assert_eq!(DataAccessResult::from_code(77).to_string(), "data-access-result(77)");
    }

    #[test]
    fn test_selective_access_for_data_index() {
        assert!(SelectiveAccessDescriptor::for_data_index(0).is_none());
        let access = SelectiveAccessDescriptor::for_data_index(5).unwrap();
        let mut encoder = AxdrEncoder::new();
        encode_access_selection(&mut encoder, Some(&access));
        assert_eq!(
            encoder.into_bytes(),
            vec![
                0x01, 0x02, 0x02, 0x04, 0x06, 0x00, 0x00, 0x00, 0x05, 0x06, 0x00, 0x00, 0x00, 0x05,
                0x12, 0x00, 0x01, 0x12, 0x00, 0x00
            ]
        );
    }
}
