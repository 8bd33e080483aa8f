//! AARQ, AARE, RLRQ and RLRE encoding

use crate::ber::{BerDecoder, BerEncoder, BerTag, BerTagClass};
use dlms_core::{DlmsError, DlmsResult};

const AARQ_TAG: u8 = 0;
const AARE_TAG: u8 = 1;
const RLRQ_TAG: u8 = 2;
const RLRE_TAG: u8 = 3;

/// `sender-acse-requirements`: authentication functional unit selected
const ACSE_REQUIREMENTS_AUTHENTICATION: [u8; 2] = [0x07, 0x80];

/// Outcome carried in the AARE `result` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociateResult {
    Accepted,
    RejectedPermanent,
    RejectedTransient,
}

impl AssociateResult {
    pub fn from_value(value: u32) -> DlmsResult<Self> {
        match value {
            0 => Ok(AssociateResult::Accepted),
            1 => Ok(AssociateResult::RejectedPermanent),
            2 => Ok(AssociateResult::RejectedTransient),
            _ => Err(DlmsError::Format(format!("Invalid associate result: {}", value))),
        }
    }

    pub fn value(self) -> u8 {
        match self {
            AssociateResult::Accepted => 0,
            AssociateResult::RejectedPermanent => 1,
            AssociateResult::RejectedTransient => 2,
        }
    }
}

fn unwrap_application(data: &[u8], expected: u8, name: &str) -> DlmsResult<Vec<(BerTag, Vec<u8>)>> {
    let mut outer = BerDecoder::new(data);
    let (tag, body) = outer.decode_tlv()?;
    if tag != BerTag::application(true, expected) {
        return Err(DlmsError::Format(format!("Not an {} APDU: {:?}", name, tag)));
    }
    let mut fields = Vec::new();
    let mut decoder = BerDecoder::new(body);
    while decoder.has_remaining() {
        let (tag, value) = decoder.decode_tlv()?;
        fields.push((tag, value.to_vec()));
    }
    Ok(fields)
}

fn encode_oid_field(encoder: &mut BerEncoder, tag_number: u8, oid: &[u8]) -> DlmsResult<()> {
    let mut inner = BerEncoder::new();
    inner.encode_object_identifier(oid)?;
    encoder.encode_context_specific(tag_number, inner.as_bytes(), true)
}

fn encode_octets_field(encoder: &mut BerEncoder, tag_number: u8, octets: &[u8]) -> DlmsResult<()> {
    let mut inner = BerEncoder::new();
    inner.encode_octet_string(octets)?;
    encoder.encode_context_specific(tag_number, inner.as_bytes(), true)
}

/// A-ASSOCIATE request, restricted to the fields COSEM clients send
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AARQApdu {
    /// Application context OID content octets
    pub application_context_name: Vec<u8>,
    /// Calling AP title, i.e. the client system title
    pub calling_ap_title: Option<Vec<u8>>,
    /// Authentication mechanism OID content octets
    pub mechanism_name: Option<Vec<u8>>,
    /// Password (LLS) or challenge (HLS)
    pub calling_authentication_value: Option<Vec<u8>>,
    /// xDLMS InitiateRequest, plain or glo-ciphered
    pub user_information: Option<Vec<u8>>,
}

impl AARQApdu {
    pub fn new(application_context_name: &[u8]) -> Self {
        Self {
            application_context_name: application_context_name.to_vec(),
            ..Default::default()
        }
    }

    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut fields = BerEncoder::new();
        encode_oid_field(&mut fields, 1, &self.application_context_name)?;
        if let Some(title) = &self.calling_ap_title {
            encode_octets_field(&mut fields, 6, title)?;
        }
        if let Some(mechanism) = &self.mechanism_name {
            fields.encode_context_specific(10, &ACSE_REQUIREMENTS_AUTHENTICATION, false)?;
            fields.encode_context_specific(11, mechanism, false)?;
        }
        if let Some(value) = &self.calling_authentication_value {
            let mut inner = BerEncoder::new();
            inner.encode_context_specific(0, value, false)?;
            fields.encode_context_specific(12, inner.as_bytes(), true)?;
        }
        if let Some(info) = &self.user_information {
            encode_octets_field(&mut fields, 30, info)?;
        }

        let mut encoder = BerEncoder::new();
        encoder.encode_application(AARQ_TAG, fields.as_bytes(), true)?;
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut aarq = AARQApdu::default();
        for (tag, value) in unwrap_application(data, AARQ_TAG, "AARQ")? {
            if tag.class() != BerTagClass::ContextSpecific {
                continue;
            }
            match tag.number() {
                1 => aarq.application_context_name = BerDecoder::new(&value).decode_object_identifier()?,
                6 => aarq.calling_ap_title = Some(BerDecoder::new(&value).decode_octet_string()?),
                11 => aarq.mechanism_name = Some(value),
                12 => {
                    let (_, inner) = BerDecoder::new(&value).decode_tlv()?;
                    aarq.calling_authentication_value = Some(inner.to_vec());
                }
                30 => aarq.user_information = Some(BerDecoder::new(&value).decode_octet_string()?),
                _ => {}
            }
        }
        if aarq.application_context_name.is_empty() {
            return Err(DlmsError::Format("AARQ without application context".to_string()));
        }
        Ok(aarq)
    }
}

/// A-ASSOCIATE response
#[derive(Debug, Clone, PartialEq)]
pub struct AAREApdu {
    pub application_context_name: Vec<u8>,
    pub result: AssociateResult,
    /// `result-source-diagnostic` value, whichever source reported it
    pub diagnostic: Option<u8>,
    /// Responding AP title, i.e. the server system title
    pub responding_ap_title: Option<Vec<u8>>,
    /// Server challenge (HLS)
    pub responding_authentication_value: Option<Vec<u8>>,
    /// xDLMS InitiateResponse, plain or glo-ciphered, or a service error
    pub user_information: Option<Vec<u8>>,
}

impl AAREApdu {
    pub fn new(application_context_name: &[u8], result: AssociateResult) -> Self {
        Self {
            application_context_name: application_context_name.to_vec(),
            result,
            diagnostic: None,
            responding_ap_title: None,
            responding_authentication_value: None,
            user_information: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.result == AssociateResult::Accepted
    }

    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut fields = BerEncoder::new();
        encode_oid_field(&mut fields, 1, &self.application_context_name)?;

        let mut result = BerEncoder::new();
        result.encode_small_integer(self.result.value())?;
        fields.encode_context_specific(2, result.as_bytes(), true)?;

        let mut diagnostic = BerEncoder::new();
        diagnostic.encode_small_integer(self.diagnostic.unwrap_or(0))?;
        let mut source = BerEncoder::new();
        source.encode_context_specific(1, diagnostic.as_bytes(), true)?;
        fields.encode_context_specific(3, source.as_bytes(), true)?;

        if let Some(title) = &self.responding_ap_title {
            encode_octets_field(&mut fields, 4, title)?;
        }
        if let Some(value) = &self.responding_authentication_value {
            let mut inner = BerEncoder::new();
            inner.encode_context_specific(0, value, false)?;
            fields.encode_context_specific(10, inner.as_bytes(), true)?;
        }
        if let Some(info) = &self.user_information {
            encode_octets_field(&mut fields, 30, info)?;
        }

        let mut encoder = BerEncoder::new();
        encoder.encode_application(AARE_TAG, fields.as_bytes(), true)?;
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut application_context_name = None;
        let mut result = None;
        let mut aare = AAREApdu::new(&[], AssociateResult::RejectedPermanent);

        for (tag, value) in unwrap_application(data, AARE_TAG, "AARE")? {
            if tag.class() != BerTagClass::ContextSpecific {
                continue;
            }
            match tag.number() {
                1 => application_context_name = Some(BerDecoder::new(&value).decode_object_identifier()?),
                2 => {
                    let raw = BerDecoder::new(&value).decode_unsigned_integer()?;
                    result = Some(AssociateResult::from_value(raw)?);
                }
                3 => {
                    // acse-service-user [1] or acse-service-provider [2]
                    let (_, source) = BerDecoder::new(&value).decode_tlv()?;
                    let raw = BerDecoder::new(source).decode_unsigned_integer()?;
                    aare.diagnostic = Some(u8::try_from(raw).map_err(|_| {
                        DlmsError::Format(format!("Invalid AARE diagnostic: {}", raw))
                    })?);
                }
                4 => aare.responding_ap_title = Some(BerDecoder::new(&value).decode_octet_string()?),
                10 => {
                    let (_, inner) = BerDecoder::new(&value).decode_tlv()?;
                    aare.responding_authentication_value = Some(inner.to_vec());
                }
                30 => aare.user_information = Some(BerDecoder::new(&value).decode_octet_string()?),
                _ => {}
            }
        }

        aare.application_context_name = application_context_name
            .ok_or_else(|| DlmsError::Protocol("AARE without application context".to_string()))?;
        aare.result =
            result.ok_or_else(|| DlmsError::Protocol("AARE without result field".to_string()))?;
        Ok(aare)
    }
}

/// A-RELEASE request with reason `normal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RLRQApdu;

impl RLRQApdu {
    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut fields = BerEncoder::new();
        fields.encode_context_specific(0, &[0x00], false)?;
        let mut encoder = BerEncoder::new();
        encoder.encode_application(RLRQ_TAG, fields.as_bytes(), true)?;
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        unwrap_application(data, RLRQ_TAG, "RLRQ")?;
        Ok(RLRQApdu)
    }
}

/// A-RELEASE response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RLREApdu {
    pub reason: Option<u8>,
}

impl RLREApdu {
    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut fields = BerEncoder::new();
        if let Some(reason) = self.reason {
            fields.encode_context_specific(0, &[reason], false)?;
        }
        let mut encoder = BerEncoder::new();
        encoder.encode_application(RLRE_TAG, fields.as_bytes(), true)?;
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let reason = unwrap_application(data, RLRE_TAG, "RLRE")?
            .into_iter()
            .find(|(tag, _)| *tag == BerTag::context_specific(false, 0))
            .and_then(|(_, value)| value.first().copied());
        Ok(RLREApdu { reason })
    }
}
