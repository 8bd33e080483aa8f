//! GET service: Get-Request-Normal and Get-Response-Normal
//!
//! ```text
//! C0 01 <invoke> <class:2> <obis:6> <attr> <access-selection>
//! C4 01 <invoke> 00 <data>
//! C4 01 <invoke> 01 <data-access-result>
//! ```

use crate::pdu::{
    encode_access_selection, expect_end, expect_tag, CosemAttributeDescriptor, DataAccessResult,
    SelectiveAccessDescriptor, GET_REQUEST_TAG, GET_RESPONSE_TAG, INVOKE_ID_AND_PRIORITY,
    NORMAL_CHOICE,
};
use dlms_asn1::{AxdrDecoder, AxdrEncoder};
use dlms_core::{CosemObject, DataObject, DlmsError, DlmsResult};

/// Read one attribute, optionally restricted by selective access
#[derive(Debug, Clone, PartialEq)]
pub struct GetRequestNormal {
    pub invoke_id_and_priority: u8,
    pub descriptor: CosemAttributeDescriptor,
    pub access: Option<SelectiveAccessDescriptor>,
}

impl GetRequestNormal {
    pub fn new(descriptor: CosemAttributeDescriptor, access: Option<SelectiveAccessDescriptor>) -> Self {
        Self {
            invoke_id_and_priority: INVOKE_ID_AND_PRIORITY,
            descriptor,
            access,
        }
    }

    /// Request for a catalog object; its data index selects a single entry
    pub fn for_object(object: &CosemObject) -> Self {
        Self::new(
            CosemAttributeDescriptor::from(object),
            SelectiveAccessDescriptor::for_data_index(object.data_index()),
        )
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = AxdrEncoder::with_capacity(32);
        encoder.encode_u8(GET_REQUEST_TAG);
        encoder.encode_u8(NORMAL_CHOICE);
        encoder.encode_u8(self.invoke_id_and_priority);
        self.descriptor.encode(&mut encoder);
        encode_access_selection(&mut encoder, self.access.as_ref());
        encoder.into_bytes()
    }
}

/// Either the attribute value or the reason the meter refused it
#[derive(Debug, Clone, PartialEq)]
pub enum GetDataResult {
    Data(DataObject),
    DataAccessError(DataAccessResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetResponseNormal {
    pub invoke_id_and_priority: u8,
    pub result: GetDataResult,
}

impl GetResponseNormal {
    pub fn new(invoke_id_and_priority: u8, result: GetDataResult) -> Self {
        Self {
            invoke_id_and_priority,
            result,
        }
    }

    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut encoder = AxdrEncoder::new();
        encoder.encode_u8(GET_RESPONSE_TAG);
        encoder.encode_u8(NORMAL_CHOICE);
        encoder.encode_u8(self.invoke_id_and_priority);
        match &self.result {
            GetDataResult::Data(data) => {
                encoder.encode_u8(0x00);
                encoder.encode_data_object(data)?;
            }
            GetDataResult::DataAccessError(result) => {
                encoder.encode_u8(0x01);
                encoder.encode_u8(result.code());
            }
        }
        Ok(encoder.into_bytes())
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, GET_RESPONSE_TAG, "Get-Response")?;
        let choice = decoder.decode_u8()?;
        if choice != NORMAL_CHOICE {
            return Err(DlmsError::Protocol(format!(
                "Unsupported Get-Response choice: {}",
                choice
            )));
        }
        let invoke_id_and_priority = decoder.decode_u8()?;
        let result = match decoder.decode_u8()? {
            0x00 => GetDataResult::Data(decoder.decode_data_object()?),
            0x01 => GetDataResult::DataAccessError(DataAccessResult::from_code(decoder.decode_u8()?)),
            other => {
                return Err(DlmsError::Format(format!(
                    "Invalid Get-Data-Result choice: {}",
                    other
                )))
            }
        };
        expect_end(&decoder, "Get-Response")?;
        Ok(Self::new(invoke_id_and_priority, result))
    }
}

/// Stateless helpers turning objects into requests and responses into values
#[derive(Debug, Clone, Copy, Default)]
pub struct GetService;

impl GetService {
    pub fn create_request(object: &CosemObject) -> GetRequestNormal {
        GetRequestNormal::for_object(object)
    }

    /// Value carried by the response, or a Protocol error naming the data-access-result
    pub fn process_response(response: &GetResponseNormal) -> DlmsResult<DataObject> {
        match &response.result {
            GetDataResult::Data(data) => Ok(data.clone()),
            GetDataResult::DataAccessError(result) => Err(DlmsError::Protocol(format!(
                "Get failed: {}",
                result
            ))),
        }
    }
}
