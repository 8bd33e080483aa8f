//! SET service: Set-Request-Normal and Set-Response-Normal

use crate::pdu::{
    encode_access_selection, expect_end, expect_tag, CosemAttributeDescriptor, DataAccessResult,
    SelectiveAccessDescriptor, INVOKE_ID_AND_PRIORITY, NORMAL_CHOICE, SET_REQUEST_TAG,
    SET_RESPONSE_TAG,
};
use dlms_asn1::{AxdrDecoder, AxdrEncoder};
use dlms_core::{CosemObject, DataObject, DlmsError, DlmsResult};

/// Write one attribute
///
/// `C1 01 <invoke> <class:2> <obis:6> <attr> <access-selection> <data>`
#[derive(Debug, Clone, PartialEq)]
pub struct SetRequestNormal {
    pub invoke_id_and_priority: u8,
    pub descriptor: CosemAttributeDescriptor,
    pub access: Option<SelectiveAccessDescriptor>,
    pub value: DataObject,
}

impl SetRequestNormal {
    pub fn new(
        descriptor: CosemAttributeDescriptor,
        access: Option<SelectiveAccessDescriptor>,
        value: DataObject,
    ) -> Self {
        Self {
            invoke_id_and_priority: INVOKE_ID_AND_PRIORITY,
            descriptor,
            access,
            value,
        }
    }

    pub fn for_object(object: &CosemObject, value: DataObject) -> Self {
        Self::new(
            CosemAttributeDescriptor::from(object),
            SelectiveAccessDescriptor::for_data_index(object.data_index()),
            value,
        )
    }

    pub fn encode(&self) -> DlmsResult<Vec<u8>> {
        let mut encoder = AxdrEncoder::with_capacity(32);
        encoder.encode_u8(SET_REQUEST_TAG);
        encoder.encode_u8(NORMAL_CHOICE);
        encoder.encode_u8(self.invoke_id_and_priority);
        self.descriptor.encode(&mut encoder);
        encode_access_selection(&mut encoder, self.access.as_ref());
        encoder.encode_data_object(&self.value)?;
        Ok(encoder.into_bytes())
    }
}

/// `C5 01 <invoke> <data-access-result>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetResponseNormal {
    pub invoke_id_and_priority: u8,
    pub result: DataAccessResult,
}

impl SetResponseNormal {
    pub fn new(invoke_id_and_priority: u8, result: DataAccessResult) -> Self {
        Self {
            invoke_id_and_priority,
            result,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        vec![
            SET_RESPONSE_TAG,
            NORMAL_CHOICE,
            self.invoke_id_and_priority,
            self.result.code(),
        ]
    }

    pub fn decode(data: &[u8]) -> DlmsResult<Self> {
        let mut decoder = AxdrDecoder::new(data);
        expect_tag(&mut decoder, SET_RESPONSE_TAG, "Set-Response")?;
        let choice = decoder.decode_u8()?;
        if choice != NORMAL_CHOICE {
            return Err(DlmsError::Protocol(format!(
                "Unsupported Set-Response choice: {}",
                choice
            )));
        }
        let invoke_id_and_priority = decoder.decode_u8()?;
        let result = DataAccessResult::from_code(decoder.decode_u8()?);
        expect_end(&decoder, "Set-Response")?;
        Ok(Self::new(invoke_id_and_priority, result))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SetService;

impl SetService {
    pub fn create_request(object: &CosemObject, value: DataObject) -> SetRequestNormal {
        SetRequestNormal::for_object(object, value)
    }

    pub fn process_response(response: &SetResponseNormal) -> DlmsResult<()> {
        if response.result.is_success() {
            Ok(())
        } else {
            Err(DlmsError::Protocol(format!("Set failed: {}", response.result)))
        }
    }
}
