//! Outcome of one Get or Set as reported to callers

use chrono::{DateTime, Utc};
use dlms_core::{DataObject, DlmsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `{success, value?, error?, timestamp}`
///
/// Every association-level outcome, success or not, is reported through this
/// type; errors never cross the association boundary as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub value: Option<DataObject>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationResult {
    /// Successful Get carries the value; a successful Set carries none
    pub fn success(value: Option<DataObject>) -> Self {
        Self {
            success: true,
            value,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn value(&self) -> Option<&DataObject> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<DlmsError> for OperationResult {
    fn from(error: DlmsError) -> Self {
        Self::failure(error.to_string())
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, &self.error) {
            (_, Some(error)) => write!(f, "failure: {}", error),
            (Some(value), None) => write!(f, "success: {}", value),
            (None, None) => f.write_str("success"),
        }
    }
}
