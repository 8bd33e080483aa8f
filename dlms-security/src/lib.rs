//! Security module for DLMS/COSEM protocol
//!
//! This crate provides the security suite used by the application layer:
//! AES-GCM encryption keyed by system title and frame counter, plus a
//! truncated HMAC authentication tag.

pub mod authentication;
pub mod encryption;
pub mod suite;
pub mod utils;
pub mod xdlms;

pub use authentication::{HmacAuth, AUTH_TAG_LENGTH};
pub use encryption::{AesGcmEncryption, SecurityControl, GCM_TAG_LENGTH};
pub use suite::{SecurityPolicy, SecuritySuite, SecuritySuiteBuilder, SecurityVersion};
pub use utils::{generate_challenge, parse_aes_key, parse_hex_key};
pub use xdlms::{build_iv, FrameCounter, SystemTitle};
