//! System title and frame counter, the two inputs of the AES-GCM IV

use dlms_core::{DlmsError, DlmsResult};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// System Title: 8 bytes identifying a DLMS device
///
/// Conventionally 3 bytes of manufacturer ID followed by 5 bytes of
/// device serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SystemTitle {
    value: [u8; 8],
}

impl SystemTitle {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self { value: bytes }
    }

    /// Create System Title from a slice of exactly 8 bytes
    pub fn from_slice(bytes: &[u8]) -> DlmsResult<Self> {
        let value: [u8; 8] = bytes.try_into().map_err(|_| {
            DlmsError::Config(format!("System Title must be 8 bytes, got {}", bytes.len()))
        })?;
        Ok(Self { value })
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.value
    }
}

impl fmt::Display for SystemTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.value {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Frame Counter
///
/// A 32-bit big-endian counter mixed into every IV. [`FrameCounter::next`]
/// hands each caller a distinct value, so concurrent users of one suite never
/// cipher under the same IV; the counter wraps to zero after `u32::MAX`.
#[derive(Debug, Default)]
pub struct FrameCounter {
    counter: AtomicU32,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    pub fn with_initial(initial: u32) -> Self {
        Self {
            counter: AtomicU32::new(initial),
        }
    }

    pub fn get(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Current value as the 4 big-endian bytes carried on the wire
    pub fn to_bytes(&self) -> [u8; 4] {
        self.get().to_be_bytes()
    }

    /// Reserve the current value for one ciphered APDU and advance past it
    pub fn next(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Increment the frame counter and return the new value
    pub fn increment(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    pub fn set(&self, value: u32) {
        self.counter.store(value, Ordering::SeqCst);
    }
}

/// Build the 96-bit GCM IV: system title followed by the frame counter
pub fn build_iv(system_title: &SystemTitle, frame_counter: u32) -> [u8; 12] {
    let mut iv = [0u8; 12];
    iv[..8].copy_from_slice(system_title.as_bytes());
    iv[8..].copy_from_slice(&frame_counter.to_be_bytes());
    iv
}
