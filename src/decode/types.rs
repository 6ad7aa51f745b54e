//! Decode result types

use thiserror::Error;

/// Reconstructed payload from a full frame.
///
/// Holds exactly `ceil(bit_count / 8)` bytes with every requested bit
/// written; a trace that yields fewer bits is a [`DecodeError`], never a
/// partially filled buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    bytes: Vec<u8>,
    bit_count: usize,
}

impl DecodedCode {
    pub(crate) fn new(bytes: Vec<u8>, bit_count: usize) -> Self {
        debug_assert_eq!(bytes.len(), bit_count.div_ceil(8));
        Self { bytes, bit_count }
    }

    /// Decoded payload bytes, bytes in arrival order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bits the decoder extracted.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Uppercase hex rendering of the payload, for display and logging.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

/// Why a trace failed to decode.
///
/// All failures are reported as values; a corrupted trace cannot
/// self-correct, so the first failure encountered ends the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Trace ends before the header, or before the expected bit-pair count.
    #[error("trace too short: {have} samples, need {need}")]
    TooShort { have: usize, need: usize },

    /// Leading mark/space pair outside both the full-header and
    /// repeat-signature windows.
    #[error("header mismatch: leading pair ({mark}us, {space}us) outside tolerance")]
    HeaderMismatch { mark: u32, space: u32 },

    /// A bit pair matched neither the one-pair nor the zero-pair.
    #[error("bit pair {index} ({mark}us, {space}us) matches neither one nor zero")]
    BitMismatch { index: usize, mark: u32, space: u32 },

    /// A bit pair matched both the one-pair and the zero-pair; the profile's
    /// tolerance windows overlap at this duration.
    #[error("bit pair {index} ({mark}us, {space}us) matches both one and zero")]
    AmbiguousBit { index: usize, mark: u32, space: u32 },

    /// The profile declares a trailing stop mark and the sample after the
    /// last bit pair does not match it.
    #[error("stop mark {observed}us outside tolerance")]
    StopMarkMismatch { observed: u32 },
}

/// Result of one decode call. Exactly one variant per call; never both a
/// code and a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Full frame decoded to a payload.
    Decoded(DecodedCode),
    /// Repeat frame: no new payload, the previous code is still valid.
    /// Not a failure; callers must treat it separately from both.
    Repeat,
    /// The trace could not be decoded.
    Failure(DecodeError),
}

impl DecodeOutcome {
    /// The payload, if this outcome carries one.
    pub fn code(&self) -> Option<&DecodedCode> {
        match self {
            Self::Decoded(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_repeat(&self) -> bool {
        matches!(self, Self::Repeat)
    }
}
