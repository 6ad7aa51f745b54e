//! Pulse-trace decoding pipeline

mod frame;
mod infer;
mod types;

pub use frame::Decoder;
pub use infer::{bin_durations, infer_profile, infer_profile_default, DurationBin, InferError};
pub use types::{DecodeError, DecodeOutcome, DecodedCode};
