//! Generic IR remote pulse-to-bits decoding
//!
//! Decodes infrared remote-control signals, captured as alternating
//! mark/space durations in microseconds, into fixed-width binary codes:
//! 1. Split the captured duration stream into bursts at quiet gaps
//! 2. Classify each trace: repeat frame, full frame, or malformed
//! 3. Validate the header mark/space pair against the timing profile
//! 4. Extract payload bits from mark/space pairs and pack them into bytes
//!
//! Protocol timing lives in a [`TimingProfile`]; the built-in profile is
//! NEC-style, and other pulse-distance/pulse-width protocols are supported
//! by supplying a different profile, not by changing the algorithm. The
//! decoder is a pure function over its inputs: no I/O, no retained state,
//! and acquiring the pulse trace from hardware is the caller's job.
//!
//! ```
//! use ir_decode::{DecodeOutcome, Decoder};
//!
//! let decoder = Decoder::nec();
//! let pulses: Vec<u32> = vec![9000, 2250, 560]; // captured by the caller
//! match decoder.decode(&pulses) {
//!     DecodeOutcome::Decoded(code) => println!("code {}", code.to_hex()),
//!     DecodeOutcome::Repeat => println!("repeat, previous code still valid"),
//!     DecodeOutcome::Failure(err) => println!("unreadable trace: {}", err),
//! }
//! ```

mod burst;
mod decode;
mod profile;

pub use burst::{BurstDecoder, BurstSplitter, BurstStats, DEFAULT_MAX_PULSE};
pub use decode::{
    bin_durations, infer_profile, infer_profile_default, DecodeError, DecodeOutcome, DecodedCode,
    Decoder, DurationBin, InferError,
};
pub use profile::{
    BitOrder, ProfileError, PulsePair, PulseWindow, RepeatSignature, TimingProfile,
    DEFAULT_TOLERANCE,
};
