//! Protocol timing configuration
//!
//! A [`TimingProfile`] describes one pulse-distance/pulse-width protocol:
//! the header mark/space pair, the one-bit and zero-bit pairs, the repeat
//! frame signature, and the bit packing order. Swapping the profile swaps
//! the protocol without touching the decoding algorithm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while validating a profile or constructing a decoder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("bit count must be greater than zero")]
    ZeroBitCount,

    #[error("tolerance fraction {0} is outside [0, 1)")]
    BadTolerance(f32),

    #[error("nominal duration must be greater than zero")]
    ZeroNominal,

    #[error("repeat signature must cover at least the leading mark/space pair")]
    ShortRepeatSignature,
}

/// Acceptance window around a nominal duration.
///
/// A duration matches when it falls within `nominal * (1 ± tolerance)`,
/// bounds inclusive. Tolerance is multiplicative because IR timing error
/// scales with pulse length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseWindow {
    /// Nominal duration in microseconds
    pub nominal: u32,

    /// Allowed relative deviation, e.g. 0.25 for ±25%
    pub tolerance: f32,
}

impl PulseWindow {
    pub const fn new(nominal: u32, tolerance: f32) -> Self {
        Self { nominal, tolerance }
    }

    /// True iff `observed` lies within the acceptance window, inclusive at
    /// both ends.
    pub fn matches(&self, observed: u32) -> bool {
        let nominal = f64::from(self.nominal);
        let slack = nominal * f64::from(self.tolerance);
        let observed = f64::from(observed);
        observed >= nominal - slack && observed <= nominal + slack
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.nominal == 0 {
            return Err(ProfileError::ZeroNominal);
        }
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return Err(ProfileError::BadTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// A mark/space window pair, the unit a bit or header occupies on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulsePair {
    pub mark: PulseWindow,
    pub space: PulseWindow,
}

impl PulsePair {
    pub const fn new(mark: PulseWindow, space: PulseWindow) -> Self {
        Self { mark, space }
    }

    /// True iff both halves of the pair match their windows.
    pub fn matches(&self, mark: u32, space: u32) -> bool {
        self.mark.matches(mark) && self.space.matches(space)
    }

    fn validate(&self) -> Result<(), ProfileError> {
        self.mark.validate()?;
        self.space.validate()
    }
}

/// Timing signature of a repeat frame.
///
/// Repeat frames are markedly shorter than a full frame, so they are
/// identified by exact trace length plus one window per sample. For NEC
/// that is three samples: header mark, half-length space, stop mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatSignature {
    /// One acceptance window per sample; the trace must have exactly this
    /// many samples to qualify as a repeat frame.
    pub windows: Vec<PulseWindow>,
}

impl RepeatSignature {
    pub fn new(windows: Vec<PulseWindow>) -> Self {
        Self { windows }
    }

    /// Expected repeat-frame trace length.
    pub fn trace_len(&self) -> usize {
        self.windows.len()
    }

    /// True iff the trace has exactly the signature length and every sample
    /// matches its window.
    pub fn matches(&self, pulses: &[u32]) -> bool {
        pulses.len() == self.windows.len()
            && self
                .windows
                .iter()
                .zip(pulses)
                .all(|(w, &p)| w.matches(p))
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.windows.len() < 2 {
            return Err(ProfileError::ShortRepeatSignature);
        }
        for w in &self.windows {
            w.validate()?;
        }
        Ok(())
    }
}

/// Bit packing order within each output byte. Bytes always fill in arrival
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitOrder {
    /// First bit received lands in bit 7
    MsbFirst,
    /// First bit received lands in bit 0
    LsbFirst,
}

/// Expected timing of one protocol. Immutable once built; the decoder only
/// ever reads it, so a single profile may back concurrent decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Leading mark/space pair identifying the start of a full frame
    pub header: PulsePair,

    /// Mark/space pair encoding a logical one
    pub one: PulsePair,

    /// Mark/space pair encoding a logical zero
    pub zero: PulsePair,

    /// Signature of the short repeat frame
    pub repeat: RepeatSignature,

    /// Trailing stop mark to validate after the last bit pair, if the
    /// protocol requires one. `None` leaves trailing samples unchecked.
    pub stop_mark: Option<PulseWindow>,

    /// How bits pack into output bytes
    pub bit_order: BitOrder,
}

/// Default tolerance fraction, ±25% of nominal.
pub const DEFAULT_TOLERANCE: f32 = 0.25;

// NEC nominal timing in microseconds
const NEC_HEADER_MARK: u32 = 9000;
const NEC_HEADER_SPACE: u32 = 4500;
const NEC_BIT_MARK: u32 = 560;
const NEC_ONE_SPACE: u32 = 1690;
const NEC_ZERO_SPACE: u32 = 560;
const NEC_REPEAT_SPACE: u32 = 2250;

impl TimingProfile {
    /// Built-in NEC-style profile: 9 ms / 4.5 ms header, 560 µs bit marks,
    /// 1690 µs one-space, 560 µs zero-space, 9 ms / 2.25 ms / 560 µs repeat
    /// frame, ±25% tolerance, MSB-first packing.
    pub fn nec() -> Self {
        let w = |nominal| PulseWindow::new(nominal, DEFAULT_TOLERANCE);
        Self {
            header: PulsePair::new(w(NEC_HEADER_MARK), w(NEC_HEADER_SPACE)),
            one: PulsePair::new(w(NEC_BIT_MARK), w(NEC_ONE_SPACE)),
            zero: PulsePair::new(w(NEC_BIT_MARK), w(NEC_ZERO_SPACE)),
            repeat: RepeatSignature::new(vec![
                w(NEC_HEADER_MARK),
                w(NEC_REPEAT_SPACE),
                w(NEC_BIT_MARK),
            ]),
            stop_mark: Some(w(NEC_BIT_MARK)),
            bit_order: BitOrder::MsbFirst,
        }
    }

    /// Check every window in the profile for sane nominals and tolerances.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.header.validate()?;
        self.one.validate()?;
        self.zero.validate()?;
        self.repeat.validate()?;
        if let Some(stop) = &self.stop_mark {
            stop.validate()?;
        }
        Ok(())
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::nec()
    }
}
