//! Header/repeat detection and bit extraction
//!
//! Frame structure (NEC-style pulse distance encoding):
//! - Header: one long mark/space pair
//! - Data: one mark/space pair per bit
//! - Optional trailing stop mark
//!
//! Repeat frames are deliberately shorter than a full frame, so they are
//! classified before any bit extraction; running the bit-pair stride over
//! one would misalign immediately.

use tracing::trace;

use super::types::{DecodeError, DecodeOutcome, DecodedCode};
use crate::profile::{BitOrder, ProfileError, TimingProfile};

/// Samples consumed by the header mark/space pair.
const HEADER_SAMPLES: usize = 2;
/// Samples consumed per payload bit (one mark plus one space).
const SAMPLES_PER_BIT: usize = 2;

/// Pulse-trace decoder for one protocol and payload width.
///
/// Stateless across calls: `decode` takes `&self`, retains nothing, and
/// holds no mutable state, so concurrent decodes sharing one `Decoder` are
/// safe without locking.
#[derive(Debug, Clone)]
pub struct Decoder {
    profile: TimingProfile,
    bit_count: usize,
}

impl Decoder {
    /// Build a decoder for `bit_count` payload bits.
    ///
    /// Malformed configuration is rejected here, never during decode.
    pub fn new(profile: TimingProfile, bit_count: usize) -> Result<Self, ProfileError> {
        if bit_count == 0 {
            return Err(ProfileError::ZeroBitCount);
        }
        profile.validate()?;
        Ok(Self { profile, bit_count })
    }

    /// NEC decoder for the standard 32-bit frame.
    pub fn nec() -> Self {
        // The built-in profile and width are known valid.
        Self {
            profile: TimingProfile::nec(),
            bit_count: 32,
        }
    }

    pub fn profile(&self) -> &TimingProfile {
        &self.profile
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Decode one captured trace.
    ///
    /// `pulses` is an alternating mark/space duration sequence in
    /// microseconds, index 0 a mark. Single pass, no backtracking; the
    /// first failure encountered ends the scan.
    pub fn decode(&self, pulses: &[u32]) -> DecodeOutcome {
        match self.run(pulses) {
            Ok(outcome) => outcome,
            Err(err) => {
                trace!("decode failed: {}", err);
                DecodeOutcome::Failure(err)
            }
        }
    }

    fn run(&self, pulses: &[u32]) -> Result<DecodeOutcome, DecodeError> {
        // No header pair at all.
        if pulses.len() < HEADER_SAMPLES {
            return Err(DecodeError::TooShort {
                have: pulses.len(),
                need: HEADER_SAMPLES,
            });
        }

        // Repeat frames short-circuit before bit extraction.
        if self.profile.repeat.matches(pulses) {
            trace!("repeat frame ({} samples)", pulses.len());
            return Ok(DecodeOutcome::Repeat);
        }

        if !self.profile.header.matches(pulses[0], pulses[1]) {
            return Err(DecodeError::HeaderMismatch {
                mark: pulses[0],
                space: pulses[1],
            });
        }

        // Each bit consumes a mark+space pair after the header.
        let need = HEADER_SAMPLES + self.bit_count * SAMPLES_PER_BIT;
        if pulses.len() < need {
            return Err(DecodeError::TooShort {
                have: pulses.len(),
                need,
            });
        }

        let code = self.extract_bits(&pulses[HEADER_SAMPLES..])?;

        // Trailing samples beyond the bit pairs are ignored unless the
        // profile declares a stop mark.
        if let Some(stop) = &self.profile.stop_mark {
            // Tolerate a missing stop sample: the collector may time out
            // before the final mark is bounded by a trailing space.
            if let Some(&observed) = pulses.get(need) {
                if !stop.matches(observed) {
                    return Err(DecodeError::StopMarkMismatch { observed });
                }
            }
        }

        trace!("decoded {} bits: {}", self.bit_count, code.to_hex());
        Ok(DecodeOutcome::Decoded(code))
    }

    /// Classify non-overlapping (mark, space) pairs into bits and pack them
    /// into the output buffer per the profile's bit order.
    fn extract_bits(&self, data: &[u32]) -> Result<DecodedCode, DecodeError> {
        let num_bytes = self.bit_count.div_ceil(8);
        let mut bytes = vec![0u8; num_bytes];

        for bit_idx in 0..self.bit_count {
            let mark = data[bit_idx * SAMPLES_PER_BIT];
            let space = data[bit_idx * SAMPLES_PER_BIT + 1];

            let is_one = self.profile.one.matches(mark, space);
            let is_zero = self.profile.zero.matches(mark, space);

            let bit = match (is_one, is_zero) {
                (true, false) => true,
                (false, true) => false,
                // Overlapping tolerance windows are a profile defect, but
                // the decoder still has to catch them.
                (true, true) => {
                    return Err(DecodeError::AmbiguousBit {
                        index: bit_idx,
                        mark,
                        space,
                    })
                }
                (false, false) => {
                    return Err(DecodeError::BitMismatch {
                        index: bit_idx,
                        mark,
                        space,
                    })
                }
            };

            if bit {
                let byte_idx = bit_idx / 8;
                let bit_pos = match self.profile.bit_order {
                    BitOrder::MsbFirst => 7 - (bit_idx % 8),
                    BitOrder::LsbFirst => bit_idx % 8,
                };
                bytes[byte_idx] |= 1 << bit_pos;
            }
        }

        Ok(DecodedCode::new(bytes, self.bit_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::testutil::encode;
    use crate::profile::{PulseWindow, TimingProfile};

    fn nec32() -> Decoder {
        Decoder::nec()
    }

    #[test]
    fn zero_bit_count_rejected_at_construction() {
        assert_eq!(
            Decoder::new(TimingProfile::nec(), 0).unwrap_err(),
            ProfileError::ZeroBitCount
        );
    }

    #[test]
    fn round_trip_nec_frame() {
        let decoder = nec32();
        let payload = [0xFF, 0x00, 0xFF, 0x00];
        let pulses = encode(decoder.profile(), &payload, 32);

        match decoder.decode(&pulses) {
            DecodeOutcome::Decoded(code) => {
                assert_eq!(code.bytes(), &payload);
                assert_eq!(code.to_hex(), "FF00FF00");
            }
            other => panic!("expected Decoded, got {:?}", other),
        }
    }

    #[test]
    fn round_trip_arbitrary_payload() {
        let decoder = nec32();
        let payload = [0xA5, 0x5A, 0x3C, 0xC3];
        let pulses = encode(decoder.profile(), &payload, 32);
        assert_eq!(
            decoder.decode(&pulses).code().map(DecodedCode::bytes),
            Some(&payload[..])
        );
    }

    #[test]
    fn round_trip_non_byte_multiple_width() {
        let decoder = Decoder::new(TimingProfile::nec(), 12).unwrap();
        let payload = [0xAB, 0xC0];
        let pulses = encode(decoder.profile(), &payload, 12);

        match decoder.decode(&pulses) {
            DecodeOutcome::Decoded(code) => {
                assert_eq!(code.bytes(), &[0xAB, 0xC0]);
                assert_eq!(code.bit_count(), 12);
            }
            other => panic!("expected Decoded, got {:?}", other),
        }
    }

    #[test]
    fn lsb_first_packing() {
        let mut profile = TimingProfile::nec();
        profile.bit_order = BitOrder::LsbFirst;
        let decoder = Decoder::new(profile, 8).unwrap();

        // 0x01 LSB-first puts the set bit on the wire first.
        let pulses = encode(decoder.profile(), &[0x01], 8);
        assert_eq!(
            decoder.decode(&pulses).code().map(DecodedCode::bytes),
            Some(&[0x01][..])
        );
    }

    #[test]
    fn empty_and_one_sample_traces_too_short() {
        let decoder = nec32();
        assert_eq!(
            decoder.decode(&[]),
            DecodeOutcome::Failure(DecodeError::TooShort { have: 0, need: 2 })
        );
        assert_eq!(
            decoder.decode(&[9000]),
            DecodeOutcome::Failure(DecodeError::TooShort { have: 1, need: 2 })
        );
    }

    #[test]
    fn repeat_frame_detected_regardless_of_bit_count() {
        let repeat = [9000, 2250, 560];
        for bits in [1, 8, 32, 48] {
            let decoder = Decoder::new(TimingProfile::nec(), bits).unwrap();
            assert!(decoder.decode(&repeat).is_repeat(), "bits={}", bits);
        }
    }

    #[test]
    fn repeat_frame_off_timing_is_not_repeat() {
        let decoder = nec32();
        // Full-header space instead of the repeat half-space; too short for
        // a full frame, so this fails rather than decoding.
        let outcome = decoder.decode(&[9000, 4500, 560]);
        assert!(matches!(
            outcome,
            DecodeOutcome::Failure(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn header_mark_beyond_tolerance() {
        let decoder = nec32();
        let payload = [0u8; 4];
        let mut pulses = encode(decoder.profile(), &payload, 32);
        // Nominal 9000, tolerance 0.25: 12000 is outside 6750..=11250.
        pulses[0] = 12000;
        assert_eq!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::HeaderMismatch {
                mark: 12000,
                space: 4500
            })
        );
    }

    #[test]
    fn truncated_by_one_bit_pair_too_short() {
        let decoder = nec32();
        let mut pulses = encode(decoder.profile(), &[0xFF, 0x00, 0xFF, 0x00], 32);
        // Drop the stop mark plus one bit pair.
        pulses.truncate(pulses.len() - 3);
        assert_eq!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::TooShort { have: 64, need: 66 })
        );
    }

    #[test]
    fn bit_space_on_inclusive_tolerance_boundary() {
        let decoder = nec32();
        let mut pulses = encode(decoder.profile(), &[0u8; 4], 32);

        // Zero-space nominal 560 +/-25%: exact bounds are 420 and 700.
        pulses[3] = 420;
        pulses[5] = 700;
        assert!(decoder.decode(&pulses).code().is_some());

        // One step past the upper bound matches neither category.
        pulses[5] = 701;
        assert!(matches!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::BitMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn unclassifiable_bit_pair_reports_index() {
        let decoder = nec32();
        let mut pulses = encode(decoder.profile(), &[0u8; 4], 32);
        // Space of 3000us is outside both the one and zero windows.
        pulses[2 + 2 * 5 + 1] = 3000;
        assert_eq!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::BitMismatch {
                index: 5,
                mark: 560,
                space: 3000
            })
        );
    }

    #[test]
    fn overlapping_windows_reported_as_ambiguous() {
        let mut profile = TimingProfile::nec();
        // Widen both space windows until 1000us falls inside each.
        profile.one.space = PulseWindow::new(1200, 0.5);
        profile.zero.space = PulseWindow::new(800, 0.5);
        let decoder = Decoder::new(profile, 8).unwrap();

        let mut pulses = vec![9000, 4500];
        for _ in 0..8 {
            pulses.push(560);
            pulses.push(1000);
        }
        pulses.push(560);
        assert!(matches!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::AmbiguousBit { index: 0, .. })
        ));
    }

    #[test]
    fn bad_stop_mark_rejected() {
        let decoder = nec32();
        let mut pulses = encode(decoder.profile(), &[0x12, 0x34, 0x56, 0x78], 32);
        let last = pulses.len() - 1;
        pulses[last] = 5000;
        assert_eq!(
            decoder.decode(&pulses),
            DecodeOutcome::Failure(DecodeError::StopMarkMismatch { observed: 5000 })
        );
    }

    #[test]
    fn missing_stop_mark_tolerated() {
        let decoder = nec32();
        let mut pulses = encode(decoder.profile(), &[0x12, 0x34, 0x56, 0x78], 32);
        pulses.pop();
        assert!(decoder.decode(&pulses).code().is_some());
    }

    #[test]
    fn trailing_samples_ignored_without_stop_mark() {
        let mut profile = TimingProfile::nec();
        profile.stop_mark = None;
        let decoder = Decoder::new(profile, 8).unwrap();

        let mut pulses = encode(decoder.profile(), &[0x5A], 8);
        pulses.extend([123, 45678, 9]);
        assert!(decoder.decode(&pulses).code().is_some());
    }

    #[test]
    fn decoding_is_idempotent() {
        let decoder = nec32();
        let pulses = encode(decoder.profile(), &[0xDE, 0xAD, 0xBE, 0xEF], 32);
        assert_eq!(decoder.decode(&pulses), decoder.decode(&pulses));

        let bad = [9000u32, 4500, 560];
        assert_eq!(decoder.decode(&bad), decoder.decode(&bad));
    }
}
