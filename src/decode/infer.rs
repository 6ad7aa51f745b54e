//! Adaptive timing analysis
//!
//! Builds a [`TimingProfile`] from a captured trace when the protocol
//! timing is not known up front. Pulse durations are clustered into bins
//! that accept anything within the tolerance fraction of their running
//! average; a pulse-distance frame then shows one mark bin and exactly two
//! space bins (zero-space and one-space).

use thiserror::Error;
use tracing::debug;

use crate::profile::{
    BitOrder, PulsePair, PulseWindow, RepeatSignature, TimingProfile, DEFAULT_TOLERANCE,
};

/// Fewest samples worth analyzing: header pair plus four bit pairs.
const MIN_TRACE_SAMPLES: usize = 10;

/// Why a trace was not usable for profile inference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("trace too short to analyze: {0} samples")]
    TooShort(usize),

    #[error("mark durations split into {0} bins, expected one")]
    MarksDiffer(usize),

    #[error("space durations do not form two populations ({0} bins)")]
    SpacesNotBimodal(usize),
}

/// A cluster of similar durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBin {
    /// Running average of the member durations, in microseconds
    pub nominal: u32,
    /// Number of durations absorbed
    pub count: usize,
}

/// Cluster durations into bins of mutually similar lengths.
///
/// A duration joins the first bin within `tolerance` of the bin's running
/// average, nudging the average toward it; otherwise it opens a new bin.
pub fn bin_durations(durations: &[u32], tolerance: f32) -> Vec<DurationBin> {
    let mut bins: Vec<DurationBin> = Vec::new();

    for &duration in durations {
        let matched = bins.iter_mut().find(|bin| {
            PulseWindow::new(bin.nominal, tolerance).matches(duration)
        });
        match matched {
            Some(bin) => {
                bin.nominal = (bin.nominal + duration) / 2;
                bin.count += 1;
            }
            None => bins.push(DurationBin {
                nominal: duration,
                count: 1,
            }),
        }
    }

    bins
}

/// Infer a pulse-distance profile and payload width from one full-frame
/// trace.
///
/// The leading pair becomes the header; post-header marks must cluster into
/// a single bin and spaces into exactly two (the longer space is the one
/// bit). Single-member outlier bins, such as a glitch sample, are skipped.
/// Returns the profile together with the bit count the trace carries, ready
/// for [`Decoder::new`](crate::Decoder::new).
pub fn infer_profile(pulses: &[u32], tolerance: f32) -> Result<(TimingProfile, usize), InferError> {
    if pulses.len() < MIN_TRACE_SAMPLES {
        return Err(InferError::TooShort(pulses.len()));
    }

    let header_mark = pulses[0];
    let header_space = pulses[1];

    // An odd-length body ends on an unpaired stop mark; leave it out of the
    // populations.
    let mut body = &pulses[2..];
    let has_stop_mark = body.len() % 2 == 1;
    if has_stop_mark {
        body = &body[..body.len() - 1];
    }

    let marks: Vec<u32> = body.iter().copied().step_by(2).collect();
    let spaces: Vec<u32> = body.iter().copied().skip(1).step_by(2).collect();

    let mark_bins = significant_bins(bin_durations(&marks, tolerance));
    let space_bins = significant_bins(bin_durations(&spaces, tolerance));

    debug!(
        "inference: {} mark bins, {} space bins over {} pairs",
        mark_bins.len(),
        space_bins.len(),
        marks.len()
    );

    if mark_bins.len() != 1 {
        return Err(InferError::MarksDiffer(mark_bins.len()));
    }
    if space_bins.len() != 2 {
        return Err(InferError::SpacesNotBimodal(space_bins.len()));
    }

    let bit_mark = mark_bins[0].nominal;
    let zero_space = space_bins[0].nominal.min(space_bins[1].nominal);
    let one_space = space_bins[0].nominal.max(space_bins[1].nominal);

    let w = |nominal| PulseWindow::new(nominal, tolerance);
    let profile = TimingProfile {
        header: PulsePair::new(w(header_mark), w(header_space)),
        one: PulsePair::new(w(bit_mark), w(one_space)),
        zero: PulsePair::new(w(bit_mark), w(zero_space)),
        // Pulse-distance repeat frames carry the header mark, a half-length
        // space, and a stop mark (the NEC shape).
        repeat: RepeatSignature::new(vec![w(header_mark), w(header_space / 2), w(bit_mark)]),
        stop_mark: has_stop_mark.then(|| w(bit_mark)),
        bit_order: BitOrder::MsbFirst,
    };

    Ok((profile, marks.len()))
}

/// Infer with the default ±25% tolerance.
pub fn infer_profile_default(pulses: &[u32]) -> Result<(TimingProfile, usize), InferError> {
    infer_profile(pulses, DEFAULT_TOLERANCE)
}

/// Drop single-member outlier bins.
fn significant_bins(bins: Vec<DurationBin>) -> Vec<DurationBin> {
    bins.into_iter().filter(|bin| bin.count > 1).collect()
}
