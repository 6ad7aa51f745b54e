//! Burst segmentation over captured duration streams
//!
//! A receiver left running produces one long alternating duration stream
//! covering many frames. [`BurstSplitter`] cuts that stream into individual
//! pulse traces at quiet gaps, carrying partial bursts across calls, and
//! [`BurstDecoder`] runs the decoder over each trace while keeping
//! counters. Both operate purely on already-captured samples; the capture
//! peripheral itself stays outside this crate.

use tracing::{debug, trace};

use crate::decode::{DecodeOutcome, Decoder};

/// Gap length that ends a burst, in microseconds. A full NEC frame never
/// contains a pulse this long.
pub const DEFAULT_MAX_PULSE: u32 = 10_000;

/// Splits a duration stream into pulse traces at quiet gaps.
///
/// Single-owner mutable state: it buffers the partial burst between calls,
/// so each capture stream needs its own splitter.
#[derive(Debug, Clone)]
pub struct BurstSplitter {
    max_pulse: u32,
    pending: Vec<u32>,
}

impl BurstSplitter {
    pub fn new(max_pulse: u32) -> Self {
        Self {
            max_pulse,
            pending: Vec::new(),
        }
    }

    /// Consume captured samples and return the complete traces they close.
    ///
    /// A sample longer than `max_pulse` terminates the current burst and is
    /// itself discarded; it is the idle gap between frames, not part of
    /// either. A burst still open when the samples run out is held for the
    /// next call.
    pub fn feed(&mut self, durations: &[u32]) -> Vec<Vec<u32>> {
        let mut traces = Vec::new();

        for &duration in durations {
            if duration > self.max_pulse {
                if !self.pending.is_empty() {
                    trace!("gap {}us closes {}-sample burst", duration, self.pending.len());
                    traces.push(std::mem::take(&mut self.pending));
                }
                continue;
            }
            self.pending.push(duration);
        }

        traces
    }

    /// Samples of the currently open burst.
    pub fn pending(&self) -> &[u32] {
        &self.pending
    }

    /// Close the open burst without waiting for a gap, e.g. when the
    /// capture ends. Returns `None` if nothing was buffered.
    pub fn flush(&mut self) -> Option<Vec<u32>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

impl Default for BurstSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PULSE)
    }
}

/// Running counters over a burst-decoding session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BurstStats {
    pub traces_seen: u64,
    pub decoded: u64,
    pub repeats: u64,
    pub failures: u64,
}

/// Couples a [`BurstSplitter`] with a [`Decoder`]: feed raw captured
/// samples, get one [`DecodeOutcome`] per closed burst.
#[derive(Debug)]
pub struct BurstDecoder {
    splitter: BurstSplitter,
    decoder: Decoder,
    stats: BurstStats,
}

impl BurstDecoder {
    pub fn new(decoder: Decoder) -> Self {
        Self::with_max_pulse(decoder, DEFAULT_MAX_PULSE)
    }

    pub fn with_max_pulse(decoder: Decoder, max_pulse: u32) -> Self {
        Self {
            splitter: BurstSplitter::new(max_pulse),
            decoder,
            stats: BurstStats::default(),
        }
    }

    /// Feed captured samples; decode every burst they close.
    pub fn feed(&mut self, durations: &[u32]) -> Vec<DecodeOutcome> {
        let outcomes: Vec<DecodeOutcome> = self
            .splitter
            .feed(durations)
            .into_iter()
            .map(|pulses| self.decode_trace(&pulses))
            .collect();
        outcomes
    }

    /// Decode whatever burst is still open, e.g. at end of capture.
    pub fn finish(&mut self) -> Option<DecodeOutcome> {
        let pulses = self.splitter.flush()?;
        Some(self.decode_trace(&pulses))
    }

    fn decode_trace(&mut self, pulses: &[u32]) -> DecodeOutcome {
        self.stats.traces_seen += 1;
        let outcome = self.decoder.decode(pulses);
        match &outcome {
            DecodeOutcome::Decoded(code) => {
                self.stats.decoded += 1;
                debug!(
                    "decoded {}-sample trace: {}",
                    pulses.len(),
                    hex::encode_upper(code.bytes())
                );
            }
            DecodeOutcome::Repeat => {
                self.stats.repeats += 1;
                debug!("repeat frame");
            }
            DecodeOutcome::Failure(err) => {
                self.stats.failures += 1;
                debug!("trace rejected: {}", err);
            }
        }
        outcome
    }

    pub fn stats(&self) -> &BurstStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BurstStats::default();
    }
}
