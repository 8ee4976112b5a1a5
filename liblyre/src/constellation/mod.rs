//! Constellation maps: sparse time-frequency peak sets
//!
//! The two extraction stages live in `extract` (per-column band maxima)
//! and `prune` (windowed statistical thresholding); this module owns the
//! resulting container and the one-call map generation entry point.

pub mod extract;
pub mod prune;

use crate::core::config::{BandTable, PipelineConfig, NUM_BANDS};
use crate::core::types::{LyreResult, Peak};
use crate::spectrogram::Spectrogram;

pub use extract::raw_peaks;
pub use prune::prune;

/// An ordered sequence of peaks in non-decreasing time order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constellation {
    peaks: Vec<Peak>,
}

impl Constellation {
    pub fn from_peaks(peaks: Vec<Peak>) -> Self {
        debug_assert!(
            peaks.windows(2).all(|pair| pair[0].time <= pair[1].time),
            "constellation peaks must be in non-decreasing time order"
        );
        Constellation { peaks }
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// First and last peak time, if any peaks exist
    pub fn time_span(&self) -> Option<(u16, u16)> {
        match (self.peaks.first(), self.peaks.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Peak count per band (index 0 counts out-of-range peaks)
    pub fn band_counts(&self, bands: &BandTable) -> [usize; NUM_BANDS + 1] {
        let mut counts = [0; NUM_BANDS + 1];
        for peak in &self.peaks {
            counts[bands.band(peak.freq)] += 1;
        }
        counts
    }

    /// BLAKE3 hash over the serialized peak words
    ///
    /// Identifies the constellation's content independent of file name;
    /// enrollment uses it to flag duplicate songs.
    pub fn content_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for peak in &self.peaks {
            hasher.update(&peak.to_word().to_le_bytes());
        }
        hasher.finalize()
    }
}

/// Run both extraction stages on a spectrogram
pub fn constellation_map(spec: &Spectrogram, cfg: &PipelineConfig) -> LyreResult<Constellation> {
    if !spec.is_empty() && spec.bins() != cfg.n_frequencies {
        return Err(format!(
            "spectrogram has {} frequency bins, config expects {}",
            spec.bins(),
            cfg.n_frequencies
        ));
    }
    if spec.len() > u16::MAX as usize {
        return Err(format!(
            "spectrogram has {} columns, peak times are 16-bit",
            spec.len()
        ));
    }

    let raw = raw_peaks(spec, &cfg.bands);
    let peaks = prune(&raw, &cfg.bands, cfg.prune_window, cfg.prune_rule);
    log::debug!("constellation: {} raw -> {} pruned peaks", raw.len(), peaks.len());
    Ok(Constellation::from_peaks(peaks))
}

// tests
