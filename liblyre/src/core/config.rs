//! Pipeline configuration
//!
//! Every tunable of the recognizer lives in one immutable record that is
//! passed by reference into each component, so test fixtures can vary
//! parameters without touching the components themselves.

use crate::core::types::LyreResult;

/// Number of frequency bands the spectrum is partitioned into
pub const NUM_BANDS: usize = 6;

/// A fixed partition of `[0, F)` into six bands via seven cutoff indices
///
/// Low frequencies carry most of the energy in music; selecting maxima
/// per band rather than per column keeps the higher bands represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandTable {
    cutoffs: [u16; NUM_BANDS + 1],
}

impl BandTable {
    /// Build a band table from ascending cutoff indices
    pub fn new(cutoffs: [u16; NUM_BANDS + 1]) -> LyreResult<Self> {
        for pair in cutoffs.windows(2) {
            if pair[0] >= pair[1] {
                return Err(format!(
                    "band cutoffs must be strictly ascending, got {:?}",
                    cutoffs
                ));
            }
        }
        Ok(BandTable { cutoffs })
    }

    /// Deployed hardware pipeline: 256 bins of a 512-point FFT
    pub fn hardware() -> Self {
        BandTable {
            cutoffs: [0, 10, 20, 40, 80, 160, 240],
        }
    }

    /// Legacy file pipeline: 128 bins of a 256-point FFT
    pub fn legacy_file() -> Self {
        BandTable {
            cutoffs: [0, 5, 10, 20, 40, 80, 120],
        }
    }

    /// Band index (1..=6) for an in-range frequency bin, 0 otherwise
    pub fn band(&self, freq: u16) -> usize {
        if freq < self.cutoffs[0] {
            return 0;
        }
        for k in 1..=NUM_BANDS {
            if freq < self.cutoffs[k] {
                return k;
            }
        }
        0
    }

    pub fn cutoffs(&self) -> &[u16; NUM_BANDS + 1] {
        &self.cutoffs
    }
}

/// Which statistic stage B thresholds against, per band and time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PruneRule {
    /// Keep peaks at least `coef` standard deviations above the window mean
    StdDev { coef: f32 },
    /// Historical rule: keep peaks at least `coef` times the window mean
    MeanRatio { coef: f32 },
}

/// All tunables of the extract/encode/match pipeline
///
/// `Default` is the deployed hardware configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Spectrogram height `F` (one side of the FFT)
    pub n_frequencies: usize,
    /// Band partition used by both extraction stages
    pub bands: BandTable,
    /// Stage-B statistics window `W`, in time samples
    pub prune_window: u16,
    /// Stage-B threshold rule
    pub prune_rule: PruneRule,
    /// Target-zone size `Z`: followers paired with each anchor
    pub target_zone: usize,
    /// Target offset `G`: followers skipped between anchor and zone
    pub target_offset: usize,
    /// Exponent `p` in the ranking normalization `count / num_hashes^p`
    pub norm_pow: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            n_frequencies: 256,
            bands: BandTable::hardware(),
            prune_window: 500,
            prune_rule: PruneRule::StdDev { coef: 1.25 },
            target_zone: 4,
            target_offset: 2,
            norm_pow: 1.0,
        }
    }
}

impl PipelineConfig {
    /// Deployed configuration (FFT accelerator pipeline)
    pub fn deployed() -> Self {
        Self::default()
    }

    /// Historical file-based configuration: 128 bins, mean-ratio pruning
    /// over short windows
    pub fn legacy_file() -> Self {
        PipelineConfig {
            n_frequencies: 128,
            bands: BandTable::legacy_file(),
            prune_window: 50,
            prune_rule: PruneRule::MeanRatio { coef: 1.85 },
            ..Self::default()
        }
    }

    pub fn with_bands(mut self, bands: BandTable) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_n_frequencies(mut self, n: usize) -> Self {
        self.n_frequencies = n;
        self
    }

    pub fn with_prune_window(mut self, window: u16) -> Self {
        self.prune_window = window;
        self
    }

    pub fn with_prune_rule(mut self, rule: PruneRule) -> Self {
        self.prune_rule = rule;
        self
    }

    pub fn with_target_zone(mut self, zone: usize) -> Self {
        self.target_zone = zone;
        self
    }

    pub fn with_target_offset(mut self, offset: usize) -> Self {
        self.target_offset = offset;
        self
    }

    pub fn with_norm_pow(mut self, pow: f32) -> Self {
        self.norm_pow = pow;
        self
    }
}

// tests
