//! Stage B: time-windowed statistical pruning
//!
//! Raw peaks are grouped into consecutive windows of `W` time samples.
//! Each window is processed in two passes: first per-band mean and
//! standard deviation over the raw peaks in that window, then a filter
//! pass that keeps only peaks clearing the band's threshold. Computing
//! the statistics before classifying anything keeps them unbiased.

use crate::core::config::{BandTable, PruneRule, NUM_BANDS};
use crate::core::types::{Peak, RawPeak};

/// Prune a time-ordered raw peak list into the final constellation
pub fn prune(raw: &[RawPeak], bands: &BandTable, window: u16, rule: PruneRule) -> Vec<Peak> {
    let mut pruned = Vec::new();
    if raw.is_empty() {
        return pruned;
    }
    if window == 0 {
        log::warn!("pruning window of 0 keeps nothing");
        return pruned;
    }

    let mut kept = [0usize; NUM_BANDS + 1];
    let mut dropped = [0usize; NUM_BANDS + 1];

    let mut start = 0;
    while start < raw.len() {
        // the window containing the next unprocessed peak; windows with
        // no raw peaks contribute nothing
        let window_start = (raw[start].time as u32 / window as u32) * window as u32;
        let window_end = window_start + window as u32;

        let mut end = start;
        while end < raw.len() && (raw[end].time as u32) < window_end {
            end += 1;
        }
        let segment = &raw[start..end];

        // pass 1: per-band mean
        let mut count = [0u32; NUM_BANDS + 1];
        let mut sum = [0f32; NUM_BANDS + 1];
        for peak in segment {
            let band = bands.band(peak.freq);
            count[band] += 1;
            sum[band] += peak.ampl;
        }
        let mut mean = [0f32; NUM_BANDS + 1];
        for band in 1..=NUM_BANDS {
            if count[band] > 0 {
                mean[band] = sum[band] / count[band] as f32;
            }
        }

        // pass 1b: per-band population standard deviation
        let mut var = [0f32; NUM_BANDS + 1];
        for peak in segment {
            let band = bands.band(peak.freq);
            if band > 0 && count[band] > 0 {
                let delta = peak.ampl - mean[band];
                var[band] += delta * delta;
            }
        }
        let mut std_dev = [0f32; NUM_BANDS + 1];
        for band in 1..=NUM_BANDS {
            if count[band] > 0 {
                std_dev[band] = (var[band] / count[band] as f32).sqrt();
            }
        }

        // pass 2: filter against the band threshold
        for peak in segment {
            let band = bands.band(peak.freq);
            if band == 0 || count[band] == 0 {
                dropped[band] += 1;
                continue;
            }
            let keep = match rule {
                PruneRule::StdDev { coef } => peak.ampl >= mean[band] + coef * std_dev[band],
                PruneRule::MeanRatio { coef } => peak.ampl >= coef * mean[band],
            };
            if keep {
                pruned.push(peak.to_peak());
                kept[band] += 1;
            } else {
                dropped[band] += 1;
            }
        }

        start = end;
    }

    for band in 1..=NUM_BANDS {
        log::debug!(
            "band {}: kept {} | pruned {}",
            band,
            kept[band],
            dropped[band]
        );
    }

    pruned
}

// tests
