//! Stage A: per-column, per-band local maxima
//!
//! A cell is a candidate iff it is strictly greater than its four
//! in-bounds neighbours; out-of-bounds neighbours never veto. Within a
//! column at most one candidate survives per band: the loudest, first
//! occurrence winning ties. Column 0 and the last two columns are never
//! scanned, and the top frequency row is rejected rather than admitted
//! on its missing southern neighbour.

use crate::core::config::{BandTable, NUM_BANDS};
use crate::core::types::RawPeak;
use crate::spectrogram::Spectrogram;

/// Scan a spectrogram into raw peaks, ordered by time then band
pub fn raw_peaks(spec: &Spectrogram, bands: &BandTable) -> Vec<RawPeak> {
    let height = spec.bins();
    let width = spec.len();
    let mut peaks = Vec::new();

    if height == 0 || width < 3 {
        return peaks;
    }

    // A one-row spectrogram degenerates to maxima along time alone.
    let freq_limit = if height == 1 { 1 } else { height - 1 };

    for t in 1..width - 2 {
        let mut best: [Option<RawPeak>; NUM_BANDS + 1] = [None; NUM_BANDS + 1];

        for f in 0..freq_limit {
            let ampl = spec.at(f, t);
            if ampl <= spec.at(f, t - 1) || ampl <= spec.at(f, t + 1) {
                continue;
            }
            if f >= 1 && ampl <= spec.at(f - 1, t) {
                continue;
            }
            if f + 1 < height && ampl <= spec.at(f + 1, t) {
                continue;
            }

            let band = bands.band(f as u16);
            if band == 0 {
                continue;
            }
            let louder = match best[band] {
                Some(current) => ampl > current.ampl,
                None => true,
            };
            if louder {
                best[band] = Some(RawPeak {
                    freq: f as u16,
                    time: t as u16,
                    ampl,
                });
            }
        }

        for slot in best.iter().skip(1) {
            if let Some(peak) = slot {
                peaks.push(*peak);
            }
        }
    }

    peaks
}

// tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LyreResult;

    fn spec_from_rows(rows: Vec<Vec<f32>>) -> LyreResult<Spectrogram> {
        Spectrogram::from_rows(rows)
    }

    fn single_band() -> BandTable {
        BandTable::new([0, 16, 17, 18, 19, 20, 21]).unwrap()
    }

    #[test]
    fn test_isolated_cell_is_a_peak() {
        // 4 rows x 5 columns, one hot cell away from every edge
        let mut rows = vec![vec![0.0f32; 5]; 4];
        rows[1][2] = 1.0;
        let spec = spec_from_rows(rows).unwrap();
        let peaks = raw_peaks(&spec, &single_band());
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].freq, peaks[0].time), (1, 2));
        assert_eq!(peaks[0].ampl, 1.0);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        // equal east neighbour fails the strict comparison
        let mut rows = vec![vec![0.0f32; 5]; 4];
        rows[1][2] = 1.0;
        rows[1][3] = 1.0;
        let spec = spec_from_rows(rows).unwrap();
        assert!(raw_peaks(&spec, &single_band()).is_empty());
    }

    #[test]
    fn test_edge_columns_never_scanned() {
        let mut rows = vec![vec![0.0f32; 6]; 4];
        rows[1][0] = 5.0;
        rows[1][4] = 5.0; // second to last
        rows[1][5] = 5.0; // last
        let spec = spec_from_rows(rows).unwrap();
        assert!(raw_peaks(&spec, &single_band()).is_empty());
    }

    #[test]
    fn test_top_row_rejected() {
        let mut rows = vec![vec![0.0f32; 5]; 4];
        rows[3][2] = 9.0;
        let spec = spec_from_rows(rows).unwrap();
        assert!(raw_peaks(&spec, &single_band()).is_empty());
    }

    #[test]
    fn test_bottom_row_allowed() {
        let mut rows = vec![vec![0.0f32; 5]; 4];
        rows[0][2] = 9.0;
        let spec = spec_from_rows(rows).unwrap();
        let peaks = raw_peaks(&spec, &single_band());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].freq, 0);
    }

    #[test]
    fn test_single_row_emits_time_maxima() {
        let spec = spec_from_rows(vec![vec![0.0, 1.0, 0.5, 2.0, 0.0, 0.0]]).unwrap();
        let peaks = raw_peaks(&spec, &BandTable::new([0, 1, 2, 3, 4, 5, 6]).unwrap());
        // columns 1 and 3 are 1-D maxima, but column 0 and the last two
        // columns are out of scan range
        assert_eq!(peaks.len(), 2);
        assert_eq!((peaks[0].freq, peaks[0].time), (0, 1));
        assert_eq!((peaks[1].freq, peaks[1].time), (0, 3));
    }

    #[test]
    fn test_loudest_per_band_per_column_wins() {
        // two local maxima in the same band and column, separated by a
        // quiet row so both pass the neighbour test
        let mut rows = vec![vec![0.0f32; 5]; 8];
        rows[1][2] = 1.0;
        rows[3][2] = 2.0;
        let spec = spec_from_rows(rows).unwrap();
        let bands = BandTable::new([0, 7, 8, 9, 10, 11, 12]).unwrap();
        let peaks = raw_peaks(&spec, &bands);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].freq, 3);
        assert_eq!(peaks[0].ampl, 2.0);
    }

    #[test]
    fn test_band_partition_keeps_one_per_band() {
        let mut rows = vec![vec![0.0f32; 5]; 8];
        rows[1][2] = 1.0; // band 1 under cutoffs below
        rows[5][2] = 0.5; // band 2
        let spec = spec_from_rows(rows).unwrap();
        let bands = BandTable::new([0, 4, 8, 9, 10, 11, 12]).unwrap();
        let peaks = raw_peaks(&spec, &bands);
        assert_eq!(peaks.len(), 2);
        // within a column, ascending band order
        assert_eq!(peaks[0].freq, 1);
        assert_eq!(peaks[1].freq, 5);
    }

    #[test]
    fn test_out_of_range_frequency_dropped() {
        let mut rows = vec![vec![0.0f32; 5]; 8];
        rows[6][2] = 3.0; // above the last cutoff
        let spec = spec_from_rows(rows).unwrap();
        let bands = BandTable::new([0, 1, 2, 3, 4, 5, 6]).unwrap();
        assert!(raw_peaks(&spec, &bands).is_empty());
    }

    #[test]
    fn test_empty_spectrogram() {
        let spec = Spectrogram::new(0);
        assert!(raw_peaks(&spec, &single_band()).is_empty());
    }
}
