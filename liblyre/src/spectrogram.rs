//! Magnitude spectrogram container and text-file parsing
//!
//! A spectrogram is indexed `[freq, time]` over a fixed number of
//! frequency bins. Columns are delivered atomically, one per time
//! sample, which is the shape both the FFT device and the software STFT
//! produce; text files store one frequency *row* per line and are
//! transposed on load.

use std::ops::Range;
use std::path::Path;

use crate::core::types::LyreResult;

/// Column-major magnitude matrix with a fixed number of frequency bins
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    bins: usize,
    columns: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// Empty spectrogram with `bins` frequency rows
    pub fn new(bins: usize) -> Self {
        Spectrogram {
            bins,
            columns: Vec::new(),
        }
    }

    /// Number of frequency bins `F`
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of time columns `T`
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Magnitude at `[freq, time]`
    pub fn at(&self, freq: usize, time: usize) -> f32 {
        self.columns[time][freq]
    }

    /// One full column, all bins for a single time sample
    pub fn column(&self, time: usize) -> &[f32] {
        &self.columns[time]
    }

    /// Append one column; its length must match the bin count
    pub fn push_column(&mut self, column: Vec<f32>) -> LyreResult<()> {
        if column.len() != self.bins {
            return Err(format!(
                "column has {} bins, spectrogram expects {}",
                column.len(),
                self.bins
            ));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Build from frequency-major rows (the text-file layout)
    ///
    /// Every row must have the same length; a ragged matrix is malformed
    /// input and is rejected rather than padded.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> LyreResult<Self> {
        let bins = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "ragged spectrogram: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                ));
            }
        }

        let mut spec = Spectrogram::new(bins);
        for t in 0..width {
            let column = rows.iter().map(|row| row[t]).collect();
            // length is bins by construction
            spec.push_column(column)?;
        }
        Ok(spec)
    }
}

/// Parse a whitespace-numeric spectrogram file
///
/// The first line is a header and is skipped; each following non-empty
/// line is one frequency row. `clip` restricts every row to a column
/// window, which is how noisy query files are trimmed to the recorded
/// region.
pub fn read_spectrogram_file(path: &Path, clip: Option<Range<usize>>) -> LyreResult<Spectrogram> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_spectrogram(&text, clip)
        .map_err(|e| format!("malformed spectrogram {}: {}", path.display(), e))
}

fn parse_spectrogram(text: &str, clip: Option<Range<usize>>) -> LyreResult<Spectrogram> {
    let mut rows: Vec<Vec<f32>> = Vec::new();

    for (lineno, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let value: f32 = token
                .parse()
                .map_err(|_| format!("non-numeric token {:?} on line {}", token, lineno + 1))?;
            row.push(value);
        }
        if let Some(ref window) = clip {
            let start = window.start.min(row.len());
            let end = window.end.min(row.len());
            row = row[start..end].to_vec();
        }
        rows.push(row);
    }

    let spec = Spectrogram::from_rows(rows)?;
    log::debug!("parsed spectrogram: {} bins x {} columns", spec.bins(), spec.len());
    Ok(spec)
}

// tests
