use std::path::Path;

use crate::constellation::Constellation;
use crate::core::types::{LyreResult, Peak};

/// binary reader for `.peak` constellation files
///
/// The format is a flat sequence of 32-bit little-endian words, each
/// `(freq << 16) | time`. No header, no checksum: constellations are
/// small and regenerable, so the format optimizes for bulk read.
pub struct Reader;

impl Reader {
    /// new reader
    pub fn new() -> Self {
        Reader
    }

    /// parse constellation bytes
    pub fn read(&self, data: &[u8]) -> LyreResult<Constellation> {
        if data.len() % 4 != 0 {
            return Err(format!(
                "constellation file truncated: {} bytes is not a whole number of peaks",
                data.len()
            ));
        }

        let mut peaks = Vec::with_capacity(data.len() / 4);
        for chunk in data.chunks_exact(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            peaks.push(Peak::from_word(word));
        }
        Ok(Constellation::from_peaks(peaks))
    }

    /// read and parse a constellation file
    pub fn read_file(&self, path: &Path) -> LyreResult<Constellation> {
        let data = std::fs::read(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        self.read(&data)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}
