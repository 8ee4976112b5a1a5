use std::path::Path;

use crate::constellation::Constellation;
use crate::core::types::LyreResult;

/// binary writer for `.peak` constellation files
pub struct Writer;

impl Writer {
    /// new writer
    pub fn new() -> Self {
        Writer
    }

    /// serialize a constellation to bytes
    pub fn write(&self, constellation: &Constellation) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(constellation.len() * 4);
        for peak in constellation.peaks() {
            buffer.extend_from_slice(&peak.to_word().to_le_bytes());
        }
        buffer
    }

    /// serialize a constellation to a file
    pub fn write_file(&self, constellation: &Constellation, path: &Path) -> LyreResult<()> {
        std::fs::write(path, self.write(constellation))
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Peak;
    use crate::reader::Reader;

    #[test]
    fn test_write_is_four_bytes_per_peak() {
        let map = Constellation::from_peaks(vec![Peak::new(1, 2), Peak::new(3, 4)]);
        assert_eq!(Writer::new().write(&map).len(), 8);
    }

    #[test]
    fn test_write_read_round_trip() {
        let map = Constellation::from_peaks(vec![
            Peak::new(0, 0),
            Peak::new(17, 3),
            Peak::new(0xFFFF, 0xFFFF),
        ]);
        let bytes = Writer::new().write(&map);
        assert_eq!(Reader::new().read(&bytes).unwrap(), map);
    }
}
