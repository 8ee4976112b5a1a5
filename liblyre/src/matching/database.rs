//! Fingerprint database and song table
//!
//! A multimap from 48-bit key to `(song_id, anchor_time)` entries plus a
//! dense side table of enrolled songs. Insertion is append-only and
//! duplicate `(key, entry)` pairs are kept: several anchors in one song
//! can legitimately produce the same key.

use std::collections::HashMap;

use crate::constellation::Constellation;
use crate::core::config::PipelineConfig;
use crate::core::types::{LyreResult, SongId, QUERY_SONG_ID};
use crate::fingerprint::{fingerprints, IndexEntry};

use serde::Serialize;

/// Song table row
#[derive(Debug, Clone, Serialize)]
pub struct SongInfo {
    pub id: SongId,
    pub name: String,
    /// Number of database entries inserted under this song
    pub fingerprint_count: usize,
    /// BLAKE3 hex digest of the song's constellation
    pub content_hash: String,
}

/// In-memory fingerprint index over all enrolled songs
#[derive(Debug, Default)]
pub struct FingerprintDb {
    index: HashMap<u64, Vec<IndexEntry>>,
    songs: Vec<SongInfo>,
}

impl FingerprintDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll one song's constellation, assigning the next dense id
    ///
    /// Ids start at 1; 0 stays reserved for query streams. A
    /// constellation whose content hash matches an already-enrolled song
    /// is accepted but flagged, since two copies will split each other's
    /// match counts.
    pub fn enroll(
        &mut self,
        name: &str,
        constellation: &Constellation,
        cfg: &PipelineConfig,
    ) -> LyreResult<SongId> {
        if self.songs.len() >= SongId::MAX as usize {
            return Err(format!(
                "song table is full ({} songs), ids are 16-bit",
                self.songs.len()
            ));
        }
        let id = (self.songs.len() + 1) as SongId;
        debug_assert_ne!(id, QUERY_SONG_ID);

        let content_hash = constellation.content_hash().to_hex().to_string();
        if let Some(twin) = self.songs.iter().find(|s| s.content_hash == content_hash) {
            log::warn!(
                "\"{}\" has the same constellation as already-enrolled \"{}\"",
                name,
                twin.name
            );
        }

        let mut count = 0;
        for (key, entry) in fingerprints(constellation, id, cfg) {
            self.index.entry(key).or_default().push(entry);
            count += 1;
        }

        log::info!("enrolled \"{}\" as song {} with {} fingerprints", name, id, count);
        self.songs.push(SongInfo {
            id,
            name: name.to_string(),
            fingerprint_count: count,
            content_hash,
        });
        Ok(id)
    }

    /// All entries stored under a key, empty when the key is unknown
    pub fn lookup(&self, key: u64) -> &[IndexEntry] {
        self.index.get(&key).map_or(&[], Vec::as_slice)
    }

    pub fn song(&self, id: SongId) -> Option<&SongInfo> {
        if id == QUERY_SONG_ID {
            return None;
        }
        self.songs.get(id as usize - 1)
    }

    pub fn songs(&self) -> &[SongInfo] {
        &self.songs
    }

    pub fn num_songs(&self) -> usize {
        self.songs.len()
    }

    /// Total fingerprint entries across all songs
    pub fn num_entries(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    /// Distinct 48-bit keys present
    pub fn num_keys(&self) -> usize {
        self.index.len()
    }
}

// tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Peak;

    fn chain(n: u16) -> Constellation {
        Constellation::from_peaks((0..n).map(|i| Peak::new(i, i)).collect())
    }

    #[test]
    fn test_ids_dense_from_one() {
        let cfg = PipelineConfig::default();
        let mut db = FingerprintDb::new();
        assert_eq!(db.enroll("a", &chain(10), &cfg).unwrap(), 1);
        assert_eq!(db.enroll("b", &chain(12), &cfg).unwrap(), 2);
        assert_eq!(db.song(1).unwrap().name, "a");
        assert_eq!(db.song(2).unwrap().name, "b");
        assert!(db.song(0).is_none());
        assert!(db.song(3).is_none());
    }

    #[test]
    fn test_fingerprint_count_matches_entries() {
        let cfg = PipelineConfig::default();
        let mut db = FingerprintDb::new();
        db.enroll("a", &chain(10), &cfg).unwrap();
        let info = db.song(1).unwrap();
        assert_eq!(info.fingerprint_count, (10 - 4 - 2) * 4);
        assert_eq!(db.num_entries(), info.fingerprint_count);
    }

    #[test]
    fn test_duplicate_pairs_are_kept() {
        // two identical songs double every key's entry list
        let cfg = PipelineConfig::default();
        let mut db = FingerprintDb::new();
        db.enroll("a", &chain(10), &cfg).unwrap();
        db.enroll("b", &chain(10), &cfg).unwrap();
        assert_eq!(db.num_entries(), 2 * (10 - 4 - 2) * 4);
        let some_key = *db.index.keys().next().unwrap();
        assert_eq!(db.lookup(some_key).len() % 2, 0);
    }

    #[test]
    fn test_empty_constellation_enrolls_with_zero_count() {
        let cfg = PipelineConfig::default();
        let mut db = FingerprintDb::new();
        let id = db.enroll("empty", &Constellation::default(), &cfg).unwrap();
        assert_eq!(db.song(id).unwrap().fingerprint_count, 0);
    }

    #[test]
    fn test_unknown_key_lookup_is_empty() {
        let db = FingerprintDb::new();
        assert!(db.lookup(42).is_empty());
    }
}
