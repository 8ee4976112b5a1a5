//! lyre: constellation-map audio fingerprinting
//!
//! Identifies short audio excerpts against a library of enrolled songs.
//! A spectrogram is reduced to a sparse constellation of salient
//! time-frequency peaks, peak pairs are packed into 48-bit fingerprint
//! keys, and a query is matched by counting coincident time-offset
//! alignments per song, requiring full target zones before anything
//! scores.

pub mod constellation;
pub mod core;
pub mod fingerprint;
pub mod matching;
pub mod source;
pub mod spectrogram;

mod reader;
mod writer;

pub use crate::core::{
    BandTable, LyreResult, Peak, PipelineConfig, PruneRule, RawPeak, SongId, NUM_BANDS,
    PEAK_FILE_EXT, QUERY_SONG_ID,
};
pub use constellation::{constellation_map, Constellation};
pub use fingerprint::{fingerprints, pack_key, unpack_key, IndexEntry};
pub use matching::{best_match, identify, FingerprintDb, MatchScore, SongInfo};
pub use reader::Reader;
pub use spectrogram::{read_spectrogram_file, Spectrogram};
pub use writer::Writer;

// one-call api

/// Extract, encode, and enroll one spectrogram as a new song
pub fn enroll_spectrogram(
    db: &mut FingerprintDb,
    name: &str,
    spec: &Spectrogram,
    cfg: &PipelineConfig,
) -> LyreResult<SongId> {
    let map = constellation_map(spec, cfg)?;
    db.enroll(name, &map, cfg)
}

/// Extract and match one query spectrogram, returning the full ranking
pub fn identify_spectrogram(
    db: &FingerprintDb,
    spec: &Spectrogram,
    cfg: &PipelineConfig,
) -> LyreResult<Vec<MatchScore>> {
    let map = constellation_map(spec, cfg)?;
    let query = fingerprints(&map, QUERY_SONG_ID, cfg);
    Ok(identify(db, query, cfg))
}

// tests

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_spectrogram(bins: usize, width: usize, hot: &[(usize, usize)]) -> Spectrogram {
        let mut rows = vec![vec![0.0f32; width]; bins];
        for &(f, t) in hot {
            rows[f][t] = 1.0;
        }
        Spectrogram::from_rows(rows).unwrap()
    }

    #[test]
    fn test_enroll_then_identify_self() {
        let cfg = PipelineConfig::default()
            .with_n_frequencies(16)
            .with_bands(BandTable::new([0, 1, 4, 8, 10, 12, 14]).unwrap())
            .with_prune_rule(PruneRule::StdDev { coef: 0.0 })
            .with_target_zone(2)
            .with_target_offset(0);

        let hot: Vec<(usize, usize)> = (1..30).map(|t| (1 + (t % 8), 2 * t)).collect();
        let spec = tone_spectrogram(16, 64, &hot);

        let mut db = FingerprintDb::new();
        let id = enroll_spectrogram(&mut db, "tone", &spec, &cfg).unwrap();
        assert_eq!(id, 1);

        let ranking = identify_spectrogram(&db, &spec, &cfg).unwrap();
        let top = best_match(&ranking).expect("self query must match");
        assert_eq!(top.song_id, 1);
    }

    #[test]
    fn test_identify_on_empty_database() {
        let cfg = PipelineConfig::default().with_n_frequencies(16);
        let spec = tone_spectrogram(16, 8, &[(2, 3)]);
        let db = FingerprintDb::new();
        let ranking = identify_spectrogram(&db, &spec, &cfg).unwrap();
        assert!(ranking.is_empty());
        assert!(best_match(&ranking).is_none());
    }
}
