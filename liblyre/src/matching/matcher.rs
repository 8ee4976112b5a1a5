//! Two-level histogram matcher and ranking
//!
//! A single key collision means nothing: 48-bit keys collide routinely
//! in a multi-million-entry database. The matcher first counts, per
//! `(song, db_anchor_time, query_anchor_time)`, how many query
//! fingerprints align, then credits a song only for buckets that reach
//! the full target-zone size. Keying on both times rather than their
//! difference keeps self-similar songs from stacking distinct offsets.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::config::PipelineConfig;
use crate::core::types::SongId;
use crate::fingerprint::IndexEntry;
use crate::matching::database::FingerprintDb;

/// Per-song match evidence, ready for ranking
#[derive(Debug, Clone, Serialize)]
pub struct MatchScore {
    pub song_id: SongId,
    pub name: String,
    /// Summed counts of full target-zone buckets
    pub count: u32,
    /// The song's total fingerprint count, for normalization
    pub num_hashes: usize,
    /// `count / num_hashes^p`
    pub score: f32,
}

/// Coincidence bucket key: `(song_id << 32) | (db_anchor << 16) | query_anchor`
fn coincidence_key(song_id: SongId, db_anchor: u16, query_anchor: u16) -> u64 {
    ((song_id as u64) << 32) | ((db_anchor as u64) << 16) | query_anchor as u64
}

/// Match a query fingerprint stream against the database
///
/// Returns one entry per enrolled song, ranked best first: count
/// descending, normalized score breaking ties, song id breaking exact
/// ties deterministically. Fingerprint order does not matter.
pub fn identify<I>(db: &FingerprintDb, query: I, cfg: &PipelineConfig) -> Vec<MatchScore>
where
    I: IntoIterator<Item = (u64, IndexEntry)>,
{
    // level one: coincidence counts, saturating at u8
    let mut histogram: HashMap<u64, u8> = HashMap::new();
    let mut query_prints = 0usize;
    for (key, query_entry) in query {
        query_prints += 1;
        for hit in db.lookup(key) {
            let bucket = coincidence_key(hit.song_id, hit.anchor_time, query_entry.anchor_time);
            let count = histogram.entry(bucket).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
    log::debug!(
        "matcher: {} query fingerprints, {} coincidence buckets",
        query_prints,
        histogram.len()
    );

    // level two: only full target zones score
    let mut counts: HashMap<SongId, u32> = HashMap::new();
    for (&bucket, &count) in &histogram {
        if count as usize >= cfg.target_zone {
            let song_id = (bucket >> 32) as SongId;
            *counts.entry(song_id).or_insert(0) += count as u32;
        }
    }

    let mut scores: Vec<MatchScore> = db
        .songs()
        .iter()
        .map(|info| {
            let count = counts.get(&info.id).copied().unwrap_or(0);
            MatchScore {
                song_id: info.id,
                name: info.name.clone(),
                count,
                num_hashes: info.fingerprint_count,
                score: normalized_score(count, info.fingerprint_count, cfg.norm_pow),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.song_id.cmp(&b.song_id))
    });
    scores
}

/// Top of the ranking, or `None` when nothing scored at all
///
/// An arbitrary top-of-ties with every count at zero is not a match.
pub fn best_match(scores: &[MatchScore]) -> Option<&MatchScore> {
    scores.first().filter(|top| top.count > 0)
}

fn normalized_score(count: u32, num_hashes: usize, norm_pow: f32) -> f32 {
    if num_hashes == 0 {
        return 0.0;
    }
    count as f32 / (num_hashes as f32).powf(norm_pow)
}

// tests
