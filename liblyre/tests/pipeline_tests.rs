//! End-to-end enrollment and identification scenarios
//!
//! All scenarios run on synthetic spectrograms or hand-built
//! constellations so results are exactly reproducible.

use liblyre_audio::{
    best_match, constellation_map, enroll_spectrogram, fingerprints, identify,
    identify_spectrogram, BandTable, Constellation, FingerprintDb, Peak, PipelineConfig,
    PruneRule, Spectrogram, QUERY_SONG_ID,
};

fn lcg(state: &mut u64) -> u32 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 33) as u32
}

#[test]
fn test_single_peak_song_reports_no_match() {
    // one hot cell; stage A finds it, stage B with a zero coefficient
    // keeps it, and the encoder has nothing to pair it with
    let mut rows = vec![vec![0.0f32; 40]; 16];
    rows[10][20] = 1.0;
    let spec = Spectrogram::from_rows(rows).unwrap();

    let cfg = PipelineConfig::default()
        .with_n_frequencies(16)
        .with_bands(BandTable::new([0, 1, 4, 13, 16, 17, 18]).unwrap())
        .with_prune_window(40)
        .with_prune_rule(PruneRule::StdDev { coef: 0.0 });

    let map = constellation_map(&spec, &cfg).unwrap();
    assert_eq!(map.peaks(), &[Peak::new(10, 20)]);

    let mut db = FingerprintDb::new();
    let id = db.enroll("single", &map, &cfg).unwrap();
    assert_eq!(db.song(id).unwrap().fingerprint_count, 0);

    let ranking = identify_spectrogram(&db, &spec, &cfg).unwrap();
    assert_eq!(ranking[0].count, 0);
    assert!(best_match(&ranking).is_none(), "zero scores are not a match");
}

#[test]
fn test_identical_songs_tie_to_first_enrolled() {
    let map = Constellation::from_peaks((0..60u16).map(|i| Peak::new(i % 200, 3 * i)).collect());
    let cfg = PipelineConfig::default();

    let mut db = FingerprintDb::new();
    db.enroll("A", &map, &cfg).unwrap();
    db.enroll("B", &map, &cfg).unwrap();

    let ranking = identify(&db, fingerprints(&map, QUERY_SONG_ID, &cfg), &cfg);
    assert_eq!(ranking.len(), 2);
    assert!(ranking[0].count > 0);
    assert_eq!(ranking[0].count, ranking[1].count);
    assert_eq!(best_match(&ranking).unwrap().name, "A");
}

#[test]
fn test_noise_robust_identification() {
    let bins = 32;
    let width = 600;
    let band_freqs = [2usize, 6, 10, 14, 20, 28];
    let cfg = PipelineConfig::default()
        .with_n_frequencies(bins)
        .with_bands(BandTable::new([0, 4, 8, 12, 16, 24, 31]).unwrap())
        .with_prune_window(600);

    // the song: equal-amplitude peaks marching through the bands
    let mut rows = vec![vec![0.0f32; width]; bins];
    for (i, t) in (10..width - 10).step_by(10).enumerate() {
        rows[band_freqs[i % band_freqs.len()]][t] = 2.0;
    }
    let song = Spectrogram::from_rows(rows.clone()).unwrap();

    // a decoy on disjoint frequencies so its keys can never collide
    let mut decoy_rows = vec![vec![0.0f32; width]; bins];
    for (i, t) in (10..width - 10).step_by(10).enumerate() {
        decoy_rows[band_freqs[i % band_freqs.len()] + 1][t + 5] = 2.0;
    }
    let decoy = Spectrogram::from_rows(decoy_rows).unwrap();

    let mut db = FingerprintDb::new();
    enroll_spectrogram(&mut db, "song", &song, &cfg).unwrap();
    enroll_spectrogram(&mut db, "decoy", &decoy, &cfg).unwrap();

    // query = song + i.i.d. uniform noise at 0.3x the peak amplitude
    let mut state = 0x5EED;
    for row in rows.iter_mut() {
        for cell in row.iter_mut() {
            *cell += (lcg(&mut state) % 1000) as f32 / 1000.0 * 0.6;
        }
    }
    let noisy = Spectrogram::from_rows(rows).unwrap();

    let ranking = identify_spectrogram(&db, &noisy, &cfg).unwrap();
    let top = best_match(&ranking).expect("noisy query must still match");
    assert_eq!(top.name, "song");
    assert!(top.count > 0);
    assert!(
        top.score > 0.01,
        "normalized score {} too low",
        top.score
    );
}

#[test]
fn test_target_zone_rejects_unrelated_song() {
    // two pseudo-random songs; stray key collisions against the wrong
    // song must never assemble a full target zone at one (a_t, q_t)
    fn random_constellation(seed: u64, peaks: usize) -> Constellation {
        let mut state = seed;
        let mut time = 0u16;
        let mut out = Vec::with_capacity(peaks);
        for _ in 0..peaks {
            time += 1 + (lcg(&mut state) % 3) as u16;
            out.push(Peak::new((lcg(&mut state) % 256) as u16, time));
        }
        Constellation::from_peaks(out)
    }

    let cfg = PipelineConfig::default();
    let song_a = random_constellation(11, 500);
    let song_b = random_constellation(977, 500);

    let mut db = FingerprintDb::new();
    db.enroll("A", &song_a, &cfg).unwrap();
    db.enroll("B", &song_b, &cfg).unwrap();

    let ranking = identify(&db, fingerprints(&song_b, QUERY_SONG_ID, &cfg), &cfg);
    let a = ranking.iter().find(|s| s.name == "A").unwrap();
    let b = ranking.iter().find(|s| s.name == "B").unwrap();
    assert_eq!(a.count, 0, "collisions alone must not score");
    assert!(b.count > 0);
    assert_eq!(best_match(&ranking).unwrap().name, "B");
}

#[test]
fn test_query_excerpt_matches_full_song() {
    // an excerpt aligns at its own offset; target zones still complete
    let full: Vec<Peak> = (0..200u16).map(|i| Peak::new(i % 251, 2 * i)).collect();
    let cfg = PipelineConfig::default();

    let mut db = FingerprintDb::new();
    db.enroll("full", &Constellation::from_peaks(full.clone()), &cfg).unwrap();

    let excerpt = Constellation::from_peaks(full[80..140].to_vec());
    let ranking = identify(&db, fingerprints(&excerpt, QUERY_SONG_ID, &cfg), &cfg);
    let top = best_match(&ranking).expect("excerpt must match");
    assert_eq!(top.name, "full");
}
