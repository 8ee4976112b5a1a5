pub mod config;
pub mod types;

pub use config::{BandTable, PipelineConfig, PruneRule, NUM_BANDS};
pub use types::{LyreResult, Peak, RawPeak, SongId, PEAK_FILE_EXT, QUERY_SONG_ID};
