//! Database, matcher, and ranking

pub mod database;
pub mod matcher;

pub use database::{FingerprintDb, SongInfo};
pub use matcher::{best_match, identify, MatchScore};
