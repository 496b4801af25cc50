// photoforum: engagement statistics and hot-score ranking for a photo forum.
//
// This is the library root. Storage sits at the bottom (db), the stats
// layer aggregates engagement from it, ranking orders posts by hot score,
// and engagement holds the write-side rules.

pub mod config;
pub mod db;
pub mod engagement;
pub mod error;
pub mod output;
pub mod ranking;
pub mod stats;
pub mod status;

pub use error::{ForumError, ForumResult};
