// Hot-score ranking and the read paths built on it.

pub mod hot;
pub mod leaderboard;

pub use hot::{hot_score, rank_by_hot_score, HotWeights, RankedPost};
pub use leaderboard::{LeaderboardService, Period};
