// Engagement statistics: per-post counts and rating aggregates.
//
// Every number here is recomputed from storage on each call; nothing is
// cached. The batched paths issue a fixed number of grouped queries no
// matter how many posts are asked for, and never touch storage for an
// empty id set.

pub mod composer;
pub mod counting;
pub mod rating;

pub use composer::{PostWithStats, StatsComposer, StatsRecord};
pub use counting::CountingStore;
pub use rating::{RatingAggregator, RatingInfo};
