// Rating aggregation and score validation.
//
// Averages are computed in integer tenths. Storage reports the count and
// the sum of round(score * 10) per post, and the mean is rounded half-up
// to one decimal from there, so 7.05 always becomes 7.1.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::models::RatingTally;
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Rating count and one-decimal average for a post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingInfo {
    pub count: i64,
    /// None exactly when `count == 0`
    pub average: Option<f64>,
}

impl Default for RatingInfo {
    fn default() -> Self {
        Self {
            count: 0,
            average: None,
        }
    }
}

impl From<RatingTally> for RatingInfo {
    fn from(tally: RatingTally) -> Self {
        Self {
            count: tally.count.max(0),
            average: average_from_tally(tally),
        }
    }
}

/// Mean score rounded half-up to one decimal, or None with no ratings.
pub fn average_from_tally(tally: RatingTally) -> Option<f64> {
    if tally.count <= 0 {
        return None;
    }
    let sum = tally.sum_tenths.max(0);
    // round(sum / count) with halves going up, all in integers
    let tenths = (2 * sum + tally.count) / (2 * tally.count);
    Some(tenths as f64 / 10.0)
}

/// Check that a score lies in [0.0, 10.0] with at most one decimal place.
///
/// Returns the score snapped to its exact tenth so that 7.3 entered as
/// 7.300000000000001 is stored as 7.3.
pub fn validate_score(score: f64) -> ForumResult<f64> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ForumError::Validation(format!(
            "rating score must be between {MIN_SCORE:.1} and {MAX_SCORE:.1}, got {score}"
        )));
    }
    let tenths = score * 10.0;
    if (tenths.round() - tenths).abs() > 1e-9 {
        return Err(ForumError::Validation(format!(
            "rating score must have at most one decimal place, got {score}"
        )));
    }
    Ok(tenths.round() / 10.0)
}

/// Count and average lookups over the ratings table.
#[derive(Clone)]
pub struct RatingAggregator {
    db: Arc<dyn Database>,
}

impl RatingAggregator {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn rating_info(&self, post_id: i64) -> ForumResult<RatingInfo> {
        let tally = self.db.rating_tally(post_id).await?;
        Ok(tally.into())
    }

    /// Rating info for every requested post, including unrated ones
    /// (`{count: 0, average: None}`). Empty input makes no query.
    pub async fn rating_info_batch(
        &self,
        post_ids: &[i64],
    ) -> ForumResult<HashMap<i64, RatingInfo>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let tallies = self.db.rating_tally_batch(post_ids).await?;
        debug!(posts = post_ids.len(), rated = tallies.len(), "batched rating tallies");

        Ok(post_ids
            .iter()
            .map(|id| {
                let info = tallies
                    .get(id)
                    .copied()
                    .map(RatingInfo::from)
                    .unwrap_or_default();
                (*id, info)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(count: i64, sum_tenths: i64) -> RatingTally {
        RatingTally { count, sum_tenths }
    }

    #[test]
    fn test_average_none_without_ratings() {
        assert_eq!(average_from_tally(tally(0, 0)), None);
    }

    #[test]
    fn test_average_of_two_scores() {
        // 8.0 and 6.0
        assert_eq!(average_from_tally(tally(2, 140)), Some(7.0));
    }

    #[test]
    fn test_average_rounds_half_up() {
        // 7.0 and 7.1 -> mean 7.05
        assert_eq!(average_from_tally(tally(2, 141)), Some(7.1));
        // 7.0, 7.0, 7.1 -> mean 7.0333
        assert_eq!(average_from_tally(tally(3, 211)), Some(7.0));
        // 7.0, 7.1, 7.1 -> mean 7.0666
        assert_eq!(average_from_tally(tally(3, 212)), Some(7.1));
    }

    #[test]
    fn test_average_extremes() {
        assert_eq!(average_from_tally(tally(4, 400)), Some(10.0));
        assert_eq!(average_from_tally(tally(5, 0)), Some(0.0));
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(7.3).is_ok());
        assert!(validate_score(10.0).is_ok());
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(7.25).is_err());
        assert!(validate_score(10.1).is_err());
        assert!(validate_score(-0.1).is_err());
        assert!(validate_score(f64::NAN).is_err());
        assert!(validate_score(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_score_snaps_to_tenth() {
        let score = validate_score(0.1 + 0.2).unwrap();
        assert_eq!(score, 0.3);
    }

    #[test]
    fn test_validation_error_kind() {
        match validate_score(11.0) {
            Err(ForumError::Validation(msg)) => assert!(msg.contains("between")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
