// Per-interaction-type counts for posts.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::db::models::InteractionKind;
use crate::db::Database;
use crate::error::ForumResult;

/// Read-only count lookups over the interaction tables.
#[derive(Clone)]
pub struct CountingStore {
    db: Arc<dyn Database>,
}

impl CountingStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Number of `kind` records attached to one post. Zero for a post with
    /// no records (or no such post).
    pub async fn count_for(&self, kind: InteractionKind, post_id: i64) -> ForumResult<i64> {
        Ok(self.db.count_interactions(kind, post_id).await?)
    }

    /// One grouped query for many posts. Posts with zero records are absent
    /// from the map; an empty id set returns an empty map without a query.
    pub async fn count_batch(
        &self,
        kind: InteractionKind,
        post_ids: &[i64],
    ) -> ForumResult<HashMap<i64, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let counts = self.db.count_interactions_batch(kind, post_ids).await?;
        debug!(kind = %kind, posts = post_ids.len(), hits = counts.len(), "batched count");
        Ok(counts)
    }
}
