// Collections: saving posts into a user's favorites folders.
//
// Which folder a bare "collect" lands in is decided by
// `select_target_collection`: the user's default folder if they have one,
// otherwise their oldest folder, otherwise a new default folder.

use std::sync::Arc;

use tracing::info;

use super::{require_post, require_user, Recorded};
use crate::db::models::{Collection, CollectionItem, DEFAULT_COLLECTION_NAME};
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

/// Where a collected post should go.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetCollection {
    Existing(Collection),
    /// The user has no collections yet
    CreateDefault,
}

pub fn select_target_collection(collections: &[Collection]) -> TargetCollection {
    if let Some(default) = collections.iter().find(|c| c.is_default) {
        return TargetCollection::Existing(default.clone());
    }
    collections
        .iter()
        .min_by_key(|c| (c.created_at, c.id))
        .cloned()
        .map_or(TargetCollection::CreateDefault, TargetCollection::Existing)
}

#[derive(Clone)]
pub struct CollectionService {
    db: Arc<dyn Database>,
}

impl CollectionService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Save someone else's post. Collecting the same post again returns the
    /// existing item, wherever it was filed.
    pub async fn collect_post(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> ForumResult<Recorded<CollectionItem>> {
        require_user(self.db.as_ref(), user_id).await?;
        let post = require_post(self.db.as_ref(), post_id).await?;
        if post.author_id == user_id {
            return Err(ForumError::Conflict("cannot collect your own post".into()));
        }

        let collections = self.db.get_collections_by_user(user_id).await?;
        let target = match select_target_collection(&collections) {
            TargetCollection::Existing(collection) => collection,
            TargetCollection::CreateDefault => {
                let created = self
                    .db
                    .ensure_default_collection(user_id, DEFAULT_COLLECTION_NAME)
                    .await?;
                info!(user_id, collection_id = created.id, "using default collection");
                created
            }
        };

        let (record, created) = self
            .db
            .insert_collection_item(user_id, post_id, target.id)
            .await?;
        if created {
            info!(user_id, post_id, collection_id = target.id, "post collected");
        }
        Ok(Recorded { record, created })
    }

    /// Create a named, non-default collection.
    pub async fn create_collection(&self, user_id: i64, name: &str) -> ForumResult<Collection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForumError::Validation("collection name is empty".into()));
        }
        require_user(self.db.as_ref(), user_id).await?;

        let collection = self.db.create_collection(user_id, name, false).await?;
        info!(user_id, collection_id = collection.id, name, "collection created");
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn collection(id: i64, age_days: i64, is_default: bool) -> Collection {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let created_at = base - Duration::days(age_days);
        Collection {
            id,
            user_id: 1,
            name: format!("c{id}"),
            is_default,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_no_collections_creates_default() {
        assert_eq!(select_target_collection(&[]), TargetCollection::CreateDefault);
    }

    #[test]
    fn test_default_preferred_over_older() {
        let cols = vec![collection(1, 30, false), collection(2, 1, true)];
        match select_target_collection(&cols) {
            TargetCollection::Existing(c) => assert_eq!(c.id, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_oldest_when_no_default() {
        // Input order is deliberately not creation order
        let cols = vec![collection(3, 2, false), collection(4, 10, false), collection(5, 5, false)];
        match select_target_collection(&cols) {
            TargetCollection::Existing(c) => assert_eq!(c.id, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_same_timestamp_breaks_on_id() {
        let cols = vec![collection(9, 3, false), collection(6, 3, false)];
        match select_target_collection(&cols) {
            TargetCollection::Existing(c) => assert_eq!(c.id, 6),
            other => panic!("unexpected {other:?}"),
        }
    }
}
