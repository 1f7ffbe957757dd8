//! Follow repository.
//!
//! Every write here is a single statement whose affected-row count tells the
//! caller whether it won: inserts skip on the `(follower_id, followed_id)`
//! unique index, updates are guarded by the state they expect to replace.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    Follow,
    follow::{self, BlockedPair, FollowStatus},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, OnConflict},
};
use signalhub_common::{AppError, AppResult};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a relationship by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow::Model>> {
        Follow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the row for an ordered `(follower, followed)` pair.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a row unless one already exists for the pair.
    ///
    /// Returns `false` when another writer got there first.
    pub async fn insert_if_absent(&self, model: follow::ActiveModel) -> AppResult<bool> {
        let inserted = Follow::insert(model)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Apply `changes` to row `id` only if it is still in the expected state.
    ///
    /// Returns `false` when the row moved on (or vanished) in the meantime.
    pub async fn compare_and_set(
        &self,
        id: &str,
        expected_status: FollowStatus,
        expected_active: bool,
        changes: follow::ActiveModel,
    ) -> AppResult<bool> {
        let result = Follow::update_many()
            .set(changes)
            .filter(follow::Column::Id.eq(id))
            .filter(follow::Column::Status.eq(expected_status))
            .filter(follow::Column::IsActive.eq(expected_active))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the row storing a block. Returns `false` if there was none.
    pub async fn delete_block(&self, pair: BlockedPair<'_>) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(pair.follower_id()))
            .filter(follow::Column::FollowedId.eq(pair.followed_id()))
            .filter(follow::Column::Status.eq(FollowStatus::Blocked))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Live follow edges pointing at `user_id`, most recently accepted first.
    pub async fn find_followers(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Accepted))
            .filter(follow::Column::IsActive.eq(true))
            .order_by_desc(follow::Column::AcceptedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Live follow edges leaving `user_id`, most recently accepted first.
    pub async fn find_following(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Accepted))
            .filter(follow::Column::IsActive.eq(true))
            .order_by_desc(follow::Column::AcceptedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending requests addressed to `user_id`, newest first.
    pub async fn find_pending_received(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Pending))
            .order_by_desc(follow::Column::RequestedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending requests sent by `user_id`, newest first.
    pub async fn find_pending_sent(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Pending))
            .order_by_desc(follow::Column::RequestedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count live followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Accepted))
            .filter(follow::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users a user live-follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Accepted))
            .filter(follow::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending requests addressed to a user.
    pub async fn count_pending_received(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending requests sent by a user.
    pub async fn count_pending_sent(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .filter(follow::Column::Status.eq(FollowStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Live follower counts for several users in one grouped query.
    ///
    /// Users without followers are absent from the map.
    pub async fn count_followers_by_users(
        &self,
        user_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Follow::find()
            .select_only()
            .column(follow::Column::FollowedId)
            .column_as(Expr::col(follow::Column::Id).count(), "count")
            .filter(follow::Column::FollowedId.is_in(user_ids.iter().map(String::as_str)))
            .filter(follow::Column::Status.eq(FollowStatus::Accepted))
            .filter(follow::Column::IsActive.eq(true))
            .group_by(follow::Column::FollowedId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    /// Rows from `follower_id` to any of `followed_ids`.
    pub async fn find_outbound(
        &self,
        follower_id: &str,
        followed_ids: &[String],
    ) -> AppResult<Vec<follow::Model>> {
        if followed_ids.is_empty() {
            return Ok(vec![]);
        }

        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.is_in(followed_ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
