//! Mute repository.

use std::sync::Arc;

use crate::entities::{Mute, mute};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};
use signalhub_common::{AppError, AppResult};

/// Mute repository for database operations.
#[derive(Clone)]
pub struct MuteRepository {
    db: Arc<DatabaseConnection>,
}

impl MuteRepository {
    /// Create a new mute repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a mute by muter and muted.
    pub async fn find_by_pair(
        &self,
        muter_id: &str,
        muted_id: &str,
    ) -> AppResult<Option<mute::Model>> {
        Mute::find()
            .filter(mute::Column::MuterId.eq(muter_id))
            .filter(mute::Column::MutedId.eq(muted_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has muted another user.
    pub async fn is_muted(&self, muter_id: &str, muted_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(muter_id, muted_id).await?.is_some())
    }

    /// Insert a mute unless the pair is already muted.
    pub async fn insert_if_absent(&self, model: mute::ActiveModel) -> AppResult<bool> {
        let inserted = Mute::insert(model)
            .on_conflict(
                OnConflict::columns([mute::Column::MuterId, mute::Column::MutedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Delete a mute by pair. Returns `false` if there was nothing to delete.
    pub async fn delete_by_pair(&self, muter_id: &str, muted_id: &str) -> AppResult<bool> {
        let result = Mute::delete_many()
            .filter(mute::Column::MuterId.eq(muter_id))
            .filter(mute::Column::MutedId.eq(muted_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Mutes created by a user, most recent first.
    pub async fn find_by_muter(&self, muter_id: &str) -> AppResult<Vec<mute::Model>> {
        Mute::find()
            .filter(mute::Column::MuterId.eq(muter_id))
            .order_by_desc(mute::Column::MutedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count mutes created by a user.
    pub async fn count_by_muter(&self, muter_id: &str) -> AppResult<u64> {
        Mute::find()
            .filter(mute::Column::MuterId.eq(muter_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
