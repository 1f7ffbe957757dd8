//! Muting service.

use chrono::Utc;
use sea_orm::Set;
use signalhub_common::{AppError, AppResult, IdGenerator};
use signalhub_db::{
    entities::mute,
    repositories::{MuteRepository, UserRepository},
};

use super::follow::MAX_ATTEMPTS;

/// Muting service for business logic.
#[derive(Clone)]
pub struct MutingService {
    mute_repo: MuteRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl MutingService {
    /// Create a new muting service.
    #[must_use]
    pub const fn new(mute_repo: MuteRepository, user_repo: UserRepository) -> Self {
        Self {
            mute_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Mute a user. Returns the mute and whether it is new.
    pub async fn mute(&self, muter_id: &str, muted_id: &str) -> AppResult<(mute::Model, bool)> {
        if muter_id == muted_id {
            return Err(AppError::SelfAction("You cannot mute yourself.".to_string()));
        }

        self.user_repo.get_by_id(muted_id).await?;

        for _ in 0..MAX_ATTEMPTS {
            if let Some(existing) = self.mute_repo.find_by_pair(muter_id, muted_id).await? {
                tracing::debug!(muter_id = %muter_id, muted_id = %muted_id, "User already muted");
                return Ok((existing, false));
            }

            let model = mute::Model {
                id: self.id_gen.generate(),
                muter_id: muter_id.to_string(),
                muted_id: muted_id.to_string(),
                muted_at: Utc::now().fixed_offset(),
            };
            let active = mute::ActiveModel {
                id: Set(model.id.clone()),
                muter_id: Set(model.muter_id.clone()),
                muted_id: Set(model.muted_id.clone()),
                muted_at: Set(model.muted_at),
            };

            if self.mute_repo.insert_if_absent(active).await? {
                tracing::info!(muter_id = %muter_id, muted_id = %muted_id, "User muted");
                return Ok((model, true));
            }
            tracing::warn!(muter_id = %muter_id, muted_id = %muted_id, "Lost insert race on mute, re-reading");
        }

        Err(AppError::Conflict(
            "Mute changed concurrently, try again.".to_string(),
        ))
    }

    /// Unmute a user.
    pub async fn unmute(&self, muter_id: &str, muted_id: &str) -> AppResult<()> {
        if !self.mute_repo.delete_by_pair(muter_id, muted_id).await? {
            return Err(AppError::NotMuted);
        }

        tracing::info!(muter_id = %muter_id, muted_id = %muted_id, "User unmuted");
        Ok(())
    }

    /// Check if `muter_id` has muted `muted_id`.
    pub async fn is_muted(&self, muter_id: &str, muted_id: &str) -> AppResult<bool> {
        self.mute_repo.is_muted(muter_id, muted_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use signalhub_db::entities::user::{self, UserRole};
    use std::sync::Arc;

    fn mock_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            name: None,
            avatar_url: None,
            role: UserRole::Trader,
            is_active: true,
            is_subscribed: false,
            is_verified: false,
            token: None,
            password_hash: String::new(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn mock_mute(muter_id: &str, muted_id: &str) -> mute::Model {
        mute::Model {
            id: "m1".to_string(),
            muter_id: muter_id.to_string(),
            muted_id: muted_id.to_string(),
            muted_at: Utc::now().into(),
        }
    }

    fn service(mutes: MockDatabase, users: MockDatabase) -> MutingService {
        MutingService::new(
            MuteRepository::new(Arc::new(mutes.into_connection())),
            UserRepository::new(Arc::new(users.into_connection())),
        )
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_mute_self() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.mute("alice", "alice").await;

        assert!(matches!(result, Err(AppError::SelfAction(_))));
    }

    #[tokio::test]
    async fn test_mute_new() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<mute::Model>::new()])
                .append_exec_results([exec(1)]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("bob")]]),
        );

        let (mute, created) = service.mute("alice", "bob").await.unwrap();

        assert!(created);
        assert_eq!(mute.muter_id, "alice");
        assert_eq!(mute.muted_id, "bob");
    }

    #[tokio::test]
    async fn test_mute_is_idempotent() {
        let existing = mock_mute("alice", "bob");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("bob")]]),
        );

        let (mute, created) = service.mute("alice", "bob").await.unwrap();

        assert!(!created);
        assert_eq!(mute, existing);
    }

    #[tokio::test]
    async fn test_unmute_not_muted() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.unmute("alice", "bob").await;

        assert!(matches!(result, Err(AppError::NotMuted)));
    }

    #[tokio::test]
    async fn test_unmute() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(1)]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(service.unmute("alice", "bob").await.is_ok());
    }
}
