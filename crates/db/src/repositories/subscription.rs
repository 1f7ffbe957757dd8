//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use signalhub_common::{AppError, AppResult};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the subscription of a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a subscription unless the user already has one.
    pub async fn insert_if_absent(&self, model: subscription::ActiveModel) -> AppResult<bool> {
        let inserted = Subscription::insert(model)
            .on_conflict(
                OnConflict::column(subscription::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Update a subscription.
    pub async fn update(&self, model: subscription::ActiveModel) -> AppResult<subscription::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::subscription::{PlanType, SubscriptionStatus};
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_subscription(user_id: &str) -> subscription::Model {
        let now = Utc::now().fixed_offset();
        subscription::Model {
            id: "sub1".to_string(),
            user_id: user_id.to_string(),
            plan_type: PlanType::FreeTrial,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: now + Duration::days(7),
            is_trial: true,
            created_at: now,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let sub = create_test_subscription("user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub.clone()]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.find_by_user("user1").await.unwrap();

        assert_eq!(result, Some(sub));
    }

    #[tokio::test]
    async fn test_insert_if_absent_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let now = Utc::now().fixed_offset();
        let model = subscription::ActiveModel {
            id: Set("sub2".to_string()),
            user_id: Set("user1".to_string()),
            plan_type: Set(PlanType::FreeTrial),
            status: Set(SubscriptionStatus::Active),
            start_date: Set(now),
            end_date: Set(now + Duration::days(7)),
            is_trial: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        };

        assert!(!repo.insert_if_absent(model).await.unwrap());
    }

    #[tokio::test]
    async fn test_update() {
        let mut sub = create_test_subscription("user1");
        sub.status = SubscriptionStatus::Cancelled;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub.clone()]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let model = subscription::ActiveModel {
            id: Set(sub.id.clone()),
            status: Set(SubscriptionStatus::Cancelled),
            ..Default::default()
        };
        let updated = repo.update(model).await.unwrap();

        assert_eq!(updated.status, SubscriptionStatus::Cancelled);
    }
}
