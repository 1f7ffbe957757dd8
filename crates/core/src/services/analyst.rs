//! Analyst directory for traders.

use std::collections::HashMap;

use serde::Serialize;
use signalhub_common::AppResult;
use signalhub_db::{
    entities::{follow, user},
    repositories::{FollowRepository, TradingSignalRepository, UserRepository},
};

/// The caller's outbound relationship to a listed analyst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalystFollowStatus {
    pub is_following: bool,
    pub is_pending_sent: bool,
    pub is_blocked_by_them: bool,
}

impl AnalystFollowStatus {
    fn from_row(row: Option<&follow::Model>) -> Self {
        row.map_or_else(Self::default, |f| Self {
            is_following: f.is_following(),
            is_pending_sent: f.is_pending(),
            is_blocked_by_them: f.is_blocked(),
        })
    }
}

/// One entry of the analyst listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalystEntry {
    pub user: user::Model,
    pub followers_count: u64,
    pub signals_count: u64,
    pub follow_status: Option<AnalystFollowStatus>,
}

/// Analyst service for business logic.
#[derive(Clone)]
pub struct AnalystService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    signal_repo: TradingSignalRepository,
    limit: u64,
}

impl AnalystService {
    /// Create a new analyst service returning at most `limit` analysts.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        signal_repo: TradingSignalRepository,
        limit: u64,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            signal_repo,
            limit,
        }
    }

    /// List active analysts, newest first.
    ///
    /// With `include_status`, each entry also carries `viewer_id`'s outbound
    /// relationship, loaded in one query for the whole page.
    pub async fn list(&self, viewer_id: &str, include_status: bool) -> AppResult<Vec<AnalystEntry>> {
        let analysts = self.user_repo.find_active_analysts(self.limit).await?;
        let ids: Vec<String> = analysts.iter().map(|u| u.id.clone()).collect();

        let followers = self.follow_repo.count_followers_by_users(&ids).await?;
        let signals = self.signal_repo.count_by_analysts(&ids).await?;

        let outbound: Option<HashMap<String, follow::Model>> = if include_status {
            Some(
                self.follow_repo
                    .find_outbound(viewer_id, &ids)
                    .await?
                    .into_iter()
                    .map(|f| (f.followed_id.clone(), f))
                    .collect(),
            )
        } else {
            None
        };

        tracing::debug!(count = analysts.len(), include_status, "Listed analysts");

        Ok(analysts
            .into_iter()
            .map(|user| AnalystEntry {
                followers_count: followers.get(&user.id).copied().unwrap_or(0),
                signals_count: signals.get(&user.id).copied().unwrap_or(0),
                follow_status: outbound
                    .as_ref()
                    .map(|rows| AnalystFollowStatus::from_row(rows.get(&user.id))),
                user,
            })
            .collect())
    }
}

/// Parse the `include_status` query flag.
#[must_use]
pub fn parse_include_status(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use signalhub_db::entities::{follow::FollowStatus, user::UserRole};
    use std::sync::Arc;

    fn mock_analyst(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            name: None,
            avatar_url: None,
            role: UserRole::Analyst,
            is_active: true,
            is_subscribed: false,
            is_verified: true,
            token: None,
            password_hash: String::new(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_parse_include_status() {
        assert!(parse_include_status(Some("1")));
        assert!(parse_include_status(Some("TRUE")));
        assert!(parse_include_status(Some("yes")));
        assert!(!parse_include_status(Some("0")));
        assert!(!parse_include_status(Some("")));
        assert!(!parse_include_status(None));
    }

    #[test]
    fn test_follow_status_from_row() {
        let row = follow::Model {
            id: "f1".to_string(),
            follower_id: "t".to_string(),
            followed_id: "a".to_string(),
            status: FollowStatus::Pending,
            is_active: false,
            requested_at: None,
            accepted_at: None,
            rejected_at: None,
            unfollowed_at: None,
        };

        assert_eq!(
            AnalystFollowStatus::from_row(Some(&row)),
            AnalystFollowStatus {
                is_pending_sent: true,
                ..Default::default()
            }
        );
        assert_eq!(
            AnalystFollowStatus::from_row(None),
            AnalystFollowStatus::default()
        );
    }

    #[tokio::test]
    async fn test_list_without_analysts_skips_counts() {
        let service = AnalystService::new(
            UserRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<user::Model>::new()])
                    .into_connection(),
            )),
            FollowRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            TradingSignalRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            200,
        );

        let entries = service.list("viewer", true).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_status_omitted_unless_requested() {
        // Grouped counts come back empty: nobody follows and nothing published yet.
        let service = AnalystService::new(
            UserRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[mock_analyst("a1")]])
                    .into_connection(),
            )),
            FollowRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                    .into_connection(),
            )),
            TradingSignalRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                    .into_connection(),
            )),
            200,
        );

        let entries = service.list("viewer", false).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].followers_count, 0);
        assert_eq!(entries[0].signals_count, 0);
        assert!(entries[0].follow_status.is_none());
    }
}
