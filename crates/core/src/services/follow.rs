//! Follow service.
//!
//! Owns the follow lifecycle between two users:
//!
//! ```text
//!   (none) --request--> PENDING --accept--> ACCEPTED(active) --unfollow--> ACCEPTED(inactive)
//!                          |                                                    |
//!                          +--reject--> REJECTED --request--> PENDING <--request-+
//!
//!   any state --block (reverse slot)--> BLOCKED --unblock--> (deleted)
//! ```
//!
//! Writes are single guarded statements. When a guard fails because another
//! request changed the row first, the row is re-read and the decision made
//! again, up to [`MAX_ATTEMPTS`] times.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use signalhub_common::{AppError, AppResult, IdGenerator};
use signalhub_db::{
    entities::follow::{self, BlockedPair, FollowStatus},
    repositories::{FollowRepository, UserRepository},
};

/// Bound on re-reads after losing a write race.
pub const MAX_ATTEMPTS: usize = 3;

/// What `send_request` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new pending request was stored.
    Created(follow::Model),
    /// A rejected or unfollowed row was reset to pending.
    Rerequested(follow::Model),
    /// A request was already pending; nothing changed.
    AlreadyPending(follow::Model),
    /// The follow is already live; nothing changed.
    AlreadyFollowing(follow::Model),
}

impl RequestOutcome {
    /// The relationship row after the call.
    #[must_use]
    pub const fn follow(&self) -> &follow::Model {
        match self {
            Self::Created(f)
            | Self::Rerequested(f)
            | Self::AlreadyPending(f)
            | Self::AlreadyFollowing(f) => f,
        }
    }

    /// Whether a request is now outstanding that was not before.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Rerequested(_))
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Created(_) | Self::Rerequested(_) => "Follow request sent.",
            Self::AlreadyPending(_) => "Follow request already sent.",
            Self::AlreadyFollowing(_) => "You are already following this user.",
        }
    }

    pub fn into_follow(self) -> follow::Model {
        match self {
            Self::Created(f)
            | Self::Rerequested(f)
            | Self::AlreadyPending(f)
            | Self::AlreadyFollowing(f) => f,
        }
    }
}

/// Decision for a follow request given the current row for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPlan {
    Insert,
    Reset,
    AlreadyPending,
    AlreadyFollowing,
    Blocked,
}

/// Decide what a follow request does to `existing`.
#[must_use]
pub fn plan_request(existing: Option<&follow::Model>) -> RequestPlan {
    let Some(row) = existing else {
        return RequestPlan::Insert;
    };

    match (row.status, row.is_active) {
        (FollowStatus::Pending, _) => RequestPlan::AlreadyPending,
        (FollowStatus::Accepted, true) => RequestPlan::AlreadyFollowing,
        (FollowStatus::Accepted, false) | (FollowStatus::Rejected, _) => RequestPlan::Reset,
        (FollowStatus::Blocked, _) => RequestPlan::Blocked,
    }
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask to follow `target_id`.
    pub async fn send_request(&self, actor_id: &str, target_id: &str) -> AppResult<RequestOutcome> {
        if actor_id == target_id {
            return Err(AppError::SelfAction(
                "You cannot follow yourself.".to_string(),
            ));
        }

        self.user_repo.get_by_id(target_id).await?;

        for _ in 0..MAX_ATTEMPTS {
            let existing = self.follow_repo.find_by_pair(actor_id, target_id).await?;

            match plan_request(existing.as_ref()) {
                RequestPlan::Insert => {
                    let row = self.new_row(actor_id, target_id, FollowStatus::Pending);
                    if self.follow_repo.insert_if_absent(insertable(&row)).await? {
                        tracing::info!(
                            follower_id = %actor_id,
                            followed_id = %target_id,
                            "Follow request created"
                        );
                        return Ok(RequestOutcome::Created(row));
                    }
                    tracing::warn!(
                        follower_id = %actor_id,
                        followed_id = %target_id,
                        "Lost insert race on follow request, re-reading"
                    );
                }
                RequestPlan::Reset => {
                    let Some(mut row) = existing else { continue };
                    let now = now();
                    let changes = follow::ActiveModel {
                        status: Set(FollowStatus::Pending),
                        is_active: Set(false),
                        requested_at: Set(Some(now)),
                        accepted_at: Set(None),
                        rejected_at: Set(None),
                        unfollowed_at: Set(None),
                        ..Default::default()
                    };
                    if self
                        .follow_repo
                        .compare_and_set(&row.id, row.status, row.is_active, changes)
                        .await?
                    {
                        tracing::info!(
                            follow_id = %row.id,
                            previous_status = ?row.status,
                            "Follow re-requested"
                        );
                        row.status = FollowStatus::Pending;
                        row.is_active = false;
                        row.requested_at = Some(now);
                        row.accepted_at = None;
                        row.rejected_at = None;
                        row.unfollowed_at = None;
                        return Ok(RequestOutcome::Rerequested(row));
                    }
                    tracing::warn!(follow_id = %row.id, "Lost update race on follow request, re-reading");
                }
                RequestPlan::AlreadyPending => {
                    tracing::debug!(follower_id = %actor_id, followed_id = %target_id, "Follow request already pending");
                    if let Some(row) = existing {
                        return Ok(RequestOutcome::AlreadyPending(row));
                    }
                }
                RequestPlan::AlreadyFollowing => {
                    tracing::debug!(follower_id = %actor_id, followed_id = %target_id, "Already following");
                    if let Some(row) = existing {
                        return Ok(RequestOutcome::AlreadyFollowing(row));
                    }
                }
                RequestPlan::Blocked => {
                    return Err(AppError::Forbidden(
                        "You cannot follow this user.".to_string(),
                    ));
                }
            }
        }

        Err(contended())
    }

    /// Accept a pending request addressed to `caller_id`.
    pub async fn accept(&self, follow_id: &str, caller_id: &str) -> AppResult<follow::Model> {
        for _ in 0..MAX_ATTEMPTS {
            let mut row = self.pending_for(follow_id, caller_id, "accept").await?;
            let now = now();
            let changes = follow::ActiveModel {
                status: Set(FollowStatus::Accepted),
                is_active: Set(true),
                accepted_at: Set(Some(now)),
                rejected_at: Set(None),
                unfollowed_at: Set(None),
                ..Default::default()
            };

            if self
                .follow_repo
                .compare_and_set(&row.id, row.status, row.is_active, changes)
                .await?
            {
                tracing::info!(
                    follow_id = %row.id,
                    follower_id = %row.follower_id,
                    followed_id = %row.followed_id,
                    "Follow request accepted"
                );
                row.status = FollowStatus::Accepted;
                row.is_active = true;
                row.accepted_at = Some(now);
                row.rejected_at = None;
                row.unfollowed_at = None;
                return Ok(row);
            }
            tracing::warn!(follow_id = %row.id, "Lost update race on accept, re-reading");
        }

        Err(contended())
    }

    /// Reject a pending request addressed to `caller_id`.
    pub async fn reject(&self, follow_id: &str, caller_id: &str) -> AppResult<follow::Model> {
        for _ in 0..MAX_ATTEMPTS {
            let mut row = self.pending_for(follow_id, caller_id, "reject").await?;
            let now = now();
            let changes = follow::ActiveModel {
                status: Set(FollowStatus::Rejected),
                is_active: Set(false),
                rejected_at: Set(Some(now)),
                ..Default::default()
            };

            if self
                .follow_repo
                .compare_and_set(&row.id, row.status, row.is_active, changes)
                .await?
            {
                tracing::info!(
                    follow_id = %row.id,
                    follower_id = %row.follower_id,
                    followed_id = %row.followed_id,
                    "Follow request rejected"
                );
                row.status = FollowStatus::Rejected;
                row.is_active = false;
                row.rejected_at = Some(now);
                return Ok(row);
            }
            tracing::warn!(follow_id = %row.id, "Lost update race on reject, re-reading");
        }

        Err(contended())
    }

    /// Stop following `target_id`. The row is kept so a later request can reuse it.
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> AppResult<follow::Model> {
        for _ in 0..MAX_ATTEMPTS {
            let mut row = self
                .follow_repo
                .find_by_pair(actor_id, target_id)
                .await?
                .filter(follow::Model::is_following)
                .ok_or(AppError::NotFollowing)?;

            let now = now();
            let changes = follow::ActiveModel {
                is_active: Set(false),
                unfollowed_at: Set(Some(now)),
                ..Default::default()
            };

            if self
                .follow_repo
                .compare_and_set(&row.id, FollowStatus::Accepted, true, changes)
                .await?
            {
                tracing::info!(follower_id = %actor_id, followed_id = %target_id, "Unfollowed");
                row.is_active = false;
                row.unfollowed_at = Some(now);
                return Ok(row);
            }
            tracing::warn!(follow_id = %row.id, "Lost update race on unfollow, re-reading");
        }

        Err(contended())
    }

    /// Block `target_id`, overwriting whatever `target_id -> actor_id` row exists.
    ///
    /// Returns the block row and whether it was newly inserted.
    pub async fn block(&self, actor_id: &str, target_id: &str) -> AppResult<(follow::Model, bool)> {
        if actor_id == target_id {
            return Err(AppError::SelfAction(
                "You cannot block yourself.".to_string(),
            ));
        }

        self.user_repo.get_by_id(target_id).await?;

        let pair = BlockedPair::new(actor_id, target_id);

        for _ in 0..MAX_ATTEMPTS {
            let existing = self
                .follow_repo
                .find_by_pair(pair.follower_id(), pair.followed_id())
                .await?;

            match existing {
                None => {
                    let row =
                        self.new_row(pair.follower_id(), pair.followed_id(), FollowStatus::Blocked);
                    if self.follow_repo.insert_if_absent(insertable(&row)).await? {
                        tracing::info!(blocker_id = %actor_id, blocked_id = %target_id, "User blocked");
                        return Ok((row, true));
                    }
                    tracing::warn!(blocker_id = %actor_id, blocked_id = %target_id, "Lost insert race on block, re-reading");
                }
                Some(row) if row.is_blocked() => {
                    tracing::debug!(blocker_id = %actor_id, blocked_id = %target_id, "User already blocked");
                    return Ok((row, false));
                }
                Some(mut row) => {
                    let changes = follow::ActiveModel {
                        status: Set(FollowStatus::Blocked),
                        is_active: Set(false),
                        ..Default::default()
                    };
                    if self
                        .follow_repo
                        .compare_and_set(&row.id, row.status, row.is_active, changes)
                        .await?
                    {
                        // Timestamps of the overwritten state are left as they were.
                        tracing::info!(
                            blocker_id = %actor_id,
                            blocked_id = %target_id,
                            follow_id = %row.id,
                            previous_status = ?row.status,
                            previous_active = row.is_active,
                            "User blocked, overwriting relationship"
                        );
                        row.status = FollowStatus::Blocked;
                        row.is_active = false;
                        return Ok((row, false));
                    }
                    tracing::warn!(follow_id = %row.id, "Lost update race on block, re-reading");
                }
            }
        }

        Err(contended())
    }

    /// Lift a block placed by `actor_id` on `target_id`.
    pub async fn unblock(&self, actor_id: &str, target_id: &str) -> AppResult<()> {
        let pair = BlockedPair::new(actor_id, target_id);

        if !self.follow_repo.delete_block(pair).await? {
            return Err(AppError::NotBlocked);
        }

        tracing::info!(blocker_id = %actor_id, blocked_id = %target_id, "User unblocked");
        Ok(())
    }

    /// Load a request and check that `caller_id` may decide it.
    async fn pending_for(
        &self,
        follow_id: &str,
        caller_id: &str,
        action: &str,
    ) -> AppResult<follow::Model> {
        let row = self
            .follow_repo
            .find_by_id(follow_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Follow request {follow_id}")))?;

        if row.followed_id != caller_id {
            return Err(AppError::Forbidden(format!(
                "You can only {action} follow requests sent to you."
            )));
        }

        if !row.is_pending() {
            return Err(AppError::InvalidState(
                "This request is not pending.".to_string(),
            ));
        }

        Ok(row)
    }

    fn new_row(&self, follower_id: &str, followed_id: &str, status: FollowStatus) -> follow::Model {
        follow::Model {
            id: self.id_gen.generate(),
            follower_id: follower_id.to_string(),
            followed_id: followed_id.to_string(),
            status,
            is_active: false,
            requested_at: Some(now()),
            accepted_at: None,
            rejected_at: None,
            unfollowed_at: None,
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

fn contended() -> AppError {
    AppError::Conflict("Relationship changed concurrently, try again.".to_string())
}

fn insertable(row: &follow::Model) -> follow::ActiveModel {
    follow::ActiveModel {
        id: Set(row.id.clone()),
        follower_id: Set(row.follower_id.clone()),
        followed_id: Set(row.followed_id.clone()),
        status: Set(row.status),
        is_active: Set(row.is_active),
        requested_at: Set(row.requested_at),
        accepted_at: Set(row.accepted_at),
        rejected_at: Set(row.rejected_at),
        unfollowed_at: Set(row.unfollowed_at),
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

    fn mock_follow(
        id: &str,
        follower_id: &str,
        followed_id: &str,
        status: FollowStatus,
        is_active: bool,
    ) -> follow::Model {
        let now = now();
        follow::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followed_id: followed_id.to_string(),
            status,
            is_active,
            requested_at: Some(now),
            accepted_at: (status == FollowStatus::Accepted).then_some(now),
            rejected_at: (status == FollowStatus::Rejected).then_some(now),
            unfollowed_at: (status == FollowStatus::Accepted && !is_active).then_some(now),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn users_db(users: Vec<user::Model>) -> UserRepository {
        let mut db = MockDatabase::new(DatabaseBackend::Postgres);
        for u in users {
            db = db.append_query_results([[u]]);
        }
        UserRepository::new(Arc::new(db.into_connection()))
    }

    fn service(follows: MockDatabase, users: Vec<user::Model>) -> FollowService {
        FollowService::new(
            FollowRepository::new(Arc::new(follows.into_connection())),
            users_db(users),
        )
    }

    #[test]
    fn test_plan_request() {
        let row = |s, a| mock_follow("f1", "a", "b", s, a);

        assert_eq!(plan_request(None), RequestPlan::Insert);
        assert_eq!(
            plan_request(Some(&row(FollowStatus::Pending, false))),
            RequestPlan::AlreadyPending
        );
        assert_eq!(
            plan_request(Some(&row(FollowStatus::Accepted, true))),
            RequestPlan::AlreadyFollowing
        );
        assert_eq!(
            plan_request(Some(&row(FollowStatus::Accepted, false))),
            RequestPlan::Reset
        );
        assert_eq!(
            plan_request(Some(&row(FollowStatus::Rejected, false))),
            RequestPlan::Reset
        );
        assert_eq!(
            plan_request(Some(&row(FollowStatus::Blocked, false))),
            RequestPlan::Blocked
        );
    }

    #[tokio::test]
    async fn test_send_request_to_self() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), vec![]);

        let result = service.send_request("alice", "alice").await;

        assert!(matches!(result, Err(AppError::SelfAction(_))));
    }

    #[tokio::test]
    async fn test_send_request_unknown_target() {
        let users = UserRepository::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        ));
        let service = FollowService::new(
            FollowRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            users,
        );

        let result = service.send_request("alice", "ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_send_request_creates_pending() {
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob")]);

        let outcome = service.send_request("alice", "bob").await.unwrap();

        assert!(outcome.is_created());
        let row = outcome.follow();
        assert_eq!(row.status, FollowStatus::Pending);
        assert!(!row.is_active);
        assert!(row.requested_at.is_some());
        assert_eq!(row.follower_id, "alice");
        assert_eq!(row.followed_id, "bob");
    }

    #[tokio::test]
    async fn test_send_request_twice_is_noop() {
        let existing = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]]);
        let service = service(follows, vec![mock_user("bob")]);

        let outcome = service.send_request("alice", "bob").await.unwrap();

        assert!(!outcome.is_created());
        assert_eq!(outcome, RequestOutcome::AlreadyPending(existing));
        assert_eq!(outcome.message(), "Follow request already sent.");
    }

    #[tokio::test]
    async fn test_send_request_after_unfollow_resets_row() {
        let existing = mock_follow("f1", "alice", "bob", FollowStatus::Accepted, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob")]);

        let outcome = service.send_request("alice", "bob").await.unwrap();

        assert!(matches!(outcome, RequestOutcome::Rerequested(_)));
        let row = outcome.into_follow();
        assert_eq!(row.id, "f1");
        assert_eq!(row.status, FollowStatus::Pending);
        assert!(!row.is_active);
        assert!(row.accepted_at.is_none());
        assert!(row.unfollowed_at.is_none());
    }

    #[tokio::test]
    async fn test_send_request_when_blocked() {
        // bob blocked alice: the row alice -> bob is BLOCKED
        let existing = mock_follow("f1", "alice", "bob", FollowStatus::Blocked, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]]);
        let service = service(follows, vec![mock_user("bob")]);

        let result = service.send_request("alice", "bob").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_send_request_lost_insert_race_rereads() {
        let winner = mock_follow("f9", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![], vec![winner.clone()]])
            .append_exec_results([exec(0)]);
        let service = service(follows, vec![mock_user("bob")]);

        let outcome = service.send_request("alice", "bob").await.unwrap();

        assert_eq!(outcome, RequestOutcome::AlreadyPending(winner));
    }

    #[tokio::test]
    async fn test_send_request_gives_up_after_bounded_retries() {
        let rejected = mock_follow("f1", "alice", "bob", FollowStatus::Rejected, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![rejected.clone()],
                vec![rejected.clone()],
                vec![rejected],
            ])
            .append_exec_results([exec(0), exec(0), exec(0)]);
        let service = service(follows, vec![mock_user("bob")]);

        let result = service.send_request("alice", "bob").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_accept_pending() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![]);

        let row = service.accept("f1", "bob").await.unwrap();

        assert!(row.is_following());
        assert!(row.accepted_at.is_some());
        assert!(row.rejected_at.is_none());
    }

    #[tokio::test]
    async fn test_accept_by_wrong_user() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending]]);
        let service = service(follows, vec![]);

        let result = service.accept("f1", "alice").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_accept_not_pending() {
        let accepted = mock_follow("f1", "alice", "bob", FollowStatus::Accepted, true);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[accepted]]);
        let service = service(follows, vec![]);

        let result = service.accept("f1", "bob").await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_accept_unknown_request() {
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<follow::Model>::new()]);
        let service = service(follows, vec![]);

        let result = service.accept("missing", "bob").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_accept_race_lost_to_reject() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let rejected = mock_follow("f1", "alice", "bob", FollowStatus::Rejected, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending], [rejected]])
            .append_exec_results([exec(0)]);
        let service = service(follows, vec![]);

        let result = service.accept("f1", "bob").await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_reject_pending() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![]);

        let row = service.reject("f1", "bob").await.unwrap();

        assert_eq!(row.status, FollowStatus::Rejected);
        assert!(!row.is_active);
        assert!(row.rejected_at.is_some());
    }

    #[tokio::test]
    async fn test_unfollow_requires_live_follow() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending]]);
        let service = service(follows, vec![]);

        let result = service.unfollow("alice", "bob").await;

        assert!(matches!(result, Err(AppError::NotFollowing)));
    }

    #[tokio::test]
    async fn test_unfollow_keeps_accepted_status() {
        let live = mock_follow("f1", "alice", "bob", FollowStatus::Accepted, true);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[live]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![]);

        let row = service.unfollow("alice", "bob").await.unwrap();

        assert_eq!(row.status, FollowStatus::Accepted);
        assert!(!row.is_active);
        assert!(row.unfollowed_at.is_some());
    }

    #[tokio::test]
    async fn test_block_self() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), vec![]);

        let result = service.block("alice", "alice").await;

        assert!(matches!(result, Err(AppError::SelfAction(_))));
    }

    #[tokio::test]
    async fn test_block_creates_row_in_reverse_slot() {
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob")]);

        let (row, created) = service.block("alice", "bob").await.unwrap();

        assert!(created);
        assert!(row.is_blocked());
        assert!(!row.is_active);
        assert_eq!(row.follower_id, "bob");
        assert_eq!(row.followed_id, "alice");
    }

    #[tokio::test]
    async fn test_block_overwrites_live_follow() {
        // bob follows alice; alice blocks bob
        let live = mock_follow("f1", "bob", "alice", FollowStatus::Accepted, true);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[live.clone()]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob")]);

        let (row, created) = service.block("alice", "bob").await.unwrap();

        assert!(!created);
        assert_eq!(row.id, "f1");
        assert!(row.is_blocked());
        assert!(!row.is_active);
        assert_eq!(row.accepted_at, live.accepted_at);
    }

    #[tokio::test]
    async fn test_unblock_without_block() {
        let follows =
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]);
        let service = service(follows, vec![]);

        let result = service.unblock("alice", "bob").await;

        assert!(matches!(result, Err(AppError::NotBlocked)));
    }

    #[tokio::test]
    async fn test_unblock_deletes_row() {
        let follows =
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(1)]);
        let service = service(follows, vec![]);

        assert!(service.unblock("alice", "bob").await.is_ok());
    }

    // The sequences below share one mock connection across calls. Each staged
    // query result is the row the database holds at that point of the chain.

    #[tokio::test]
    async fn test_block_then_request_from_blocked_user() {
        let stored_block = mock_follow("f1", "bob", "alice", FollowStatus::Blocked, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            // block(alice, bob): no row in the bob -> alice slot yet
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)])
            // send_request(bob, alice): finds the block
            .append_query_results([[stored_block]]);
        let service = service(follows, vec![mock_user("bob"), mock_user("alice")]);

        let (block, created) = service.block("alice", "bob").await.unwrap();
        assert!(created);
        assert_eq!((block.follower_id.as_str(), block.followed_id.as_str()), ("bob", "alice"));

        let result = service.send_request("bob", "alice").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unblock_then_request_starts_fresh() {
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            // block(alice, bob)
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)])
            // unblock(alice, bob) deletes the row
            .append_exec_results([exec(1)])
            // send_request(bob, alice): slot is empty again
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob"), mock_user("alice")]);

        let (block, _) = service.block("alice", "bob").await.unwrap();
        service.unblock("alice", "bob").await.unwrap();
        let outcome = service.send_request("bob", "alice").await.unwrap();

        assert!(matches!(outcome, RequestOutcome::Created(_)));
        let row = outcome.into_follow();
        assert_ne!(row.id, block.id);
        assert_eq!(row.status, FollowStatus::Pending);
        assert!(!row.is_active);
        assert!(row.accepted_at.is_none());
    }

    #[tokio::test]
    async fn test_accept_unfollow_then_request_again() {
        let pending = mock_follow("f1", "alice", "bob", FollowStatus::Pending, false);
        let live = mock_follow("f1", "alice", "bob", FollowStatus::Accepted, true);
        let unfollowed = mock_follow("f1", "alice", "bob", FollowStatus::Accepted, false);
        let follows = MockDatabase::new(DatabaseBackend::Postgres)
            // send_request(alice, bob)
            .append_query_results([Vec::<follow::Model>::new()])
            .append_exec_results([exec(1)])
            // accept
            .append_query_results([[pending]])
            .append_exec_results([exec(1)])
            // unfollow
            .append_query_results([[live]])
            .append_exec_results([exec(1)])
            // send_request(alice, bob) again
            .append_query_results([[unfollowed]])
            .append_exec_results([exec(1)]);
        let service = service(follows, vec![mock_user("bob"), mock_user("bob")]);

        let first = service.send_request("alice", "bob").await.unwrap();
        assert!(matches!(first, RequestOutcome::Created(_)));

        let accepted = service.accept("f1", "bob").await.unwrap();
        assert!(accepted.is_following());
        assert!(accepted.accepted_at.is_some());

        let after_unfollow = service.unfollow("alice", "bob").await.unwrap();
        assert_eq!(after_unfollow.status, FollowStatus::Accepted);
        assert!(!after_unfollow.is_active);

        let again = service.send_request("alice", "bob").await.unwrap();

        assert!(matches!(again, RequestOutcome::Rerequested(_)));
        let row = again.into_follow();
        assert_eq!(row.id, accepted.id);
        assert_eq!(row.status, FollowStatus::Pending);
        assert!(!row.is_active);
        assert!(row.accepted_at.is_none());
        assert!(row.unfollowed_at.is_none());
    }
}
