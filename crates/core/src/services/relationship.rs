//! Relationship queries: status flags, counts and listings.

use std::collections::HashMap;

use serde::Serialize;
use signalhub_common::AppResult;
use signalhub_db::{
    entities::{follow, user},
    repositories::{FollowRepository, MuteRepository, UserRepository},
};

/// How the viewer and a subject relate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipStatus {
    pub is_following: bool,
    pub is_pending_sent: bool,
    pub is_pending_received: bool,
    pub is_blocked_by_me: bool,
    pub is_blocked_by_them: bool,
    pub is_muted: bool,
}

impl RelationshipStatus {
    /// Build the flags from the `viewer -> subject` row, the `subject -> viewer`
    /// row and the mute state.
    ///
    /// A block by the viewer lives in the subject's outbound slot, so
    /// `is_blocked_by_me` reads the reverse row.
    #[must_use]
    pub fn from_rows(
        outbound: Option<&follow::Model>,
        inbound: Option<&follow::Model>,
        is_muted: bool,
    ) -> Self {
        Self {
            is_following: outbound.is_some_and(follow::Model::is_following),
            is_pending_sent: outbound.is_some_and(follow::Model::is_pending),
            is_pending_received: inbound.is_some_and(follow::Model::is_pending),
            is_blocked_by_me: inbound.is_some_and(follow::Model::is_blocked),
            is_blocked_by_them: outbound.is_some_and(follow::Model::is_blocked),
            is_muted,
        }
    }
}

/// Relationship counters of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationshipCounts {
    pub followers_count: u64,
    pub following_count: u64,
    pub pending_received_count: u64,
    pub pending_sent_count: u64,
    /// Only reported to the user themself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted_count: Option<u64>,
}

/// A follow row together with both of its users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowWithUsers {
    pub follow: follow::Model,
    pub follower: user::Model,
    pub followed: user::Model,
}

/// Read side of the social graph.
#[derive(Clone)]
pub struct RelationshipService {
    follow_repo: FollowRepository,
    mute_repo: MuteRepository,
    user_repo: UserRepository,
}

impl RelationshipService {
    /// Create a new relationship service.
    #[must_use]
    pub const fn new(
        follow_repo: FollowRepository,
        mute_repo: MuteRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            follow_repo,
            mute_repo,
            user_repo,
        }
    }

    /// Flags describing how `viewer_id` relates to `subject_id`.
    pub async fn status(&self, viewer_id: &str, subject_id: &str) -> AppResult<RelationshipStatus> {
        self.user_repo.get_by_id(subject_id).await?;

        let outbound = self.follow_repo.find_by_pair(viewer_id, subject_id).await?;
        let inbound = self.follow_repo.find_by_pair(subject_id, viewer_id).await?;
        let is_muted = self.mute_repo.is_muted(viewer_id, subject_id).await?;

        Ok(RelationshipStatus::from_rows(
            outbound.as_ref(),
            inbound.as_ref(),
            is_muted,
        ))
    }

    /// Counters for `subject_id`, or for the viewer when `None`.
    pub async fn counts(
        &self,
        viewer_id: &str,
        subject_id: Option<&str>,
    ) -> AppResult<RelationshipCounts> {
        let target = match subject_id {
            Some(id) => self.user_repo.get_by_id(id).await?.id,
            None => viewer_id.to_string(),
        };

        let muted_count = if target == viewer_id {
            Some(self.mute_repo.count_by_muter(&target).await?)
        } else {
            None
        };

        Ok(RelationshipCounts {
            followers_count: self.follow_repo.count_followers(&target).await?,
            following_count: self.follow_repo.count_following(&target).await?,
            pending_received_count: self.follow_repo.count_pending_received(&target).await?,
            pending_sent_count: self.follow_repo.count_pending_sent(&target).await?,
            muted_count,
        })
    }

    /// Users live-following `user_id`, most recently accepted first.
    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        let rows = self.follow_repo.find_followers(user_id).await?;
        let ids: Vec<String> = rows.into_iter().map(|f| f.follower_id).collect();
        self.users_in_order(ids).await
    }

    /// Users `user_id` live-follows, most recently accepted first.
    pub async fn following(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        let rows = self.follow_repo.find_following(user_id).await?;
        let ids: Vec<String> = rows.into_iter().map(|f| f.followed_id).collect();
        self.users_in_order(ids).await
    }

    /// Pending requests addressed to `user_id`, newest first.
    pub async fn pending_received(&self, user_id: &str) -> AppResult<Vec<FollowWithUsers>> {
        let rows = self.follow_repo.find_pending_received(user_id).await?;
        self.with_users(rows).await
    }

    /// Pending requests sent by `user_id`, newest first.
    pub async fn pending_sent(&self, user_id: &str) -> AppResult<Vec<FollowWithUsers>> {
        let rows = self.follow_repo.find_pending_sent(user_id).await?;
        self.with_users(rows).await
    }

    /// Users muted by `user_id`, most recently muted first.
    pub async fn muted(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let rows = self.mute_repo.find_by_muter(user_id).await?;
        let ids: Vec<String> = rows.into_iter().map(|m| m.muted_id).collect();
        self.users_in_order(ids).await
    }

    /// Load users keeping the order of `ids`.
    async fn users_in_order(&self, ids: Vec<String>) -> AppResult<Vec<user::Model>> {
        let mut by_id = self.user_map(&ids).await?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn with_users(&self, rows: Vec<follow::Model>) -> AppResult<Vec<FollowWithUsers>> {
        let mut ids: Vec<String> = rows
            .iter()
            .flat_map(|f| [f.follower_id.clone(), f.followed_id.clone()])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let by_id = self.user_map(&ids).await?;

        Ok(rows
            .into_iter()
            .filter_map(|follow| {
                let follower = by_id.get(&follow.follower_id)?.clone();
                let followed = by_id.get(&follow.followed_id)?.clone();
                Some(FollowWithUsers {
                    follow,
                    follower,
                    followed,
                })
            })
            .collect())
    }

    async fn user_map(&self, ids: &[String]) -> AppResult<HashMap<String, user::Model>> {
        Ok(self
            .user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }
}
