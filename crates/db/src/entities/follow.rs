//! Follow entity (directed relationship between two users).
//!
//! One row exists per ordered `(follower_id, followed_id)` pair that has ever
//! seen a follow action. The same table stores blocks, see [`BlockedPair`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a relationship row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum FollowStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "BLOCKED")]
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who follows (or who is blocked, for block rows)
    pub follower_id: String,

    /// The user being followed (or the blocker, for block rows)
    pub followed_id: String,

    pub status: FollowStatus,

    /// True only while this row is a live follow edge
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub requested_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub accepted_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub rejected_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub unfollowed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowedId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Followed,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Live follow edge: accepted and not unfollowed.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.status == FollowStatus::Accepted && self.is_active
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == FollowStatus::Pending
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == FollowStatus::Blocked
    }
}

/// A block of `blocked` by `blocker`.
///
/// Blocks live in the follow table in the slot where the blocked user follows
/// the blocker: `follower_id = blocked`, `followed_id = blocker`. Going through
/// this type keeps callers from mixing up the forward and reverse lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedPair<'a> {
    pub blocker: &'a str,
    pub blocked: &'a str,
}

impl<'a> BlockedPair<'a> {
    #[must_use]
    pub const fn new(blocker: &'a str, blocked: &'a str) -> Self {
        Self { blocker, blocked }
    }

    /// Follower id of the row that stores this block.
    #[must_use]
    pub const fn follower_id(&self) -> &'a str {
        self.blocked
    }

    /// Followed id of the row that stores this block.
    #[must_use]
    pub const fn followed_id(&self) -> &'a str {
        self.blocker
    }
}
