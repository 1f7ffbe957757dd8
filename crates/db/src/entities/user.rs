//! User entity (identity store).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "trader")]
    Trader,
    #[sea_orm(string_value = "analyst")]
    Analyst,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Public handle
    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Profile picture URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    pub role: UserRole,

    /// Deactivated accounts are hidden from listings
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Mirrors the subscription ledger
    #[sea_orm(default_value = false)]
    pub is_subscribed: bool,

    #[sea_orm(default_value = false)]
    pub is_verified: bool,

    /// Access token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trading_signal::Entity")]
    Signals,

    #[sea_orm(has_one = "super::subscription::Entity")]
    Subscription,
}

impl Related<super::trading_signal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signals.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this user may publish trading signals.
    #[must_use]
    pub fn is_analyst(&self) -> bool {
        self.role == UserRole::Analyst
    }
}
