//! Subscription entity (one billing ledger entry per user).

use chrono::{DateTime, Duration, FixedOffset};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    #[sea_orm(string_value = "free_trial")]
    FreeTrial,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub user_id: String,

    pub plan_type: PlanType,

    pub status: SubscriptionStatus,

    pub start_date: DateTimeWithTimeZone,

    pub end_date: DateTimeWithTimeZone,

    pub is_trial: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl PlanType {
    /// Paid period length. `months` only applies to monthly plans.
    #[must_use]
    pub fn duration(self, months: u32) -> Duration {
        match self {
            Self::Yearly => Duration::days(365),
            Self::Monthly => Duration::days(30 * i64::from(months)),
            Self::FreeTrial => Duration::zero(),
        }
    }
}

impl Model {
    /// Active means status `active` and the end date not yet passed.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<FixedOffset>) -> bool {
        self.status == SubscriptionStatus::Active && now <= self.end_date
    }

    /// Whole days left, zero once inactive.
    #[must_use]
    pub fn days_remaining_at(&self, now: DateTime<FixedOffset>) -> i64 {
        if !self.is_active_at(now) {
            return 0;
        }
        (self.end_date - now).num_days().max(0)
    }

    /// New end date after buying `duration`: extends a running subscription,
    /// otherwise starts counting from `now`.
    #[must_use]
    pub fn extended_end(
        &self,
        now: DateTime<FixedOffset>,
        duration: Duration,
    ) -> DateTime<FixedOffset> {
        if self.is_active_at(now) {
            self.end_date + duration
        } else {
            now + duration
        }
    }
}
