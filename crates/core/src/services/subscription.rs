//! Subscription service.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::Set;
use serde::Deserialize;
use signalhub_common::{AppError, AppResult, IdGenerator};
use signalhub_db::{
    entities::subscription::{self, PlanType, SubscriptionStatus},
    repositories::{SubscriptionRepository, UserRepository},
};

/// Input for buying a paid plan.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeInput {
    pub plan_type: PlanType,
    /// Only meaningful for monthly plans.
    #[serde(default = "default_months")]
    pub months: u32,
}

const fn default_months() -> u32 {
    1
}

impl SubscribeInput {
    /// Check the plan and return the number of months to bill.
    pub fn billed_months(&self) -> AppResult<u32> {
        match self.plan_type {
            PlanType::FreeTrial => Err(AppError::Validation(
                "plan_type must be monthly or yearly".to_string(),
            )),
            PlanType::Yearly => Ok(1),
            PlanType::Monthly if (1..=12).contains(&self.months) => Ok(self.months),
            PlanType::Monthly => Err(AppError::Validation(
                "months must be between 1 and 12".to_string(),
            )),
        }
    }
}

/// Result of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(subscription::Model),
    AlreadyCancelled(subscription::Model),
}

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    trial_days: i64,
}

impl SubscriptionService {
    /// Create a new subscription service granting `trial_days` of free trial.
    #[must_use]
    pub const fn new(
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
        trial_days: i64,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            trial_days,
        }
    }

    /// Start the free trial, or return the subscription the user already has.
    pub async fn create_free_trial(&self, user_id: &str) -> AppResult<subscription::Model> {
        let now = now();
        let model = subscription::Model {
            id: self.id_gen.generate(),
            user_id: user_id.to_string(),
            plan_type: PlanType::FreeTrial,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: now + Duration::days(self.trial_days),
            is_trial: true,
            created_at: now,
            updated_at: None,
        };

        let active = subscription::ActiveModel {
            id: Set(model.id.clone()),
            user_id: Set(model.user_id.clone()),
            plan_type: Set(model.plan_type),
            status: Set(model.status),
            start_date: Set(model.start_date),
            end_date: Set(model.end_date),
            is_trial: Set(model.is_trial),
            created_at: Set(model.created_at),
            updated_at: Set(None),
        };

        if !self.subscription_repo.insert_if_absent(active).await? {
            // Someone else created it first
            return self
                .subscription_repo
                .find_by_user(user_id)
                .await?
                .ok_or_else(|| AppError::Conflict("Subscription changed concurrently".to_string()));
        }

        self.user_repo.set_subscribed(user_id, true).await?;
        tracing::info!(user_id = %user_id, end_date = %model.end_date, "Free trial started");

        Ok(model)
    }

    /// Current subscription, created on first access and expired when due.
    pub async fn status(&self, user_id: &str) -> AppResult<subscription::Model> {
        let sub = self.get_or_create(user_id).await?;
        let now = now();

        if sub.status == SubscriptionStatus::Active && !sub.is_active_at(now) {
            let expired = self
                .subscription_repo
                .update(subscription::ActiveModel {
                    id: Set(sub.id.clone()),
                    status: Set(SubscriptionStatus::Expired),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                })
                .await?;
            self.user_repo.set_subscribed(user_id, false).await?;
            tracing::info!(user_id = %user_id, "Subscription expired");
            return Ok(expired);
        }

        Ok(sub)
    }

    /// Buy a paid plan, extending a running subscription.
    pub async fn subscribe(
        &self,
        user_id: &str,
        input: &SubscribeInput,
    ) -> AppResult<subscription::Model> {
        let months = input.billed_months()?;
        let sub = self.get_or_create(user_id).await?;
        let now = now();
        let end_date = sub.extended_end(now, input.plan_type.duration(months));

        let updated = self
            .subscription_repo
            .update(subscription::ActiveModel {
                id: Set(sub.id.clone()),
                plan_type: Set(input.plan_type),
                status: Set(SubscriptionStatus::Active),
                end_date: Set(end_date),
                is_trial: Set(false),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .await?;

        self.user_repo.set_subscribed(user_id, true).await?;
        tracing::info!(
            user_id = %user_id,
            plan_type = ?input.plan_type,
            months,
            end_date = %end_date,
            "Subscribed"
        );

        Ok(updated)
    }

    /// Cancel the subscription.
    pub async fn cancel(&self, user_id: &str) -> AppResult<CancelOutcome> {
        let sub = self
            .subscription_repo
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No subscription found for this user.".to_string()))?;

        if sub.status == SubscriptionStatus::Cancelled {
            tracing::debug!(user_id = %user_id, "Subscription already cancelled");
            return Ok(CancelOutcome::AlreadyCancelled(sub));
        }

        let cancelled = self
            .subscription_repo
            .update(subscription::ActiveModel {
                id: Set(sub.id.clone()),
                status: Set(SubscriptionStatus::Cancelled),
                updated_at: Set(Some(now())),
                ..Default::default()
            })
            .await?;

        self.user_repo.set_subscribed(user_id, false).await?;
        tracing::info!(user_id = %user_id, "Subscription cancelled");

        Ok(CancelOutcome::Cancelled(cancelled))
    }

    /// Whether the user has an active subscription. Keeps the user's
    /// `is_subscribed` flag in line with the answer.
    pub async fn check(
        &self,
        user_id: &str,
        is_subscribed: bool,
    ) -> AppResult<(bool, Option<subscription::Model>)> {
        let Some(sub) = self.subscription_repo.find_by_user(user_id).await? else {
            return Ok((false, None));
        };

        let active = sub.is_active_at(now());
        if active != is_subscribed {
            self.user_repo.set_subscribed(user_id, active).await?;
            tracing::debug!(user_id = %user_id, is_subscribed = active, "Synced subscription flag");
        }

        Ok((active, Some(sub)))
    }

    async fn get_or_create(&self, user_id: &str) -> AppResult<subscription::Model> {
        match self.subscription_repo.find_by_user(user_id).await? {
            Some(sub) => Ok(sub),
            None => self.create_free_trial(user_id).await,
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}
