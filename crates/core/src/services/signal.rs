//! Trading signal service.

use bigdecimal::BigDecimal;
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use signalhub_common::{AppError, AppResult, IdGenerator};
use signalhub_db::{
    entities::{
        trading_signal::{self, AssetClass, Direction, Timeframe},
        user,
    },
    repositories::TradingSignalRepository,
};
use validator::{Validate, ValidationError};

/// Input for publishing a signal.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSignalInput {
    pub asset_class: AssetClass,

    #[validate(length(min = 1, max = 20))]
    pub instrument: String,

    pub direction: Direction,

    #[validate(custom(function = "positive_price"))]
    pub entry_price: BigDecimal,

    #[validate(custom(function = "positive_price"))]
    pub stop_loss: BigDecimal,

    #[validate(custom(function = "positive_price"))]
    pub take_profit: BigDecimal,

    pub timeframe: Timeframe,

    #[validate(range(min = 0, max = 100))]
    pub confidence_level: i16,

    #[validate(length(max = 5000))]
    pub analyst_note: Option<String>,
}

/// Prices are stored as `numeric(12, 5)`.
const PRICE_INTEGER_DIGITS: i64 = 7;
const PRICE_SCALE: i64 = 5;

fn positive_price(value: &BigDecimal) -> Result<(), ValidationError> {
    if *value <= BigDecimal::from(0) {
        return Err(ValidationError::new("price_must_be_positive"));
    }

    // Trailing zeros do not count against the scale.
    let normalized = value.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Err(ValidationError::new("price_too_many_decimal_places"));
    }

    let integer_digits = i64::try_from(normalized.digits()).unwrap_or(i64::MAX) - scale;
    if integer_digits > PRICE_INTEGER_DIGITS {
        return Err(ValidationError::new("price_too_large"));
    }

    Ok(())
}

/// Trading signal service for business logic.
#[derive(Clone)]
pub struct SignalService {
    signal_repo: TradingSignalRepository,
    id_gen: IdGenerator,
}

impl SignalService {
    /// Create a new signal service.
    #[must_use]
    pub const fn new(signal_repo: TradingSignalRepository) -> Self {
        Self {
            signal_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a signal. Only analysts may publish.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateSignalInput,
    ) -> AppResult<trading_signal::Model> {
        if !author.is_analyst() {
            return Err(AppError::Forbidden(
                "Only analyst users can post trading signals.".to_string(),
            ));
        }

        input.validate()?;

        let model = trading_signal::ActiveModel {
            id: Set(self.id_gen.generate()),
            analyst_id: Set(author.id.clone()),
            asset_class: Set(input.asset_class),
            instrument: Set(input.instrument.trim().to_string()),
            direction: Set(input.direction),
            entry_price: Set(input.entry_price),
            stop_loss: Set(input.stop_loss),
            take_profit: Set(input.take_profit),
            timeframe: Set(input.timeframe),
            confidence_level: Set(input.confidence_level),
            analyst_note: Set(input.analyst_note),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let signal = self.signal_repo.create(model).await?;
        tracing::info!(
            signal_id = %signal.id,
            analyst_id = %author.id,
            instrument = %signal.instrument,
            "Trading signal created"
        );

        Ok(signal)
    }

    /// Live signals of an analyst.
    pub async fn list_active(&self, analyst_id: &str) -> AppResult<Vec<trading_signal::Model>> {
        self.signal_repo.find_active_by_analyst(analyst_id).await
    }

    /// All signals of an analyst, including deactivated ones.
    pub async fn list_all(&self, analyst_id: &str) -> AppResult<Vec<trading_signal::Model>> {
        self.signal_repo.find_all_by_analyst(analyst_id).await
    }

    /// Number of signals an analyst has ever published.
    pub async fn count_signals(&self, analyst_id: &str) -> AppResult<u64> {
        self.signal_repo.count_by_analyst(analyst_id).await
    }

    /// Soft-delete a signal owned by `analyst_id`.
    pub async fn deactivate(&self, signal_id: &str, analyst_id: &str) -> AppResult<()> {
        if self.signal_repo.deactivate(signal_id, analyst_id).await? {
            tracing::info!(signal_id = %signal_id, analyst_id = %analyst_id, "Trading signal deactivated");
            return Ok(());
        }

        match self.signal_repo.find_by_id(signal_id).await? {
            None => Err(AppError::NotFound(format!("Signal {signal_id}"))),
            Some(s) if s.analyst_id != analyst_id => Err(AppError::Forbidden(
                "You can only deactivate your own signals.".to_string(),
            )),
            Some(_) => Err(AppError::InvalidState(
                "Signal is already inactive.".to_string(),
            )),
        }
    }
}
