//! Trading signal endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use bigdecimal::BigDecimal;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use signalhub_common::AppResult;
use signalhub_core::CreateSignalInput;
use signalhub_db::entities::trading_signal::{self, AssetClass, Direction, Timeframe};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Signal response.
#[derive(Serialize)]
pub struct SignalResponse {
    pub id: String,
    pub analyst_id: String,
    pub asset_class: AssetClass,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: BigDecimal,
    pub stop_loss: BigDecimal,
    pub take_profit: BigDecimal,
    pub timeframe: Timeframe,
    pub confidence_level: i16,
    pub analyst_note: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<trading_signal::Model> for SignalResponse {
    fn from(s: trading_signal::Model) -> Self {
        Self {
            id: s.id,
            analyst_id: s.analyst_id,
            asset_class: s.asset_class,
            instrument: s.instrument,
            direction: s.direction,
            entry_price: s.entry_price,
            stop_loss: s.stop_loss,
            take_profit: s.take_profit,
            timeframe: s.timeframe,
            confidence_level: s.confidence_level,
            analyst_note: s.analyst_note,
            is_active: s.is_active,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Outcome of publishing a signal.
#[derive(Serialize)]
pub struct CreateSignalResponse {
    pub message: String,
    pub signal: SignalResponse,
}

/// Publish a trading signal.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSignalInput>,
) -> AppResult<ApiResponse<CreateSignalResponse>> {
    let signal = state.signal_service.create(&user, input).await?;

    Ok(ApiResponse::created(CreateSignalResponse {
        message: "Trading signal created successfully.".to_string(),
        signal: signal.into(),
    }))
}

/// Own signals query.
#[derive(Debug, Default, Deserialize)]
pub struct MineQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Signal listing.
#[derive(Serialize)]
pub struct SignalsResponse {
    pub count: usize,
    /// Everything the analyst has ever published, deactivated included.
    pub published_count: u64,
    pub signals: Vec<SignalResponse>,
}

/// The caller's signals, newest first. Deactivated ones only on request.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MineQuery>,
) -> AppResult<ApiResponse<SignalsResponse>> {
    let signals = if query.include_inactive {
        state.signal_service.list_all(&user.id).await?
    } else {
        state.signal_service.list_active(&user.id).await?
    };

    let published_count = state.signal_service.count_signals(&user.id).await?;

    Ok(ApiResponse::ok(SignalsResponse {
        count: signals.len(),
        published_count,
        signals: signals.into_iter().map(Into::into).collect(),
    }))
}

/// Deactivate request.
#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub signal_id: String,
}

/// Soft-delete one of the caller's signals.
async fn deactivate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeactivateRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .signal_service
        .deactivate(&req.signal_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new("Trading signal deactivated.")))
}

/// Values accepted by the signal form.
#[derive(Serialize)]
pub struct CatalogResponse {
    pub asset_classes: Vec<AssetClass>,
    pub directions: Vec<Direction>,
    pub timeframes: Vec<Timeframe>,
}

async fn asset_classes() -> ApiResponse<CatalogResponse> {
    ApiResponse::ok(CatalogResponse {
        asset_classes: AssetClass::iter().collect(),
        directions: Direction::iter().collect(),
        timeframes: Timeframe::iter().collect(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/mine", get(mine))
        .route("/deactivate", post(deactivate))
        .route("/asset-classes", get(asset_classes))
}
