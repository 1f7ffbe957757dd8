//! Trading signal repository.
//!
//! Deactivated signals stay in the table. Callers pick the view they want:
//! `find_all_by_analyst` sees every row, `find_active_by_analyst` only live ones.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{TradingSignal, trading_signal};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use signalhub_common::{AppError, AppResult};

/// Trading signal repository for database operations.
#[derive(Clone)]
pub struct TradingSignalRepository {
    db: Arc<DatabaseConnection>,
}

impl TradingSignalRepository {
    /// Create a new trading signal repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a signal by ID, active or not.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<trading_signal::Model>> {
        TradingSignal::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new signal.
    pub async fn create(
        &self,
        model: trading_signal::ActiveModel,
    ) -> AppResult<trading_signal::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every signal an analyst has published, including deactivated ones.
    pub async fn find_all_by_analyst(
        &self,
        analyst_id: &str,
    ) -> AppResult<Vec<trading_signal::Model>> {
        TradingSignal::find()
            .filter(trading_signal::Column::AnalystId.eq(analyst_id))
            .order_by_desc(trading_signal::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Live signals of an analyst, newest first.
    pub async fn find_active_by_analyst(
        &self,
        analyst_id: &str,
    ) -> AppResult<Vec<trading_signal::Model>> {
        TradingSignal::find()
            .filter(trading_signal::Column::AnalystId.eq(analyst_id))
            .filter(trading_signal::Column::IsActive.eq(true))
            .order_by_desc(trading_signal::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all signals of an analyst (unfiltered view).
    pub async fn count_by_analyst(&self, analyst_id: &str) -> AppResult<u64> {
        TradingSignal::find()
            .filter(trading_signal::Column::AnalystId.eq(analyst_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Signal counts for several analysts in one grouped query.
    pub async fn count_by_analysts(
        &self,
        analyst_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if analyst_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = TradingSignal::find()
            .select_only()
            .column(trading_signal::Column::AnalystId)
            .column_as(Expr::col(trading_signal::Column::Id).count(), "count")
            .filter(trading_signal::Column::AnalystId.is_in(analyst_ids.to_vec()))
            .group_by(trading_signal::Column::AnalystId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    /// Soft-delete a live signal owned by `analyst_id`.
    ///
    /// Returns `false` if no such live signal exists.
    pub async fn deactivate(&self, id: &str, analyst_id: &str) -> AppResult<bool> {
        let result = TradingSignal::update_many()
            .col_expr(trading_signal::Column::IsActive, Expr::value(false))
            .col_expr(
                trading_signal::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(trading_signal::Column::Id.eq(id))
            .filter(trading_signal::Column::AnalystId.eq(analyst_id))
            .filter(trading_signal::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::trading_signal::{AssetClass, Direction, Timeframe};
    use bigdecimal::BigDecimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::str::FromStr;

    fn create_test_signal(id: &str, analyst_id: &str, is_active: bool) -> trading_signal::Model {
        trading_signal::Model {
            id: id.to_string(),
            analyst_id: analyst_id.to_string(),
            asset_class: AssetClass::Forex,
            instrument: "EUR/USD".to_string(),
            direction: Direction::Buy,
            entry_price: BigDecimal::from_str("1.08500").unwrap(),
            stop_loss: BigDecimal::from_str("1.08000").unwrap(),
            take_profit: BigDecimal::from_str("1.09500").unwrap(),
            timeframe: Timeframe::H4,
            confidence_level: 75,
            analyst_note: None,
            is_active,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_views_over_same_table() {
        let live = create_test_signal("s1", "a1", true);
        let gone = create_test_signal("s2", "a1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![live.clone(), gone], vec![live]])
                .into_connection(),
        );

        let repo = TradingSignalRepository::new(db);

        let all = repo.find_all_by_analyst("a1").await.unwrap();
        let active = repo.find_active_by_analyst("a1").await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(active.len(), 1);
        assert!(active[0].is_active);
    }

    #[tokio::test]
    async fn test_count_by_analyst() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = TradingSignalRepository::new(db);

        assert_eq!(repo.count_by_analyst("a1").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_deactivate_not_owned() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TradingSignalRepository::new(db);

        assert!(!repo.deactivate("s1", "someone_else").await.unwrap());
    }
}
