//! Trading signal entity (analyst-authored trade idea).

use bigdecimal::BigDecimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Market an instrument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetClass {
    #[sea_orm(string_value = "FOREX")]
    Forex,
    #[sea_orm(string_value = "COMMODITY")]
    Commodity,
    #[sea_orm(string_value = "INDICES")]
    Indices,
    #[sea_orm(string_value = "CRYPTO")]
    Crypto,
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(4))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[sea_orm(string_value = "BUY")]
    Buy,
    #[sea_orm(string_value = "SELL")]
    Sell,
}

/// Chart timeframe the signal was derived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(5))")]
pub enum Timeframe {
    #[sea_orm(string_value = "M1")]
    M1,
    #[sea_orm(string_value = "M5")]
    M5,
    #[sea_orm(string_value = "M15")]
    M15,
    #[sea_orm(string_value = "M30")]
    M30,
    #[sea_orm(string_value = "H1")]
    H1,
    #[sea_orm(string_value = "H4")]
    H4,
    #[sea_orm(string_value = "D1")]
    D1,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trading_signal")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author (an analyst)
    #[sea_orm(indexed)]
    pub analyst_id: String,

    pub asset_class: AssetClass,

    /// e.g. EUR/USD, XAU/USD, NAS100, BTC/USD
    pub instrument: String,

    pub direction: Direction,

    #[sea_orm(column_type = "Decimal(Some((12, 5)))")]
    pub entry_price: BigDecimal,

    #[sea_orm(column_type = "Decimal(Some((12, 5)))")]
    pub stop_loss: BigDecimal,

    #[sea_orm(column_type = "Decimal(Some((12, 5)))")]
    pub take_profit: BigDecimal,

    pub timeframe: Timeframe,

    /// 0..=100
    pub confidence_level: i16,

    #[sea_orm(column_type = "Text", nullable)]
    pub analyst_note: Option<String>,

    /// Soft-delete flag
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AnalystId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Analyst,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analyst.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
