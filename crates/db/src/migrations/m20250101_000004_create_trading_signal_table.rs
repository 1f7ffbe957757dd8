//! Create trading signal table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TradingSignal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TradingSignal::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::AnalystId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::AssetClass)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::Instrument)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::Direction)
                            .string_len(4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::EntryPrice)
                            .decimal_len(12, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::StopLoss)
                            .decimal_len(12, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::TakeProfit)
                            .decimal_len(12, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::Timeframe)
                            .string_len(5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::ConfidenceLevel)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TradingSignal::AnalystNote).text())
                    .col(
                        ColumnDef::new(TradingSignal::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TradingSignal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TradingSignal::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trading_signal_analyst")
                            .from(TradingSignal::Table, TradingSignal::AnalystId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: analyst_id + created_at (analyst's own feed)
        manager
            .create_index(
                Index::create()
                    .name("idx_trading_signal_analyst_created")
                    .table(TradingSignal::Table)
                    .col(TradingSignal::AnalystId)
                    .col(TradingSignal::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TradingSignal::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TradingSignal {
    Table,
    Id,
    AnalystId,
    AssetClass,
    Instrument,
    Direction,
    EntryPrice,
    StopLoss,
    TakeProfit,
    Timeframe,
    ConfidenceLevel,
    AnalystNote,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
