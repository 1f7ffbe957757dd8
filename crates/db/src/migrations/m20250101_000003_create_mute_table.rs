//! Create mute table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mute::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mute::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Mute::MuterId).string_len(32).not_null())
                    .col(ColumnDef::new(Mute::MutedId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Mute::MutedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mute_muter")
                            .from(Mute::Table, Mute::MuterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mute_muted")
                            .from(Mute::Table, Mute::MutedId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (muter_id, muted_id) - prevent duplicate mutes
        manager
            .create_index(
                Index::create()
                    .name("idx_mute_muter_muted")
                    .table(Mute::Table)
                    .col(Mute::MuterId)
                    .col(Mute::MutedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mute_muted_id")
                    .table(Mute::Table)
                    .col(Mute::MutedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mute::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Mute {
    Table,
    Id,
    MuterId,
    MutedId,
    MutedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
