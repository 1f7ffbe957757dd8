//! Mute entity (muter suppresses content from muted).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mute")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who is muting
    pub muter_id: String,

    /// The user being muted
    pub muted_id: String,

    pub muted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MuterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Muter,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MutedId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Muted,
}

impl ActiveModelBehavior for ActiveModel {}
