//! One row per redeemed `(marker_id, user_id)`. The composite primary key is
//! what rejects a second claim, including under concurrent requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marker_claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub marker_id: String,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_type = "Text", unique)]
    pub receipt_id: String,
    #[sea_orm(column_type = "Text")]
    pub reward_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub reward_data: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::marker::Entity",
        from = "Column::MarkerId",
        to = "super::marker::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Marker,
}

impl Related<super::marker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Marker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
