//! Reward markers. Written by admin tooling only; this service reads them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "markers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Double")]
    pub lat: f64,
    #[sea_orm(column_type = "Double")]
    pub lng: f64,
    pub active: bool,
    pub visible_from: Option<DateTimeWithTimeZone>,
    pub visible_to: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Double", nullable)]
    pub radius_m: Option<f64>,
    #[sea_orm(column_type = "Text")]
    pub reward_type: String,
    pub reward_amount: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub reward_data: Json,
    #[sea_orm(column_type = "Text", nullable)]
    pub next_route: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::marker_claim::Entity")]
    MarkerClaim,
}

impl Related<super::marker_claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarkerClaim.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
