use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ingested sample. The typed columns only serve filtering and
/// indexing; reads rebuild the record from `raw_data`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "metrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub client_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub client_name: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub timestamp: String,
    #[sea_orm(column_type = "Text")]
    pub received_at: String,
    #[sea_orm(column_type = "Double", nullable)]
    pub cpu_percent: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub gpu_percent: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ram_json: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub ping_ms: Option<f64>,
    pub internet_connected: Option<bool>,
    #[sea_orm(column_type = "Text")]
    pub raw_data: String,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
