use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit row written when a stock movement completes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_ledger")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_code: String,

    pub warehouse_id: Uuid,

    pub transaction_date: DateTime<Utc>,

    pub qty_in: Decimal,

    pub qty_out: Decimal,

    pub reference_type: Option<String>,

    pub reference_name: Option<String>,

    pub remarks: Option<String>,

    pub created_by: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
