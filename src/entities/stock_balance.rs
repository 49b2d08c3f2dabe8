use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached running balance per (item, warehouse) pair.
///
/// `current_qty` must equal cumulative IN minus cumulative OUT over all
/// `Completed` stock movements; the rebuild operation re-derives it from the
/// movement history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_code: String,

    pub warehouse_id: Uuid,

    pub current_qty: Decimal,

    pub reserved_qty: Decimal,

    pub available_qty: Decimal,

    pub valuation_rate: Decimal,

    pub total_value: Decimal,

    pub last_receipt_date: Option<DateTime<Utc>>,

    pub last_issue_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
