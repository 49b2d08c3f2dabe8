use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PoStatus {
    #[sea_orm(string_value = "draft")]
    Draft,

    #[sea_orm(string_value = "submitted")]
    Submitted,

    /// A goods receipt has been opened against this order.
    #[sea_orm(string_value = "to_receive")]
    ToReceive,

    #[sea_orm(string_value = "completed")]
    Completed,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl fmt::Display for PoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoStatus::Draft => write!(f, "draft"),
            PoStatus::Submitted => write!(f, "submitted"),
            PoStatus::ToReceive => write!(f, "to_receive"),
            PoStatus::Completed => write!(f, "completed"),
            PoStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub po_no: String,

    pub supplier_id: Uuid,

    pub supplier_name: String,

    pub status: PoStatus,

    pub order_date: DateTime<Utc>,

    pub total_amount: Decimal,

    pub created_at: DateTime<Utc>,

    pub created_by: Option<String>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
