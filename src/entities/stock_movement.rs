use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of a stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum MovementType {
    #[sea_orm(string_value = "IN")]
    In,

    #[sea_orm(string_value = "OUT")]
    Out,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::In => write!(f, "IN"),
            MovementType::Out => write!(f, "OUT"),
        }
    }
}

/// Approval state of a movement. Only `Completed` movements affect balances;
/// `Pending` movements are inert until approved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MovementStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,

    #[sea_orm(string_value = "Approved")]
    Approved,

    #[sea_orm(string_value = "Completed")]
    Completed,

    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementStatus::Pending => write!(f, "Pending"),
            MovementStatus::Approved => write!(f, "Approved"),
            MovementStatus::Completed => write!(f, "Completed"),
            MovementStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub transaction_no: String,

    pub item_code: String,

    pub warehouse_id: Uuid,

    pub movement_type: MovementType,

    pub quantity: Decimal,

    /// Originating document kind, e.g. "GRN Request".
    pub reference_type: Option<String>,

    /// Originating document identifier, e.g. the GRN number.
    pub reference_name: Option<String>,

    pub status: MovementStatus,

    pub notes: Option<String>,

    pub rejection_reason: Option<String>,

    pub created_at: DateTime<Utc>,

    pub created_by: Option<String>,

    pub approved_at: Option<DateTime<Utc>>,

    pub approved_by: Option<String>,
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

impl Model {
    /// Signed effect of this movement on a running balance, zero unless the
    /// movement is `Completed`.
    pub fn balance_effect(&self) -> Decimal {
        if self.status != MovementStatus::Completed {
            return Decimal::ZERO;
        }
        match self.movement_type {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn movement(status: MovementStatus, movement_type: MovementType, qty: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            transaction_no: "STK-20240101-00001".into(),
            item_code: "BLT-001".into(),
            warehouse_id: Uuid::new_v4(),
            movement_type,
            quantity: qty,
            reference_type: None,
            reference_name: None,
            status,
            notes: None,
            rejection_reason: None,
            created_at: Utc::now(),
            created_by: None,
            approved_at: None,
            approved_by: None,
        }
    }

    #[test]
    fn pending_movements_are_inert() {
        let m = movement(MovementStatus::Pending, MovementType::In, dec!(40));
        assert_eq!(m.balance_effect(), Decimal::ZERO);
    }

    #[test]
    fn completed_movements_are_signed_by_direction() {
        let m_in = movement(MovementStatus::Completed, MovementType::In, dec!(40));
        let m_out = movement(MovementStatus::Completed, MovementType::Out, dec!(15));
        assert_eq!(m_in.balance_effect(), dec!(40));
        assert_eq!(m_out.balance_effect(), dec!(-15));
    }
}
