use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Per-line QC outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum GrnItemStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "accepted")]
    Accepted,

    #[sea_orm(string_value = "partially_accepted")]
    PartiallyAccepted,

    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl fmt::Display for GrnItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrnItemStatus::Pending => write!(f, "pending"),
            GrnItemStatus::Accepted => write!(f, "accepted"),
            GrnItemStatus::PartiallyAccepted => write!(f, "partially_accepted"),
            GrnItemStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Returned when recorded inspection quantities do not reconcile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectionError {
    #[error("accepted ({accepted}) + rejected ({rejected}) must equal received ({received})")]
    QuantityMismatch {
        accepted: Decimal,
        rejected: Decimal,
        received: Decimal,
    },

    #[error("quantities must not be negative")]
    NegativeQuantity,
}

/// Goods receipt note line item.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grn_request_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub grn_id: Uuid,

    pub item_code: String,

    pub item_name: String,

    pub po_qty: Decimal,

    pub received_qty: Decimal,

    pub accepted_qty: Decimal,

    pub rejected_qty: Decimal,

    pub batch_no: Option<String>,

    pub warehouse_name: String,

    pub item_status: GrnItemStatus,

    /// QC check name -> pass/fail, e.g. the four dimensional/visual checks.
    pub qc_checks: Json,

    pub inspection_notes: Option<String>,

    pub inspected_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grn::Entity",
        from = "Column::GrnId",
        to = "super::grn::Column::Id"
    )]
    Grn,
}

impl Related<super::grn::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grn.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates an uninspected line.
    pub fn new(
        grn_id: Uuid,
        item_code: String,
        item_name: String,
        po_qty: Decimal,
        received_qty: Decimal,
        batch_no: Option<String>,
        warehouse_name: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            grn_id,
            item_code,
            item_name,
            po_qty,
            received_qty,
            accepted_qty: Decimal::ZERO,
            rejected_qty: Decimal::ZERO,
            batch_no,
            warehouse_name,
            item_status: GrnItemStatus::Pending,
            qc_checks: Json::Object(Default::default()),
            inspection_notes: None,
            inspected_at: None,
        }
    }

    /// Records a QC inspection result. Accepted and rejected portions must
    /// add up to the received quantity; the item status is derived from the
    /// split.
    pub fn record_inspection(
        &mut self,
        accepted_qty: Decimal,
        rejected_qty: Decimal,
        qc_checks: BTreeMap<String, bool>,
        notes: Option<String>,
    ) -> Result<(), InspectionError> {
        if accepted_qty < Decimal::ZERO || rejected_qty < Decimal::ZERO {
            return Err(InspectionError::NegativeQuantity);
        }
        if accepted_qty + rejected_qty != self.received_qty {
            return Err(InspectionError::QuantityMismatch {
                accepted: accepted_qty,
                rejected: rejected_qty,
                received: self.received_qty,
            });
        }

        self.accepted_qty = accepted_qty;
        self.rejected_qty = rejected_qty;
        self.item_status = if accepted_qty == Decimal::ZERO {
            GrnItemStatus::Rejected
        } else if rejected_qty == Decimal::ZERO {
            GrnItemStatus::Accepted
        } else {
            GrnItemStatus::PartiallyAccepted
        };
        self.qc_checks = serde_json::to_value(qc_checks)
            .unwrap_or_else(|_| Json::Object(Default::default()));
        self.inspection_notes = notes;
        self.inspected_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_inspected(&self) -> bool {
        self.item_status != GrnItemStatus::Pending
    }

    pub fn has_accepted_quantity(&self) -> bool {
        self.accepted_qty > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(received: Decimal) -> Model {
        Model::new(
            Uuid::new_v4(),
            "BLT-001".into(),
            "M8 hex bolt".into(),
            received,
            received,
            Some("B-77".into()),
            "Main Warehouse".into(),
        )
    }

    fn checks(pass: bool) -> BTreeMap<String, bool> {
        BTreeMap::from([
            ("dimension".to_string(), pass),
            ("surface".to_string(), pass),
            ("thread".to_string(), pass),
            ("hardness".to_string(), pass),
        ])
    }

    #[test]
    fn full_acceptance() {
        let mut item = line(dec!(100));
        item.record_inspection(dec!(100), dec!(0), checks(true), None)
            .unwrap();
        assert_eq!(item.item_status, GrnItemStatus::Accepted);
        assert!(item.is_inspected());
        assert!(item.has_accepted_quantity());
    }

    #[test]
    fn partial_acceptance() {
        let mut item = line(dec!(100));
        item.record_inspection(dec!(80), dec!(20), checks(false), Some("20 out of spec".into()))
            .unwrap();
        assert_eq!(item.item_status, GrnItemStatus::PartiallyAccepted);
        assert_eq!(item.accepted_qty, dec!(80));
        assert_eq!(item.rejected_qty, dec!(20));
    }

    #[test]
    fn full_rejection() {
        let mut item = line(dec!(50));
        item.record_inspection(dec!(0), dec!(50), checks(false), None)
            .unwrap();
        assert_eq!(item.item_status, GrnItemStatus::Rejected);
        assert!(!item.has_accepted_quantity());
    }

    #[test]
    fn split_must_reconcile_with_received() {
        let mut item = line(dec!(100));
        let err = item
            .record_inspection(dec!(80), dec!(10), checks(true), None)
            .unwrap_err();
        assert_eq!(
            err,
            InspectionError::QuantityMismatch {
                accepted: dec!(80),
                rejected: dec!(10),
                received: dec!(100),
            }
        );
        // Nothing recorded on failure
        assert_eq!(item.item_status, GrnItemStatus::Pending);
        assert_eq!(item.accepted_qty, Decimal::ZERO);
    }

    #[test]
    fn negative_quantities_are_refused() {
        let mut item = line(dec!(10));
        assert_eq!(
            item.record_inspection(dec!(-1), dec!(11), checks(true), None),
            Err(InspectionError::NegativeQuantity)
        );
    }
}
