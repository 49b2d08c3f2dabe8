use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::goodsreceipt::{check_version, find_grn, find_grn_items, persist_transition},
    commands::Command,
    db::DbPool,
    entities::{
        grn,
        item::{self, Entity as ItemEntity},
        stock_movement::{self, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{record_completed_movement, resolve_warehouse, MovementInput},
};

/// Inventory signs off an inspected GRN.
///
/// Posts one completed IN movement per accepted line and flips the document
/// to `approved` in the same transaction; any posting failure (unknown
/// warehouse, ledger error) aborts the whole approval and the GRN stays in
/// `awaiting_inventory_approval`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveGrnCommand {
    pub grn_no: String,
    pub version: i32,
    pub actor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveGrnResult {
    pub grn: grn::Model,
    pub movements: Vec<stock_movement::Model>,
    pub posted_quantity: Decimal,
}

#[async_trait::async_trait]
impl Command for ApproveGrnCommand {
    type Result = ApproveGrnResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let mut grn = find_grn(&txn, &self.grn_no).await?;
        check_version(&grn, self.version)?;
        let before_version = grn.version;

        // Validates the awaiting_inventory_approval -> approved edge before
        // any stock is touched.
        grn.approve(self.actor.as_deref())
            .map_err(|e| ServiceError::InvalidStatus(e.to_string()))?;

        let items = find_grn_items(&txn, grn.id).await?;
        let accepted: Vec<_> = items.iter().filter(|i| i.has_accepted_quantity()).collect();
        if accepted.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "GRN {} has no accepted items",
                grn.grn_no
            )));
        }

        let mut movements = Vec::with_capacity(accepted.len());
        let mut posted_quantity = Decimal::ZERO;

        for line in accepted {
            let warehouse = resolve_warehouse(&txn, &line.warehouse_name).await?;
            let valuation_rate = ItemEntity::find()
                .filter(item::Column::ItemCode.eq(line.item_code.clone()))
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .map(|i| i.valuation_rate);

            let movement = record_completed_movement(
                &txn,
                MovementInput {
                    item_code: line.item_code.clone(),
                    warehouse_id: warehouse.id,
                    movement_type: MovementType::In,
                    quantity: line.accepted_qty,
                    reference_type: Some("GRN Request".to_string()),
                    reference_name: Some(grn.grn_no.clone()),
                    notes: Some(format!("Goods receipt {} approved", grn.grn_no)),
                    created_by: self.actor.clone(),
                    valuation_rate,
                },
            )
            .await?;

            posted_quantity += movement.quantity;
            movements.push(movement);
        }

        persist_transition(&txn, before_version, &grn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnApproved {
                grn_id: grn.id,
                grn_no: grn.grn_no.clone(),
                posted_quantity,
            })
            .await;

        info!(
            "GRN {} approved, {} movement(s) posted for {} unit(s)",
            grn.grn_no,
            movements.len(),
            posted_quantity
        );
        Ok(ApproveGrnResult {
            grn,
            movements,
            posted_quantity,
        })
    }
}
