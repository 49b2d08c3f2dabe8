use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::goodsreceipt::{check_version, find_grn, persist_transition},
    commands::Command,
    db::DbPool,
    entities::{
        grn::GrnStatus,
        grn_item::{self, Entity as GrnItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Records the QC verdict for one line of a GRN under inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectItemCommand {
    pub grn_no: String,
    pub item_id: Uuid,
    pub version: i32,
    pub accepted_qty: Decimal,
    pub rejected_qty: Decimal,
    pub qc_checks: BTreeMap<String, bool>,
    pub notes: Option<String>,
    pub actor: Option<String>,
}

#[async_trait::async_trait]
impl Command for InspectItemCommand {
    type Result = grn_item::Model;

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

        if grn.status != GrnStatus::Inspecting {
            return Err(ServiceError::InvalidStatus(format!(
                "GRN {} is {}, items can only be inspected while inspecting",
                grn.grn_no, grn.status
            )));
        }

        let mut item = GrnItemEntity::find_by_id(self.item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|i| i.grn_id == grn.id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Item {} not found in GRN {}",
                    self.item_id, self.grn_no
                ))
            })?;

        item.record_inspection(
            self.accepted_qty,
            self.rejected_qty,
            self.qc_checks.clone(),
            self.notes.clone(),
        )
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let mut active: grn_item::ActiveModel = item.clone().into();
        active.accepted_qty = Set(item.accepted_qty);
        active.rejected_qty = Set(item.rejected_qty);
        active.item_status = Set(item.item_status);
        active.qc_checks = Set(item.qc_checks.clone());
        active.inspection_notes = Set(item.inspection_notes.clone());
        active.inspected_at = Set(item.inspected_at);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        // Touching a line is a mutation of the document: refresh audit fields
        // and bump the version so stale inspectors are told to refresh.
        let before_version = grn.version;
        grn.updated_at = chrono::Utc::now();
        grn.updated_by = self.actor.clone();
        grn.version += 1;
        persist_transition(&txn, before_version, &grn).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnItemInspected {
                grn_id: grn.id,
                item_id: updated.id,
                accepted_qty: updated.accepted_qty,
                rejected_qty: updated.rejected_qty,
            })
            .await;

        info!(
            "GRN {} item {} inspected: {} accepted, {} rejected",
            grn.grn_no, updated.item_code, updated.accepted_qty, updated.rejected_qty
        );
        Ok(updated)
    }
}
