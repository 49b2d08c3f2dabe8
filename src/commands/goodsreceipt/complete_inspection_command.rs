use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::goodsreceipt::{check_version, find_grn, find_grn_items, persist_transition},
    commands::Command,
    db::DbPool,
    entities::grn,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Closes the QC round and hands the document to inventory.
///
/// Requires every line inspected and at least one accepted quantity; a fully
/// rejected document must go through the reject command instead.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteInspectionCommand {
    pub grn_no: String,
    pub version: i32,
    pub actor: Option<String>,
}

#[async_trait::async_trait]
impl Command for CompleteInspectionCommand {
    type Result = grn::Model;

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

        let items = find_grn_items(&txn, grn.id).await?;
        let uninspected = items.iter().filter(|i| !i.is_inspected()).count();
        if uninspected > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "{} line(s) of GRN {} have not been inspected yet",
                uninspected, grn.grn_no
            )));
        }

        let accepted_lines = items.iter().filter(|i| i.has_accepted_quantity()).count();
        if accepted_lines == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "GRN {} has no accepted items; reject it instead",
                grn.grn_no
            )));
        }

        let before_version = grn.version;
        grn.complete_inspection(self.actor.as_deref())
            .map_err(|e| ServiceError::InvalidStatus(e.to_string()))?;

        persist_transition(&txn, before_version, &grn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnInspectionCompleted {
                grn_id: grn.id,
                accepted_lines,
            })
            .await;

        info!(
            "GRN {} inspection complete, {} accepted line(s), awaiting inventory approval",
            grn.grn_no, accepted_lines
        );
        Ok(grn)
    }
}
