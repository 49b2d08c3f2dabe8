use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::goodsreceipt::{check_version, find_grn, find_grn_items, persist_transition},
    commands::Command,
    db::DbPool,
    entities::grn,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Rejects a GRN whose inspection failed across the board.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectGrnCommand {
    pub grn_no: String,
    pub version: i32,
    #[validate(length(min = 1))]
    pub reason: String,
    pub actor: Option<String>,
}

#[async_trait::async_trait]
impl Command for RejectGrnCommand {
    type Result = grn::Model;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

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
        if items.iter().any(|i| i.has_accepted_quantity()) {
            return Err(ServiceError::InvalidOperation(format!(
                "GRN {} has accepted items; complete the inspection instead",
                grn.grn_no
            )));
        }

        let before_version = grn.version;
        grn.reject(self.reason.clone(), self.actor.as_deref())
            .map_err(|e| ServiceError::InvalidStatus(e.to_string()))?;

        persist_transition(&txn, before_version, &grn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnRejected {
                grn_id: grn.id,
                reason: self.reason.clone(),
            })
            .await;

        info!("GRN {} rejected: {}", grn.grn_no, self.reason);
        Ok(grn)
    }
}
