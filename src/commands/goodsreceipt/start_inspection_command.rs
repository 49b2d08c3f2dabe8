use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::goodsreceipt::{check_version, find_grn, persist_transition},
    commands::Command,
    db::DbPool,
    entities::grn,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// QC picks a pending GRN up for inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartInspectionCommand {
    pub grn_no: String,
    pub version: i32,
    pub actor: Option<String>,
}

#[async_trait::async_trait]
impl Command for StartInspectionCommand {
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
        let before_version = grn.version;

        grn.start_inspection(self.actor.as_deref())
            .map_err(|e| ServiceError::InvalidStatus(e.to_string()))?;

        persist_transition(&txn, before_version, &grn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnInspectionStarted(grn.id))
            .await;

        info!("GRN {} inspection started", grn.grn_no);
        Ok(grn)
    }
}
