use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        grn::{self, Entity as GrnEntity},
        grn_item,
        purchase_order::{self, Entity as PurchaseOrderEntity, PoStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGrnItemRequest {
    #[validate(length(min = 1))]
    pub item_code: String,
    #[validate(length(min = 1))]
    pub item_name: String,
    pub po_qty: Decimal,
    pub received_qty: Decimal,
    pub batch_no: Option<String>,
    #[validate(length(min = 1))]
    pub warehouse_name: String,
}

/// Creates a goods receipt note in `Pending`, optionally against a purchase
/// order (which then flips to `to_receive`).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateGrnCommand {
    pub po_no: Option<String>,
    pub supplier_id: Uuid,
    #[validate(length(min = 1))]
    pub supplier_name: String,
    pub receipt_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub items: Vec<CreateGrnItemRequest>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGrnResult {
    pub grn: grn::Model,
    pub items: Vec<grn_item::Model>,
}

#[async_trait::async_trait]
impl Command for CreateGrnCommand {
    type Result = CreateGrnResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        for item in &self.items {
            if item.received_qty <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Received quantity for {} must be positive",
                    item.item_code
                )));
            }
        }

        let db = db_pool.as_ref();
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let grn_no = next_grn_no(&txn).await?;
        let grn = grn::Model::new(
            grn_no.clone(),
            self.po_no.clone(),
            self.supplier_id,
            self.supplier_name.clone(),
            self.receipt_date,
            self.notes.clone(),
            self.created_by.clone(),
        );

        let created: grn::Model = grn::ActiveModel::from(grn.clone())
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let line = grn_item::Model::new(
                created.id,
                item.item_code.clone(),
                item.item_name.clone(),
                item.po_qty,
                item.received_qty,
                item.batch_no.clone(),
                item.warehouse_name.clone(),
            );
            let inserted = grn_item::ActiveModel::from(line)
                .insert(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            items.push(inserted);
        }

        // A receipt against a submitted PO moves the order into receiving.
        let mut po_flipped = false;
        if let Some(po_no) = &self.po_no {
            let po = PurchaseOrderEntity::find()
                .filter(purchase_order::Column::PoNo.eq(po_no))
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Purchase order {} not found", po_no))
                })?;

            if po.status == PoStatus::Submitted {
                let mut active: purchase_order::ActiveModel = po.into();
                active.status = sea_orm::ActiveValue::Set(PoStatus::ToReceive);
                active.updated_at = sea_orm::ActiveValue::Set(Utc::now());
                active.update(&txn).await.map_err(ServiceError::db_error)?;
                po_flipped = true;
            }
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        event_sender
            .send_or_log(Event::GrnCreated {
                grn_id: created.id,
                grn_no: grn_no.clone(),
            })
            .await;
        if po_flipped {
            event_sender
                .send_or_log(Event::PurchaseOrderMarkedToReceive {
                    po_no: self.po_no.clone().unwrap_or_default(),
                    grn_no: grn_no.clone(),
                })
                .await;
        }

        info!("GRN {} created with {} line(s)", grn_no, items.len());
        Ok(CreateGrnResult {
            grn: created,
            items,
        })
    }
}

/// Generates the next `GRN-YYYYMMDD-NNNN` document number.
async fn next_grn_no<C: sea_orm::ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let prefix = format!("GRN-{}-", Utc::now().format("%Y%m%d"));
    let existing = GrnEntity::find()
        .filter(grn::Column::GrnNo.starts_with(&prefix))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("{}{:04}", prefix, existing + 1))
}
