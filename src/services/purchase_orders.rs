use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::purchase_order::{self, Entity as PurchaseOrderEntity, PoStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub created_by: Option<String>,
}

/// Purchase order service.
///
/// Orders are created `Submitted`; a GRN opened against one flips it to
/// `ToReceive` (handled by the GRN create command).
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        if input.total_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Order total must not be negative".to_string(),
            ));
        }

        let db = &*self.db;
        let now = Utc::now();
        let po_no = next_po_no(db).await?;

        let model = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_no: Set(po_no.clone()),
            supplier_id: Set(input.supplier_id),
            supplier_name: Set(input.supplier_name),
            status: Set(PoStatus::Submitted),
            order_date: Set(input.order_date),
            total_amount: Set(input.total_amount),
            created_at: Set(now),
            created_by: Set(input.created_by),
            updated_at: Set(now),
        };

        let created = model.insert(db).await.map_err(|e| {
            error!("Failed to create purchase order: {}", e);
            ServiceError::db_error(e)
        })?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PurchaseOrderCreated {
                    po_id: created.id,
                    po_no: po_no.clone(),
                })
                .await;
        }

        info!("Purchase order {} created", po_no);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        po_no: &str,
    ) -> Result<Option<purchase_order::Model>, ServiceError> {
        PurchaseOrderEntity::find()
            .filter(purchase_order::Column::PoNo.eq(po_no))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        status: Option<PoStatus>,
        supplier_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let mut query = PurchaseOrderEntity::find().order_by_desc(purchase_order::Column::OrderDate);
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((orders, total))
    }
}

/// Generates the next `PO-YYYYMMDD-NNNN` document number.
async fn next_po_no<C: sea_orm::ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let prefix = format!("PO-{}-", Utc::now().format("%Y%m%d"));
    let existing = PurchaseOrderEntity::find()
        .filter(purchase_order::Column::PoNo.starts_with(&prefix))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("{}{:04}", prefix, existing + 1))
}
