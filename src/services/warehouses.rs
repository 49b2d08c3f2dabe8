use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::warehouse::{self, Entity as WarehouseEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateWarehouseInput {
    pub warehouse_code: String,
    pub warehouse_name: String,
    pub department: Option<String>,
}

/// Warehouse master service.
#[derive(Clone)]
pub struct WarehouseService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl WarehouseService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_warehouse(
        &self,
        input: CreateWarehouseInput,
    ) -> Result<warehouse::Model, ServiceError> {
        let db = &*self.db;

        let existing = WarehouseEntity::find()
            .filter(warehouse::Column::WarehouseCode.eq(input.warehouse_code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Warehouse {} already exists",
                input.warehouse_code
            )));
        }

        let now = Utc::now();
        let model = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            warehouse_code: Set(input.warehouse_code),
            warehouse_name: Set(input.warehouse_name),
            department: Set(input.department),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await.map_err(|e| {
            error!("Failed to create warehouse: {}", e);
            ServiceError::db_error(e)
        })?;

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::WarehouseCreated(created.id)).await;
        }

        info!("Warehouse {} created", created.warehouse_code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_warehouse(&self, id: Uuid) -> Result<Option<warehouse::Model>, ServiceError> {
        WarehouseEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list_warehouses(
        &self,
        active_only: bool,
    ) -> Result<Vec<warehouse::Model>, ServiceError> {
        let mut query = WarehouseEntity::find().order_by_asc(warehouse::Column::WarehouseCode);
        if active_only {
            query = query.filter(warehouse::Column::IsActive.eq(true));
        }
        query.all(&*self.db).await.map_err(ServiceError::db_error)
    }
}
