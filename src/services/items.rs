use chrono::Utc;
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
    entities::item::{self, Entity as ItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub item_code: String,
    pub item_name: String,
    pub item_group: Option<String>,
    pub uom: String,
    pub hsn_code: Option<String>,
    pub valuation_rate: Decimal,
}

/// Item master service.
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl ItemService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<item::Model, ServiceError> {
        if input.valuation_rate < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Valuation rate must not be negative".to_string(),
            ));
        }

        let db = &*self.db;

        let existing = ItemEntity::find()
            .filter(item::Column::ItemCode.eq(input.item_code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Item {} already exists",
                input.item_code
            )));
        }

        let now = Utc::now();
        let model = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set(input.item_code),
            item_name: Set(input.item_name),
            item_group: Set(input.item_group),
            uom: Set(input.uom),
            hsn_code: Set(input.hsn_code),
            valuation_rate: Set(input.valuation_rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await.map_err(|e| {
            error!("Failed to create item: {}", e);
            ServiceError::db_error(e)
        })?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ItemCreated {
                    item_id: created.id,
                    item_code: created.item_code.clone(),
                })
                .await;
        }

        info!("Item {} created", created.item_code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_code: &str) -> Result<Option<item::Model>, ServiceError> {
        ItemEntity::find()
            .filter(item::Column::ItemCode.eq(item_code))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Lists items with pagination, ordered by item code.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        search: Option<String>,
        active_only: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<item::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let mut query = ItemEntity::find().order_by_asc(item::Column::ItemCode);
        if active_only {
            query = query.filter(item::Column::IsActive.eq(true));
        }
        if let Some(search) = search {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(item::Column::ItemCode.contains(&search))
                    .add(item::Column::ItemName.contains(&search)),
            );
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }
}
