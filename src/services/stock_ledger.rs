use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        item::{self, Entity as ItemEntity},
        stock_balance::{self, Entity as StockBalanceEntity},
        stock_ledger,
        stock_movement::{self, Entity as StockMovementEntity, MovementStatus, MovementType},
        warehouse::{self, Entity as WarehouseEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Everything needed to post one stock movement.
#[derive(Debug, Clone)]
pub struct MovementInput {
    pub item_code: String,
    pub warehouse_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_name: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    /// Unit valuation applied to the balance; falls back to the item master
    /// rate when absent.
    pub valuation_rate: Option<Decimal>,
}

/// Filters for movement listings.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub status: Option<MovementStatus>,
    pub movement_type: Option<MovementType>,
    pub item_code: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Filters for balance listings.
#[derive(Debug, Clone, Default)]
pub struct BalanceFilter {
    pub item_code: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Result of re-deriving a cached balance from the movement history.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct RebuildReport {
    pub item_code: String,
    pub warehouse_id: Uuid,
    pub cached_qty: Decimal,
    pub derived_qty: Decimal,
    pub drift: Decimal,
}

/// Generates the next `STK-YYYYMMDD-NNNNN` transaction number.
pub async fn next_transaction_no<C: sea_orm::ConnectionTrait>(
    conn: &C,
) -> Result<String, ServiceError> {
    let prefix = format!("STK-{}-", Utc::now().format("%Y%m%d"));
    let existing = StockMovementEntity::find()
        .filter(stock_movement::Column::TransactionNo.starts_with(&prefix))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("{}{:05}", prefix, existing + 1))
}

/// Applies a completed movement to the cached balance and appends the audit
/// ledger row. Must run inside the transaction that completes the movement.
async fn apply_completed(
    txn: &DatabaseTransaction,
    movement: &stock_movement::Model,
    valuation_rate: Option<Decimal>,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    let (qty_in, qty_out) = match movement.movement_type {
        MovementType::In => (movement.quantity, Decimal::ZERO),
        MovementType::Out => (Decimal::ZERO, movement.quantity),
    };

    let ledger_entry = stock_ledger::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_code: Set(movement.item_code.clone()),
        warehouse_id: Set(movement.warehouse_id),
        transaction_date: Set(now),
        qty_in: Set(qty_in),
        qty_out: Set(qty_out),
        reference_type: Set(Some("Stock Movement".to_string())),
        reference_name: Set(Some(movement.transaction_no.clone())),
        remarks: Set(movement.notes.clone()),
        created_by: Set(movement.approved_by.clone()),
        created_at: Set(now),
    };
    ledger_entry.insert(txn).await.map_err(|e| {
        error!("Failed to append stock ledger entry: {}", e);
        ServiceError::db_error(e)
    })?;

    let balance = StockBalanceEntity::find()
        .filter(stock_balance::Column::ItemCode.eq(movement.item_code.clone()))
        .filter(stock_balance::Column::WarehouseId.eq(movement.warehouse_id))
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?;

    match balance {
        Some(existing) => {
            let new_qty = existing.current_qty + movement.balance_effect();
            if new_qty < Decimal::ZERO {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for {} at warehouse {}: have {}, issuing {}",
                    movement.item_code, movement.warehouse_id, existing.current_qty,
                    movement.quantity
                )));
            }

            let rate = valuation_rate.unwrap_or(existing.valuation_rate);
            let mut active: stock_balance::ActiveModel = existing.clone().into();
            active.current_qty = Set(new_qty);
            active.available_qty = Set(new_qty - existing.reserved_qty);
            active.valuation_rate = Set(rate);
            active.total_value = Set(new_qty * rate);
            match movement.movement_type {
                MovementType::In => active.last_receipt_date = Set(Some(now)),
                MovementType::Out => active.last_issue_date = Set(Some(now)),
            }
            active.updated_at = Set(now);
            active.update(txn).await.map_err(|e| {
                error!("Failed to update stock balance: {}", e);
                ServiceError::db_error(e)
            })?;
        }
        None => {
            if movement.movement_type == MovementType::Out {
                return Err(ServiceError::InsufficientStock(format!(
                    "No stock of {} at warehouse {}",
                    movement.item_code, movement.warehouse_id
                )));
            }

            let rate = valuation_rate.unwrap_or(Decimal::ZERO);
            let new_balance = stock_balance::ActiveModel {
                id: Set(Uuid::new_v4()),
                item_code: Set(movement.item_code.clone()),
                warehouse_id: Set(movement.warehouse_id),
                current_qty: Set(movement.quantity),
                reserved_qty: Set(Decimal::ZERO),
                available_qty: Set(movement.quantity),
                valuation_rate: Set(rate),
                total_value: Set(movement.quantity * rate),
                last_receipt_date: Set(Some(now)),
                last_issue_date: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            new_balance.insert(txn).await.map_err(|e| {
                error!("Failed to create stock balance: {}", e);
                ServiceError::db_error(e)
            })?;
        }
    }

    Ok(())
}

/// Inserts a movement that is born `Completed` (it already passed an outer
/// approval gate, e.g. GRN inventory approval) and applies it to the balance.
pub(crate) async fn record_completed_movement(
    txn: &DatabaseTransaction,
    input: MovementInput,
) -> Result<stock_movement::Model, ServiceError> {
    if input.quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Movement quantity must be positive".to_string(),
        ));
    }

    let now = Utc::now();
    let movement = stock_movement::Model {
        id: Uuid::new_v4(),
        transaction_no: next_transaction_no(txn).await?,
        item_code: input.item_code,
        warehouse_id: input.warehouse_id,
        movement_type: input.movement_type,
        quantity: input.quantity,
        reference_type: input.reference_type,
        reference_name: input.reference_name,
        status: MovementStatus::Completed,
        notes: input.notes,
        rejection_reason: None,
        created_at: now,
        created_by: input.created_by.clone(),
        approved_at: Some(now),
        approved_by: input.created_by,
    };

    let active: stock_movement::ActiveModel = movement.clone().into();
    let created = active.insert(txn).await.map_err(|e| {
        error!("Failed to create stock movement: {}", e);
        ServiceError::db_error(e)
    })?;

    apply_completed(txn, &created, input.valuation_rate).await?;
    Ok(created)
}

/// Service for posting and approving stock movements and maintaining the
/// cached per-(item, warehouse) balances.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl StockLedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Posts a manual movement in `Pending`; it stays inert until approved.
    #[instrument(skip(self))]
    pub async fn post_movement(
        &self,
        input: MovementInput,
    ) -> Result<stock_movement::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Movement quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db;

        ItemEntity::find()
            .filter(item::Column::ItemCode.eq(input.item_code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", input.item_code)))?;

        WarehouseEntity::find_by_id(input.warehouse_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse {} not found", input.warehouse_id))
            })?;

        let now = Utc::now();
        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_no: Set(next_transaction_no(db).await?),
            item_code: Set(input.item_code),
            warehouse_id: Set(input.warehouse_id),
            movement_type: Set(input.movement_type),
            quantity: Set(input.quantity),
            reference_type: Set(input.reference_type),
            reference_name: Set(input.reference_name),
            status: Set(MovementStatus::Pending),
            notes: Set(input.notes),
            rejection_reason: Set(None),
            created_at: Set(now),
            created_by: Set(input.created_by),
            approved_at: Set(None),
            approved_by: Set(None),
        };

        let created = movement.insert(db).await.map_err(|e| {
            error!("Failed to post stock movement: {}", e);
            ServiceError::db_error(e)
        })?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockMovementPosted {
                    movement_id: created.id,
                    transaction_no: created.transaction_no.clone(),
                })
                .await;
        }

        info!("Stock movement posted: {}", created.transaction_no);
        Ok(created)
    }

    /// Approves a pending movement: flips it to `Completed`, appends the
    /// ledger row and updates the cached balance, all in one transaction.
    #[instrument(skip(self))]
    pub async fn approve_movement(
        &self,
        movement_id: Uuid,
        approved_by: Option<String>,
    ) -> Result<stock_movement::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let movement = StockMovementEntity::find_by_id(movement_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock movement {} not found", movement_id))
            })?;

        if movement.status != MovementStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Stock movement {} is {}, only Pending movements can be approved",
                movement.transaction_no, movement.status
            )));
        }

        let now = Utc::now();
        let updated_rows = StockMovementEntity::update_many()
            .col_expr(
                stock_movement::Column::Status,
                Expr::value(MovementStatus::Completed),
            )
            .col_expr(stock_movement::Column::ApprovedAt, Expr::value(Some(now)))
            .col_expr(
                stock_movement::Column::ApprovedBy,
                Expr::value(approved_by.clone()),
            )
            .filter(stock_movement::Column::Id.eq(movement_id))
            .filter(stock_movement::Column::Status.eq(MovementStatus::Pending))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        if updated_rows.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Stock movement {} was approved concurrently",
                movement.transaction_no
            )));
        }

        let completed = stock_movement::Model {
            status: MovementStatus::Completed,
            approved_at: Some(now),
            approved_by,
            ..movement
        };

        let rate = self.item_valuation_rate(&txn, &completed.item_code).await?;
        apply_completed(&txn, &completed, rate).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockMovementCompleted {
                    movement_id: completed.id,
                    item_code: completed.item_code.clone(),
                    warehouse_id: completed.warehouse_id,
                    quantity: completed.quantity,
                })
                .await;
        }

        info!(
            "Stock movement {} completed: {} {} of {}",
            completed.transaction_no, completed.movement_type, completed.quantity,
            completed.item_code
        );
        Ok(completed)
    }

    /// Rejects a pending movement; it becomes `Cancelled` and never touches
    /// a balance.
    #[instrument(skip(self))]
    pub async fn reject_movement(
        &self,
        movement_id: Uuid,
        reason: String,
        rejected_by: Option<String>,
    ) -> Result<stock_movement::Model, ServiceError> {
        let db = &*self.db;

        let movement = StockMovementEntity::find_by_id(movement_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock movement {} not found", movement_id))
            })?;

        if movement.status != MovementStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Stock movement {} is {}, only Pending movements can be rejected",
                movement.transaction_no, movement.status
            )));
        }

        let now = Utc::now();
        let mut active: stock_movement::ActiveModel = movement.into();
        active.status = Set(MovementStatus::Cancelled);
        active.rejection_reason = Set(Some(reason.clone()));
        active.approved_at = Set(Some(now));
        active.approved_by = Set(rejected_by);

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockMovementCancelled {
                    movement_id: updated.id,
                    reason,
                })
                .await;
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_movement(
        &self,
        movement_id: Uuid,
    ) -> Result<Option<stock_movement::Model>, ServiceError> {
        StockMovementEntity::find_by_id(movement_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Lists movements with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let mut query =
            StockMovementEntity::find().order_by_desc(stock_movement::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(stock_movement::Column::Status.eq(status));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(stock_movement::Column::MovementType.eq(movement_type));
        }
        if let Some(item_code) = filter.item_code {
            query = query.filter(stock_movement::Column::ItemCode.eq(item_code));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(stock_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(search) = filter.search {
            query = query.filter(stock_movement::Column::TransactionNo.contains(&search));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let movements = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((movements, total))
    }

    #[instrument(skip(self))]
    pub async fn list_balances(
        &self,
        filter: BalanceFilter,
    ) -> Result<Vec<stock_balance::Model>, ServiceError> {
        let mut query = StockBalanceEntity::find().order_by_asc(stock_balance::Column::ItemCode);

        if let Some(item_code) = filter.item_code {
            query = query.filter(stock_balance::Column::ItemCode.eq(item_code));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(stock_balance::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(search) = filter.search {
            query = query.filter(stock_balance::Column::ItemCode.contains(&search));
        }

        query.all(&*self.db).await.map_err(ServiceError::db_error)
    }

    /// Balances ordered by ascending availability, for reorder screens.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<stock_balance::Model>, ServiceError> {
        StockBalanceEntity::find()
            .filter(stock_balance::Column::AvailableQty.gt(Decimal::ZERO))
            .order_by_asc(stock_balance::Column::AvailableQty)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Re-derives the cached balance for one (item, warehouse) pair from the
    /// full movement history and overwrites the cache with the derived value.
    #[instrument(skip(self))]
    pub async fn rebuild_balance(
        &self,
        item_code: &str,
        warehouse_id: Uuid,
    ) -> Result<RebuildReport, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let movements = StockMovementEntity::find()
            .filter(stock_movement::Column::ItemCode.eq(item_code))
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_movement::Column::Status.eq(MovementStatus::Completed))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let derived_qty: Decimal = movements.iter().map(|m| m.balance_effect()).sum();

        let balance = StockBalanceEntity::find()
            .filter(stock_balance::Column::ItemCode.eq(item_code))
            .filter(stock_balance::Column::WarehouseId.eq(warehouse_id))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let cached_qty = balance.as_ref().map(|b| b.current_qty).unwrap_or(Decimal::ZERO);
        let drift = cached_qty - derived_qty;

        if let Some(existing) = balance {
            let reserved = existing.reserved_qty;
            let rate = existing.valuation_rate;
            let mut active: stock_balance::ActiveModel = existing.into();
            active.current_qty = Set(derived_qty);
            active.available_qty = Set(derived_qty - reserved);
            active.total_value = Set(derived_qty * rate);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockBalanceRebuilt {
                    item_code: item_code.to_string(),
                    warehouse_id,
                    derived_qty,
                    drift,
                })
                .await;
        }

        if drift != Decimal::ZERO {
            info!(
                "Stock balance drift repaired for {} at {}: cached {}, derived {}",
                item_code, warehouse_id, cached_qty, derived_qty
            );
        }

        Ok(RebuildReport {
            item_code: item_code.to_string(),
            warehouse_id,
            cached_qty,
            derived_qty,
            drift,
        })
    }

    async fn item_valuation_rate(
        &self,
        txn: &DatabaseTransaction,
        item_code: &str,
    ) -> Result<Option<Decimal>, ServiceError> {
        Ok(ItemEntity::find()
            .filter(item::Column::ItemCode.eq(item_code))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .map(|i| i.valuation_rate))
    }
}

/// Resolves a warehouse by name or code, the way receiving screens reference
/// them.
pub async fn resolve_warehouse<C: sea_orm::ConnectionTrait>(
    conn: &C,
    name_or_code: &str,
) -> Result<warehouse::Model, ServiceError> {
    WarehouseEntity::find()
        .filter(
            sea_orm::Condition::any()
                .add(warehouse::Column::WarehouseName.eq(name_or_code))
                .add(warehouse::Column::WarehouseCode.eq(name_or_code)),
        )
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Warehouse '{}' not found", name_or_code)))
}
