use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    commands::goodsreceipt::{
        approve_grn_command::{ApproveGrnCommand, ApproveGrnResult},
        complete_inspection_command::CompleteInspectionCommand,
        create_grn_command::{CreateGrnCommand, CreateGrnResult},
        inspect_item_command::InspectItemCommand,
        reject_grn_command::RejectGrnCommand,
        resubmit_grn_command::ResubmitGrnCommand,
        send_back_grn_command::SendBackGrnCommand,
        start_inspection_command::StartInspectionCommand,
    },
    commands::Command,
    db::DbPool,
    entities::{
        grn::{self, Entity as GrnEntity, GrnStatus},
        grn_item::{self, Entity as GrnItemEntity},
    },
    errors::ServiceError,
    events::EventSender,
};

/// Filters for GRN listings.
#[derive(Debug, Clone, Default)]
pub struct GrnFilter {
    pub status: Option<GrnStatus>,
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Service for the goods-receipt QC workflow.
///
/// A thin façade: each lifecycle transition is delegated to its command,
/// which owns the guard conditions and the transaction; queries run here
/// directly.
#[derive(Clone)]
pub struct GrnService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl GrnService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new GRN in `pending`.
    #[instrument(skip(self, command))]
    pub async fn create_grn(
        &self,
        command: CreateGrnCommand,
    ) -> Result<CreateGrnResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Fetches a GRN with its line items.
    #[instrument(skip(self))]
    pub async fn get_grn(
        &self,
        grn_no: &str,
    ) -> Result<Option<(grn::Model, Vec<grn_item::Model>)>, ServiceError> {
        let db = &*self.db_pool;

        let grn = GrnEntity::find()
            .filter(grn::Column::GrnNo.eq(grn_no))
            .one(db)
            .await
            .map_err(|e| {
                error!("Failed to fetch GRN {}: {}", grn_no, e);
                ServiceError::db_error(e)
            })?;

        let Some(grn) = grn else {
            return Ok(None);
        };

        let items = GrnItemEntity::find()
            .filter(grn_item::Column::GrnId.eq(grn.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(Some((grn, items)))
    }

    /// Lists GRNs with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_grns(
        &self,
        filter: GrnFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<grn::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let mut query = GrnEntity::find().order_by_desc(grn::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(grn::Column::Status.eq(status));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(grn::Column::SupplierId.eq(supplier_id));
        }
        if let Some(search) = filter.search {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(grn::Column::GrnNo.contains(&search))
                    .add(grn::Column::SupplierName.contains(&search)),
            );
        }

        let paginator = query.paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let grns = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((grns, total))
    }

    /// QC picks a pending GRN up for inspection.
    #[instrument(skip(self))]
    pub async fn start_inspection(
        &self,
        command: StartInspectionCommand,
    ) -> Result<grn::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Records the QC verdict for one line.
    #[instrument(skip(self, command))]
    pub async fn inspect_item(
        &self,
        command: InspectItemCommand,
    ) -> Result<grn_item::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Closes the QC round and hands the document to inventory.
    #[instrument(skip(self))]
    pub async fn complete_inspection(
        &self,
        command: CompleteInspectionCommand,
    ) -> Result<grn::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Rejects a GRN whose inspection failed across the board.
    #[instrument(skip(self))]
    pub async fn reject_grn(&self, command: RejectGrnCommand) -> Result<grn::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Inventory approval; posts stock for every accepted line.
    #[instrument(skip(self))]
    pub async fn approve_grn(
        &self,
        command: ApproveGrnCommand,
    ) -> Result<ApproveGrnResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Inventory declines and returns the document to QC.
    #[instrument(skip(self))]
    pub async fn send_back_grn(
        &self,
        command: SendBackGrnCommand,
    ) -> Result<grn::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// QC re-submits a sent-back document.
    #[instrument(skip(self))]
    pub async fn resubmit_grn(
        &self,
        command: ResubmitGrnCommand,
    ) -> Result<grn::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }
}
