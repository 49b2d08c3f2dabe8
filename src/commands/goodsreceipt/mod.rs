//! Commands driving the goods-receipt QC workflow.
//!
//! Each lifecycle transition is one command. Status changes are guarded by
//! the transition table on the GRN model and persisted with a
//! compare-and-swap on the version column, so two operators acting on the
//! same document cannot silently overwrite each other.

pub mod approve_grn_command;
pub mod complete_inspection_command;
pub mod create_grn_command;
pub mod inspect_item_command;
pub mod reject_grn_command;
pub mod resubmit_grn_command;
pub mod send_back_grn_command;
pub mod start_inspection_command;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::grn::{self, Entity as GrnEntity};
use crate::entities::grn_item::{self, Entity as GrnItemEntity};
use crate::errors::ServiceError;

/// Fetches a GRN by its document number.
pub(crate) async fn find_grn<C: ConnectionTrait>(
    conn: &C,
    grn_no: &str,
) -> Result<grn::Model, ServiceError> {
    GrnEntity::find()
        .filter(grn::Column::GrnNo.eq(grn_no))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("GRN {} not found", grn_no)))
}

/// Fetches the line items of a GRN.
pub(crate) async fn find_grn_items<C: ConnectionTrait>(
    conn: &C,
    grn_id: uuid::Uuid,
) -> Result<Vec<grn_item::Model>, ServiceError> {
    GrnItemEntity::find()
        .filter(grn_item::Column::GrnId.eq(grn_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Guards that the caller saw the current version of the document.
pub(crate) fn check_version(grn: &grn::Model, expected: i32) -> Result<(), ServiceError> {
    if grn.version != expected {
        return Err(ServiceError::Conflict(format!(
            "GRN {} is at version {}, request expected {}; refresh and retry",
            grn.grn_no, grn.version, expected
        )));
    }
    Ok(())
}

/// Persists an already-transitioned model with a compare-and-swap on the
/// version the transition started from. Zero affected rows means a
/// concurrent writer won the race.
pub(crate) async fn persist_transition<C: ConnectionTrait>(
    conn: &C,
    before_version: i32,
    updated: &grn::Model,
) -> Result<(), ServiceError> {
    let result = GrnEntity::update_many()
        .col_expr(grn::Column::Status, Expr::value(updated.status))
        .col_expr(
            grn::Column::RejectionReason,
            Expr::value(updated.rejection_reason.clone()),
        )
        .col_expr(grn::Column::UpdatedAt, Expr::value(updated.updated_at))
        .col_expr(grn::Column::UpdatedBy, Expr::value(updated.updated_by.clone()))
        .col_expr(grn::Column::Version, Expr::value(updated.version))
        .filter(grn::Column::Id.eq(updated.id))
        .filter(grn::Column::Version.eq(before_version))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::Conflict(format!(
            "GRN {} was modified concurrently; refresh and retry",
            updated.grn_no
        )));
    }
    Ok(())
}
