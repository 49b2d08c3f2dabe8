use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    commands::goodsreceipt::{
        approve_grn_command::ApproveGrnCommand,
        complete_inspection_command::CompleteInspectionCommand,
        create_grn_command::{CreateGrnCommand, CreateGrnItemRequest},
        inspect_item_command::InspectItemCommand,
        reject_grn_command::RejectGrnCommand,
        resubmit_grn_command::ResubmitGrnCommand,
        send_back_grn_command::SendBackGrnCommand,
        start_inspection_command::StartInspectionCommand,
    },
    entities::{
        grn::{self, GrnStatus},
        grn_item,
    },
    errors::ApiError,
    handlers::AppState,
    services::grn::GrnFilter,
    PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Router for GRN workflow endpoints
pub fn grn_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grn))
        .route("/", get(list_grns))
        .route("/:grn_no", get(get_grn))
        .route("/:grn_no/start-inspection", post(start_inspection))
        .route("/:grn_no/items/:item_id/inspect", post(inspect_item))
        .route("/:grn_no/complete-inspection", post(complete_inspection))
        .route("/:grn_no/reject", post(reject_grn))
        .route("/:grn_no/approve", post(approve_grn))
        .route("/:grn_no/send-back", post(send_back_grn))
        .route("/:grn_no/resubmit", post(resubmit_grn))
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, ToSchema)]
pub struct GrnItemRequest {
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

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGrnRequest {
    pub po_no: Option<String>,
    pub supplier_id: Uuid,
    #[validate(length(min = 1))]
    pub supplier_name: String,
    pub receipt_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub items: Vec<GrnItemRequest>,
    pub notes: Option<String>,
}

/// Carries the optimistic-lock version the caller last saw.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct TransitionRequest {
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReasonedTransitionRequest {
    pub version: i32,
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct InspectItemRequest {
    pub version: i32,
    pub accepted_qty: Decimal,
    pub rejected_qty: Decimal,
    #[serde(default)]
    pub qc_checks: BTreeMap<String, bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GrnListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GrnSummary {
    pub id: Uuid,
    pub grn_no: String,
    pub po_no: Option<String>,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub receipt_date: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl From<grn::Model> for GrnSummary {
    fn from(model: grn::Model) -> Self {
        Self {
            id: model.id,
            grn_no: model.grn_no,
            po_no: model.po_no,
            supplier_id: model.supplier_id,
            supplier_name: model.supplier_name,
            receipt_date: model.receipt_date,
            status: model.status.to_string(),
            notes: model.notes,
            rejection_reason: model.rejection_reason,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GrnItemResponse {
    pub id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub po_qty: Decimal,
    pub received_qty: Decimal,
    pub accepted_qty: Decimal,
    pub rejected_qty: Decimal,
    pub batch_no: Option<String>,
    pub warehouse_name: String,
    pub item_status: String,
    pub qc_checks: serde_json::Value,
    pub inspection_notes: Option<String>,
    pub inspected_at: Option<DateTime<Utc>>,
}

impl From<grn_item::Model> for GrnItemResponse {
    fn from(model: grn_item::Model) -> Self {
        Self {
            id: model.id,
            item_code: model.item_code,
            item_name: model.item_name,
            po_qty: model.po_qty,
            received_qty: model.received_qty,
            accepted_qty: model.accepted_qty,
            rejected_qty: model.rejected_qty,
            batch_no: model.batch_no,
            warehouse_name: model.warehouse_name,
            item_status: model.item_status.to_string(),
            qc_checks: model.qc_checks,
            inspection_notes: model.inspection_notes,
            inspected_at: model.inspected_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GrnDetail {
    #[serde(flatten)]
    pub grn: GrnSummary,
    pub items: Vec<GrnItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApproveGrnResponse {
    pub grn: GrnSummary,
    pub posted_quantity: Decimal,
    pub movement_transaction_nos: Vec<String>,
}

/// Create a GRN from a purchase order or manually
#[utoipa::path(
    post,
    path = "/api/v1/grns",
    request_body = CreateGrnRequest,
    responses(
        (status = 201, description = "GRN created", body = crate::ApiResponse<GrnDetail>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn create_grn(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateGrnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = CreateGrnCommand {
        po_no: payload.po_no,
        supplier_id: payload.supplier_id,
        supplier_name: payload.supplier_name,
        receipt_date: payload.receipt_date,
        items: payload
            .items
            .into_iter()
            .map(|item| CreateGrnItemRequest {
                item_code: item.item_code,
                item_name: item.item_name,
                po_qty: item.po_qty,
                received_qty: item.received_qty,
                batch_no: item.batch_no,
                warehouse_name: item.warehouse_name,
            })
            .collect(),
        notes: payload.notes,
        created_by: Some(user.username),
    };

    let result = state
        .services
        .grn
        .create_grn(command)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(GrnDetail {
        grn: GrnSummary::from(result.grn),
        items: result.items.into_iter().map(GrnItemResponse::from).collect(),
    }))
}

/// List GRNs with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/grns",
    params(GrnListQuery),
    responses(
        (status = 200, description = "GRNs listed", body = crate::ApiResponse<PaginatedResponse<GrnSummary>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn list_grns(
    State(state): State<AppState>,
    Query(query): Query<GrnListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let status = match query.status.as_deref() {
        Some(value) => Some(parse_grn_status(value)?),
        None => None,
    };

    let filter = GrnFilter {
        status,
        supplier_id: query.supplier_id,
        search: query.search,
    };

    let (records, total) = state
        .services
        .grn
        .list_grns(filter, page, per_page)
        .await
        .map_err(map_service_error)?;

    let items: Vec<GrnSummary> = records.into_iter().map(GrnSummary::from).collect();
    let total_pages = total.div_ceil(per_page);

    Ok(success_response(PaginatedResponse {
        items,
        total,
        page,
        limit: per_page,
        total_pages,
    }))
}

/// Fetch a GRN with its line items
#[utoipa::path(
    get,
    path = "/api/v1/grns/{grn_no}",
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "GRN fetched", body = crate::ApiResponse<GrnDetail>),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn get_grn(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (grn, items) = state
        .services
        .grn
        .get_grn(&grn_no)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("GRN {} not found", grn_no)))?;

    Ok(success_response(GrnDetail {
        grn: GrnSummary::from(grn),
        items: items.into_iter().map(GrnItemResponse::from).collect(),
    }))
}

/// Move a pending GRN into inspection
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/start-inspection",
    request_body = TransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "Inspection started", body = crate::ApiResponse<GrnSummary>),
        (status = 400, description = "Illegal transition", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn start_inspection(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = StartInspectionCommand {
        grn_no,
        version: payload.version,
        actor: Some(user.username),
    };

    let grn = state
        .services
        .grn
        .start_inspection(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnSummary::from(grn)))
}

/// Record the QC verdict for one line item
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/items/{item_id}/inspect",
    request_body = InspectItemRequest,
    params(
        ("grn_no" = String, Path, description = "GRN document number"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    responses(
        (status = 200, description = "Item inspected", body = crate::ApiResponse<GrnItemResponse>),
        (status = 400, description = "Quantities do not reconcile", body = crate::errors::ErrorResponse),
        (status = 404, description = "GRN or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn inspect_item(
    State(state): State<AppState>,
    Path((grn_no, item_id)): Path<(String, Uuid)>,
    user: AuthenticatedUser,
    Json(payload): Json<InspectItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = InspectItemCommand {
        grn_no,
        item_id,
        version: payload.version,
        accepted_qty: payload.accepted_qty,
        rejected_qty: payload.rejected_qty,
        qc_checks: payload.qc_checks,
        notes: payload.notes,
        actor: Some(user.username),
    };

    let item = state
        .services
        .grn
        .inspect_item(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnItemResponse::from(item)))
}

/// Close the inspection round and hand the GRN to inventory
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/complete-inspection",
    request_body = TransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "Awaiting inventory approval", body = crate::ApiResponse<GrnSummary>),
        (status = 400, description = "Lines uninspected or none accepted", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn complete_inspection(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CompleteInspectionCommand {
        grn_no,
        version: payload.version,
        actor: Some(user.username),
    };

    let grn = state
        .services
        .grn
        .complete_inspection(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnSummary::from(grn)))
}

/// Reject a fully failed GRN
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/reject",
    request_body = ReasonedTransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "GRN rejected", body = crate::ApiResponse<GrnSummary>),
        (status = 400, description = "GRN has accepted items", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn reject_grn(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<ReasonedTransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = RejectGrnCommand {
        grn_no,
        version: payload.version,
        reason: payload.reason,
        actor: Some(user.username),
    };

    let grn = state
        .services
        .grn
        .reject_grn(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnSummary::from(grn)))
}

/// Inventory approval: flips the GRN to approved and posts stock
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/approve",
    request_body = TransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "GRN approved, stock posted", body = crate::ApiResponse<ApproveGrnResponse>),
        (status = 400, description = "Illegal transition or no accepted items", body = crate::errors::ErrorResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stale version", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn approve_grn(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ApproveGrnCommand {
        grn_no,
        version: payload.version,
        actor: Some(user.username),
    };

    let result = state
        .services
        .grn
        .approve_grn(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ApproveGrnResponse {
        grn: GrnSummary::from(result.grn),
        posted_quantity: result.posted_quantity,
        movement_transaction_nos: result
            .movements
            .into_iter()
            .map(|m| m.transaction_no)
            .collect(),
    }))
}

/// Inventory declines and returns the GRN to QC
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/send-back",
    request_body = ReasonedTransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "GRN sent back", body = crate::ApiResponse<GrnSummary>),
        (status = 400, description = "Illegal transition", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn send_back_grn(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<ReasonedTransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = SendBackGrnCommand {
        grn_no,
        version: payload.version,
        reason: payload.reason,
        actor: Some(user.username),
    };

    let grn = state
        .services
        .grn
        .send_back_grn(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnSummary::from(grn)))
}

/// Re-submit a sent-back GRN for another inspection round
#[utoipa::path(
    post,
    path = "/api/v1/grns/{grn_no}/resubmit",
    request_body = TransitionRequest,
    params(("grn_no" = String, Path, description = "GRN document number")),
    responses(
        (status = 200, description = "GRN resubmitted", body = crate::ApiResponse<GrnSummary>),
        (status = 400, description = "Illegal transition", body = crate::errors::ErrorResponse)
    ),
    tag = "grns"
)]
pub async fn resubmit_grn(
    State(state): State<AppState>,
    Path(grn_no): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = ResubmitGrnCommand {
        grn_no,
        version: payload.version,
        actor: Some(user.username),
    };

    let grn = state
        .services
        .grn
        .resubmit_grn(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnSummary::from(grn)))
}

fn parse_grn_status(value: &str) -> Result<GrnStatus, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "pending" => Ok(GrnStatus::Pending),
        "inspecting" => Ok(GrnStatus::Inspecting),
        "awaiting_inventory_approval" => Ok(GrnStatus::AwaitingInventoryApproval),
        "approved" => Ok(GrnStatus::Approved),
        "rejected" => Ok(GrnStatus::Rejected),
        "sent_back" => Ok(GrnStatus::SentBack),
        other => Err(ApiError::ValidationError(format!(
            "Unknown GRN status '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parses_every_workflow_state() {
        for (text, expected) in [
            ("pending", GrnStatus::Pending),
            ("INSPECTING", GrnStatus::Inspecting),
            (
                "awaiting_inventory_approval",
                GrnStatus::AwaitingInventoryApproval,
            ),
            ("approved", GrnStatus::Approved),
            ("rejected", GrnStatus::Rejected),
            ("sent_back", GrnStatus::SentBack),
        ] {
            assert_eq!(parse_grn_status(text).unwrap(), expected);
        }
        assert!(parse_grn_status("shipped").is_err());
    }
}
