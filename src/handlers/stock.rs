use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    entities::{
        stock_balance,
        stock_movement::{self, MovementStatus, MovementType},
    },
    errors::ApiError,
    handlers::AppState,
    services::stock_ledger::{BalanceFilter, MovementFilter, MovementInput, RebuildReport},
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
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Router for stock ledger endpoints
pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(list_movements))
        .route("/movements", post(create_movement))
        .route("/movements/:id", get(get_movement))
        .route("/movements/:id/approve", post(approve_movement))
        .route("/movements/:id/reject", post(reject_movement))
        .route("/balances", get(list_balances))
        .route("/balances/low", get(low_stock))
        .route("/balances/rebuild", post(rebuild_balance))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMovementRequest {
    #[validate(length(min = 1))]
    pub item_code: String,
    pub warehouse_id: Uuid,
    /// `IN` or `OUT`
    #[validate(length(min = 1))]
    pub movement_type: String,
    pub quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectMovementRequest {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RebuildBalanceRequest {
    #[validate(length(min = 1))]
    pub item_code: String,
    pub warehouse_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub movement_type: Option<String>,
    pub item_code: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceListQuery {
    pub item_code: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub transaction_no: String,
    pub item_code: String,
    pub warehouse_id: Uuid,
    pub movement_type: String,
    pub quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_name: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
}

impl From<stock_movement::Model> for MovementResponse {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            transaction_no: model.transaction_no,
            item_code: model.item_code,
            warehouse_id: model.warehouse_id,
            movement_type: model.movement_type.to_string(),
            quantity: model.quantity,
            reference_type: model.reference_type,
            reference_name: model.reference_name,
            status: model.status.to_string(),
            notes: model.notes,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at,
            created_by: model.created_by,
            approved_at: model.approved_at,
            approved_by: model.approved_by,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub item_code: String,
    pub warehouse_id: Uuid,
    pub current_qty: Decimal,
    pub reserved_qty: Decimal,
    pub available_qty: Decimal,
    pub valuation_rate: Decimal,
    pub total_value: Decimal,
    pub last_receipt_date: Option<DateTime<Utc>>,
    pub last_issue_date: Option<DateTime<Utc>>,
}

impl From<stock_balance::Model> for BalanceResponse {
    fn from(model: stock_balance::Model) -> Self {
        Self {
            item_code: model.item_code,
            warehouse_id: model.warehouse_id,
            current_qty: model.current_qty,
            reserved_qty: model.reserved_qty,
            available_qty: model.available_qty,
            valuation_rate: model.valuation_rate,
            total_value: model.total_value,
            last_receipt_date: model.last_receipt_date,
            last_issue_date: model.last_issue_date,
        }
    }
}

/// List stock movements with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/stock/movements",
    params(MovementListQuery),
    responses(
        (status = 200, description = "Movements listed", body = crate::ApiResponse<PaginatedResponse<MovementResponse>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let status = match query.status.as_deref() {
        Some(value) => Some(parse_movement_status(value)?),
        None => None,
    };
    let movement_type = match query.movement_type.as_deref() {
        Some(value) => Some(parse_movement_type(value)?),
        None => None,
    };

    let filter = MovementFilter {
        status,
        movement_type,
        item_code: query.item_code,
        warehouse_id: query.warehouse_id,
        search: query.search,
    };

    let (records, total) = state
        .services
        .stock
        .list_movements(filter, page, per_page)
        .await
        .map_err(map_service_error)?;

    let items: Vec<MovementResponse> = records.into_iter().map(MovementResponse::from).collect();
    let total_pages = total.div_ceil(per_page);

    Ok(success_response(PaginatedResponse {
        items,
        total,
        page,
        limit: per_page,
        total_pages,
    }))
}

/// Post a manual stock movement; it stays pending until approved
#[utoipa::path(
    post,
    path = "/api/v1/stock/movements",
    request_body = CreateMovementRequest,
    responses(
        (status = 201, description = "Movement posted", body = crate::ApiResponse<MovementResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let movement_type = parse_movement_type(&payload.movement_type)?;
    let input = MovementInput {
        item_code: payload.item_code,
        warehouse_id: payload.warehouse_id,
        movement_type,
        quantity: payload.quantity,
        reference_type: payload.reference_type,
        reference_name: payload.reference_name,
        notes: payload.notes,
        created_by: Some(user.username),
        valuation_rate: None,
    };

    let movement = state
        .services
        .stock
        .post_movement(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(MovementResponse::from(movement)))
}

/// Fetch a stock movement by id
#[utoipa::path(
    get,
    path = "/api/v1/stock/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement fetched", body = crate::ApiResponse<MovementResponse>),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movement = state
        .services
        .stock
        .get_movement(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Stock movement {} not found", id)))?;

    Ok(success_response(MovementResponse::from(movement)))
}

/// Approve a pending movement, updating the ledger and the cached balance
#[utoipa::path(
    post,
    path = "/api/v1/stock/movements/{id}/approve",
    params(("id" = Uuid, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement completed", body = crate::ApiResponse<MovementResponse>),
        (status = 400, description = "Movement is not pending", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn approve_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let movement = state
        .services
        .stock
        .approve_movement(id, Some(user.username))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MovementResponse::from(movement)))
}

/// Reject a pending movement; it never touches a balance
#[utoipa::path(
    post,
    path = "/api/v1/stock/movements/{id}/reject",
    request_body = RejectMovementRequest,
    params(("id" = Uuid, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement cancelled", body = crate::ApiResponse<MovementResponse>),
        (status = 400, description = "Movement is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn reject_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<RejectMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let movement = state
        .services
        .stock
        .reject_movement(id, payload.reason, Some(user.username))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MovementResponse::from(movement)))
}

/// List cached stock balances
#[utoipa::path(
    get,
    path = "/api/v1/stock/balances",
    params(BalanceListQuery),
    responses(
        (status = 200, description = "Balances listed", body = crate::ApiResponse<Vec<BalanceResponse>>)
    ),
    tag = "stock"
)]
pub async fn list_balances(
    State(state): State<AppState>,
    Query(query): Query<BalanceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BalanceFilter {
        item_code: query.item_code,
        warehouse_id: query.warehouse_id,
        search: query.search,
    };

    let balances = state
        .services
        .stock
        .list_balances(filter)
        .await
        .map_err(map_service_error)?;

    let items: Vec<BalanceResponse> = balances.into_iter().map(BalanceResponse::from).collect();
    Ok(success_response(items))
}

/// Balances ordered by ascending availability
#[utoipa::path(
    get,
    path = "/api/v1/stock/balances/low",
    responses(
        (status = 200, description = "Low-stock balances", body = crate::ApiResponse<Vec<BalanceResponse>>)
    ),
    tag = "stock"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let balances = state
        .services
        .stock
        .low_stock()
        .await
        .map_err(map_service_error)?;

    let items: Vec<BalanceResponse> = balances.into_iter().map(BalanceResponse::from).collect();
    Ok(success_response(items))
}

/// Re-derive one cached balance from the full movement history
#[utoipa::path(
    post,
    path = "/api/v1/stock/balances/rebuild",
    request_body = RebuildBalanceRequest,
    responses(
        (status = 200, description = "Balance rebuilt", body = crate::ApiResponse<RebuildReport>)
    ),
    tag = "stock"
)]
pub async fn rebuild_balance(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<RebuildBalanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let report = state
        .services
        .stock
        .rebuild_balance(&payload.item_code, payload.warehouse_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

fn parse_movement_type(value: &str) -> Result<MovementType, ApiError> {
    match value.to_ascii_uppercase().as_str() {
        "IN" => Ok(MovementType::In),
        "OUT" => Ok(MovementType::Out),
        other => Err(ApiError::ValidationError(format!(
            "Unknown movement type '{}'",
            other
        ))),
    }
}

fn parse_movement_status(value: &str) -> Result<MovementStatus, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "pending" => Ok(MovementStatus::Pending),
        "approved" => Ok(MovementStatus::Approved),
        "completed" => Ok(MovementStatus::Completed),
        "cancelled" | "canceled" => Ok(MovementStatus::Cancelled),
        other => Err(ApiError::ValidationError(format!(
            "Unknown movement status '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_parsing_is_case_insensitive() {
        assert_eq!(parse_movement_type("in").unwrap(), MovementType::In);
        assert_eq!(parse_movement_type("OUT").unwrap(), MovementType::Out);
        assert!(parse_movement_type("SIDEWAYS").is_err());
    }

    #[test]
    fn movement_status_accepts_both_cancelled_spellings() {
        assert_eq!(
            parse_movement_status("cancelled").unwrap(),
            MovementStatus::Cancelled
        );
        assert_eq!(
            parse_movement_status("canceled").unwrap(),
            MovementStatus::Cancelled
        );
    }
}
