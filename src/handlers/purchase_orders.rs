use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    entities::purchase_order::{self, PoStatus},
    errors::ApiError,
    handlers::AppState,
    services::purchase_orders::CreatePurchaseOrderInput,
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

/// Router for purchase order endpoints
pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order))
        .route("/", get(list_purchase_orders))
        .route("/:po_no", get(get_purchase_order))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    #[validate(length(min = 1))]
    pub supplier_name: String,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseOrderResponse {
    pub id: Uuid,
    pub po_no: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<purchase_order::Model> for PurchaseOrderResponse {
    fn from(model: purchase_order::Model) -> Self {
        Self {
            id: model.id,
            po_no: model.po_no,
            supplier_id: model.supplier_id,
            supplier_name: model.supplier_name,
            status: model.status.to_string(),
            order_date: model.order_date,
            total_amount: model.total_amount,
            created_at: model.created_at,
        }
    }
}

/// Create a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created", body = crate::ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let po = state
        .services
        .purchase_orders
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: payload.supplier_id,
            supplier_name: payload.supplier_name,
            order_date: payload.order_date,
            total_amount: payload.total_amount,
            created_by: Some(user.username),
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(PurchaseOrderResponse::from(po)))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PurchaseOrderListQuery),
    responses(
        (status = 200, description = "Purchase orders listed", body = crate::ApiResponse<PaginatedResponse<PurchaseOrderResponse>>)
    ),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let status = match query.status.as_deref() {
        Some(value) => Some(parse_po_status(value)?),
        None => None,
    };

    let (records, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(status, query.supplier_id, page, per_page)
        .await
        .map_err(map_service_error)?;

    let items: Vec<PurchaseOrderResponse> = records
        .into_iter()
        .map(PurchaseOrderResponse::from)
        .collect();
    let total_pages = total.div_ceil(per_page);

    Ok(success_response(PaginatedResponse {
        items,
        total,
        page,
        limit: per_page,
        total_pages,
    }))
}

/// Fetch a purchase order by document number
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{po_no}",
    params(("po_no" = String, Path, description = "Purchase order number")),
    responses(
        (status = 200, description = "Purchase order fetched", body = crate::ApiResponse<PurchaseOrderResponse>),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let po = state
        .services
        .purchase_orders
        .get_purchase_order(&po_no)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase order {} not found", po_no)))?;

    Ok(success_response(PurchaseOrderResponse::from(po)))
}

fn parse_po_status(value: &str) -> Result<PoStatus, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "draft" => Ok(PoStatus::Draft),
        "submitted" => Ok(PoStatus::Submitted),
        "to_receive" => Ok(PoStatus::ToReceive),
        "completed" => Ok(PoStatus::Completed),
        "cancelled" | "canceled" => Ok(PoStatus::Cancelled),
        other => Err(ApiError::ValidationError(format!(
            "Unknown purchase order status '{}'",
            other
        ))),
    }
}
