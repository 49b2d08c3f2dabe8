use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    entities::item,
    errors::ApiError,
    handlers::AppState,
    services::items::CreateItemInput,
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

/// Router for item master endpoints
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/", get(list_items))
        .route("/:item_code", get(get_item))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1))]
    pub item_code: String,
    #[validate(length(min = 1))]
    pub item_name: String,
    pub item_group: Option<String>,
    #[validate(length(min = 1))]
    pub uom: String,
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub valuation_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub item_group: Option<String>,
    pub uom: String,
    pub hsn_code: Option<String>,
    pub valuation_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<item::Model> for ItemResponse {
    fn from(model: item::Model) -> Self {
        Self {
            id: model.id,
            item_code: model.item_code,
            item_name: model.item_name,
            item_group: model.item_group,
            uom: model.uom,
            hsn_code: model.hsn_code,
            valuation_rate: model.valuation_rate,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Create an item master record
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = crate::ApiResponse<ItemResponse>),
        (status = 409, description = "Item code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .items
        .create_item(CreateItemInput {
            item_code: payload.item_code,
            item_name: payload.item_name,
            item_group: payload.item_group,
            uom: payload.uom,
            hsn_code: payload.hsn_code,
            valuation_rate: payload.valuation_rate,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ItemResponse::from(item)))
}

/// List item master records
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items listed", body = crate::ApiResponse<PaginatedResponse<ItemResponse>>)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .items
        .list_items(
            query.search,
            query.active_only.unwrap_or(false),
            page,
            per_page,
        )
        .await
        .map_err(map_service_error)?;

    let items: Vec<ItemResponse> = records.into_iter().map(ItemResponse::from).collect();
    let total_pages = total.div_ceil(per_page);

    Ok(success_response(PaginatedResponse {
        items,
        total,
        page,
        limit: per_page,
        total_pages,
    }))
}

/// Fetch an item by code
#[utoipa::path(
    get,
    path = "/api/v1/items/{item_code}",
    params(("item_code" = String, Path, description = "Item code")),
    responses(
        (status = 200, description = "Item fetched", body = crate::ApiResponse<ItemResponse>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .items
        .get_item(&item_code)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Item {} not found", item_code)))?;

    Ok(success_response(ItemResponse::from(item)))
}
