use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser, entities::warehouse, errors::ApiError, handlers::AppState,
    services::warehouses::CreateWarehouseInput,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Router for warehouse master endpoints
pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_warehouse))
        .route("/", get(list_warehouses))
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1))]
    pub warehouse_code: String,
    #[validate(length(min = 1))]
    pub warehouse_name: String,
    pub department: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WarehouseListQuery {
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub warehouse_code: String,
    pub warehouse_name: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<warehouse::Model> for WarehouseResponse {
    fn from(model: warehouse::Model) -> Self {
        Self {
            id: model.id,
            warehouse_code: model.warehouse_code,
            warehouse_name: model.warehouse_name,
            department: model.department,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Create a warehouse
#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created", body = crate::ApiResponse<WarehouseResponse>),
        (status = 409, description = "Warehouse code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let warehouse = state
        .services
        .warehouses
        .create_warehouse(CreateWarehouseInput {
            warehouse_code: payload.warehouse_code,
            warehouse_name: payload.warehouse_name,
            department: payload.department,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(WarehouseResponse::from(warehouse)))
}

/// List warehouses
#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(WarehouseListQuery),
    responses(
        (status = 200, description = "Warehouses listed", body = crate::ApiResponse<Vec<WarehouseResponse>>)
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let warehouses = state
        .services
        .warehouses
        .list_warehouses(query.active_only.unwrap_or(false))
        .await
        .map_err(map_service_error)?;

    let items: Vec<WarehouseResponse> = warehouses
        .into_iter()
        .map(WarehouseResponse::from)
        .collect();
    Ok(success_response(items))
}
