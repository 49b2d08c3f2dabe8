use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    entities::{
        bom::{self, BomStatus},
        bom_component::{self, ComponentType},
        bom_operation,
    },
    errors::ApiError,
    handlers::AppState,
    services::bom::{
        BomDetail, ComponentInput, ComponentRequirement, CostBreakdown, CreateBomInput,
        OperationInput,
    },
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

/// Router for BOM endpoints
pub fn bom_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_bom))
        .route("/", get(list_boms))
        .route("/:bom_no", get(get_bom))
        .route("/:bom_no/requirements", get(component_requirements))
        .route("/:bom_no/cost", post(cost_rollup))
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, ToSchema)]
pub struct BomComponentRequest {
    /// `finished_good`, `sub_assembly`, `raw_material` or `scrap`
    #[validate(length(min = 1))]
    pub component_type: String,
    #[validate(length(min = 1))]
    pub item_code: String,
    #[validate(length(min = 1))]
    pub item_name: String,
    pub qty: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    #[validate(length(min = 1))]
    pub uom: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, ToSchema)]
pub struct BomOperationRequest {
    #[validate(length(min = 1))]
    pub operation_name: String,
    pub workstation: Option<String>,
    #[serde(default)]
    pub time_mins: Decimal,
    #[serde(default)]
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub operating_cost: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBomRequest {
    #[validate(length(min = 1))]
    pub item_code: String,
    #[validate(length(min = 1))]
    pub bom_name: String,
    pub quantity: Decimal,
    #[validate(length(min = 1))]
    pub components: Vec<BomComponentRequest>,
    #[serde(default)]
    pub operations: Vec<BomOperationRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CostRollupRequest {
    pub quantity: Decimal,
    /// Profit margin percentage applied to the base cost.
    #[serde(default)]
    pub margin_pct: Decimal,
    /// Defaults to the configured CGST rate when omitted.
    pub cgst_pct: Option<Decimal>,
    /// Defaults to the configured SGST rate when omitted.
    pub sgst_pct: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BomListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequirementsQuery {
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BomSummary {
    pub id: Uuid,
    pub bom_no: String,
    pub item_code: String,
    pub bom_name: String,
    pub quantity: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<bom::Model> for BomSummary {
    fn from(model: bom::Model) -> Self {
        Self {
            id: model.id,
            bom_no: model.bom_no,
            item_code: model.item_code,
            bom_name: model.bom_name,
            quantity: model.quantity,
            status: model.status.to_string(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BomComponentResponse {
    pub id: Uuid,
    pub component_type: String,
    pub item_code: String,
    pub item_name: String,
    pub qty: Decimal,
    pub rate: Decimal,
    pub uom: String,
}

impl From<bom_component::Model> for BomComponentResponse {
    fn from(model: bom_component::Model) -> Self {
        Self {
            id: model.id,
            component_type: model.component_type.to_string(),
            item_code: model.item_code,
            item_name: model.item_name,
            qty: model.qty,
            rate: model.rate,
            uom: model.uom,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BomOperationResponse {
    pub id: Uuid,
    pub operation_name: String,
    pub workstation: Option<String>,
    pub time_mins: Decimal,
    pub hourly_rate: Decimal,
    pub operating_cost: Decimal,
}

impl From<bom_operation::Model> for BomOperationResponse {
    fn from(model: bom_operation::Model) -> Self {
        Self {
            id: model.id,
            operation_name: model.operation_name,
            workstation: model.workstation,
            time_mins: model.time_mins,
            hourly_rate: model.hourly_rate,
            operating_cost: model.operating_cost,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BomDetailResponse {
    #[serde(flatten)]
    pub bom: BomSummary,
    pub components: Vec<BomComponentResponse>,
    pub operations: Vec<BomOperationResponse>,
}

impl From<BomDetail> for BomDetailResponse {
    fn from(detail: BomDetail) -> Self {
        Self {
            bom: BomSummary::from(detail.bom),
            components: detail
                .components
                .into_iter()
                .map(BomComponentResponse::from)
                .collect(),
            operations: detail
                .operations
                .into_iter()
                .map(BomOperationResponse::from)
                .collect(),
        }
    }
}

/// Create a BOM with components and operations
#[utoipa::path(
    post,
    path = "/api/v1/boms",
    request_body = CreateBomRequest,
    responses(
        (status = 201, description = "BOM created", body = crate::ApiResponse<BomDetailResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn create_bom(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let components = payload
        .components
        .into_iter()
        .map(|c| {
            Ok(ComponentInput {
                component_type: parse_component_type(&c.component_type)?,
                item_code: c.item_code,
                item_name: c.item_name,
                qty: c.qty,
                rate: c.rate,
                uom: c.uom,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let operations = payload
        .operations
        .into_iter()
        .map(|op| OperationInput {
            operation_name: op.operation_name,
            workstation: op.workstation,
            time_mins: op.time_mins,
            hourly_rate: op.hourly_rate,
            operating_cost: op.operating_cost,
        })
        .collect();

    let input = CreateBomInput {
        item_code: payload.item_code,
        bom_name: payload.bom_name,
        quantity: payload.quantity,
        components,
        operations,
        created_by: Some(user.username),
    };

    let detail = state
        .services
        .bom
        .create_bom(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(BomDetailResponse::from(detail)))
}

/// List BOM headers
#[utoipa::path(
    get,
    path = "/api/v1/boms",
    params(BomListQuery),
    responses(
        (status = 200, description = "BOMs listed", body = crate::ApiResponse<PaginatedResponse<BomSummary>>)
    ),
    tag = "boms"
)]
pub async fn list_boms(
    State(state): State<AppState>,
    Query(query): Query<BomListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let status = match query.status.as_deref() {
        Some(value) => Some(parse_bom_status(value)?),
        None => None,
    };

    let (records, total) = state
        .services
        .bom
        .list_boms(status, page, per_page)
        .await
        .map_err(map_service_error)?;

    let items: Vec<BomSummary> = records.into_iter().map(BomSummary::from).collect();
    let total_pages = total.div_ceil(per_page);

    Ok(success_response(PaginatedResponse {
        items,
        total,
        page,
        limit: per_page,
        total_pages,
    }))
}

/// Fetch a BOM with components and operations
#[utoipa::path(
    get,
    path = "/api/v1/boms/{bom_no}",
    params(("bom_no" = String, Path, description = "BOM document number")),
    responses(
        (status = 200, description = "BOM fetched", body = crate::ApiResponse<BomDetailResponse>),
        (status = 404, description = "BOM not found", body = crate::errors::ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn get_bom(
    State(state): State<AppState>,
    Path(bom_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .bom
        .get_bom(&bom_no)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("BOM {} not found", bom_no)))?;

    Ok(success_response(BomDetailResponse::from(detail)))
}

/// Component quantities required for a production quantity
#[utoipa::path(
    get,
    path = "/api/v1/boms/{bom_no}/requirements",
    params(
        ("bom_no" = String, Path, description = "BOM document number"),
        RequirementsQuery
    ),
    responses(
        (status = 200, description = "Requirements computed", body = crate::ApiResponse<Vec<ComponentRequirement>>),
        (status = 404, description = "BOM not found", body = crate::errors::ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn component_requirements(
    State(state): State<AppState>,
    Path(bom_no): Path<String>,
    Query(query): Query<RequirementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requirements = state
        .services
        .bom
        .component_requirements(&bom_no, query.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(requirements))
}

/// Roll up the cost for a quantity, margin and GST percentages
#[utoipa::path(
    post,
    path = "/api/v1/boms/{bom_no}/cost",
    request_body = CostRollupRequest,
    params(("bom_no" = String, Path, description = "BOM document number")),
    responses(
        (status = 200, description = "Cost breakdown", body = crate::ApiResponse<CostBreakdown>),
        (status = 404, description = "BOM not found", body = crate::errors::ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn cost_rollup(
    State(state): State<AppState>,
    Path(bom_no): Path<String>,
    Json(payload): Json<CostRollupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cgst = payload
        .cgst_pct
        .unwrap_or_else(|| decimal_from_f64(state.config.default_cgst_rate));
    let sgst = payload
        .sgst_pct
        .unwrap_or_else(|| decimal_from_f64(state.config.default_sgst_rate));

    let breakdown = state
        .services
        .bom
        .cost_rollup(&bom_no, payload.quantity, payload.margin_pct, cgst, sgst)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(breakdown))
}

fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn parse_component_type(value: &str) -> Result<ComponentType, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "finished_good" => Ok(ComponentType::FinishedGood),
        "sub_assembly" => Ok(ComponentType::SubAssembly),
        "raw_material" => Ok(ComponentType::RawMaterial),
        "scrap" => Ok(ComponentType::Scrap),
        other => Err(ApiError::ValidationError(format!(
            "Unknown component type '{}'",
            other
        ))),
    }
}

fn parse_bom_status(value: &str) -> Result<BomStatus, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "draft" => Ok(BomStatus::Draft),
        "active" => Ok(BomStatus::Active),
        "inactive" => Ok(BomStatus::Inactive),
        other => Err(ApiError::ValidationError(format!(
            "Unknown BOM status '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_parsing_covers_all_variants() {
        assert_eq!(
            parse_component_type("raw_material").unwrap(),
            ComponentType::RawMaterial
        );
        assert_eq!(
            parse_component_type("SUB_ASSEMBLY").unwrap(),
            ComponentType::SubAssembly
        );
        assert!(parse_component_type("byproduct").is_err());
    }
}
