use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.3.0",
        description = r#"
# Stockroom Goods Receipt & Inventory API

Backend service for the goods-receipt QC workflow, the stock ledger and
BOM costing.

## Features

- **GRN workflow**: server-enforced inspection/approval lifecycle for goods
  receipt notes, with optimistic concurrency on every transition
- **Stock ledger**: pending-gated IN/OUT movements, an append-only ledger
  and cached per-(item, warehouse) balances with history rebuild
- **BOM costing**: component requirements and cost roll-up with margin and
  CGST/SGST percentages
- **Master data**: items, warehouses and purchase orders

## Authentication

All business endpoints require a JWT bearer token obtained from
`POST /auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Errors use a consistent format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Invalid status: illegal transition from approved to pending",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "grns", description = "Goods receipt note workflow"),
        (name = "stock", description = "Stock movements and balances"),
        (name = "boms", description = "Bills of materials and costing"),
        (name = "items", description = "Item master"),
        (name = "warehouses", description = "Warehouse master"),
        (name = "purchase-orders", description = "Purchase orders")
    ),
    paths(
        // GRN workflow
        crate::handlers::grn::create_grn,
        crate::handlers::grn::list_grns,
        crate::handlers::grn::get_grn,
        crate::handlers::grn::start_inspection,
        crate::handlers::grn::inspect_item,
        crate::handlers::grn::complete_inspection,
        crate::handlers::grn::reject_grn,
        crate::handlers::grn::approve_grn,
        crate::handlers::grn::send_back_grn,
        crate::handlers::grn::resubmit_grn,

        // Stock ledger
        crate::handlers::stock::list_movements,
        crate::handlers::stock::create_movement,
        crate::handlers::stock::get_movement,
        crate::handlers::stock::approve_movement,
        crate::handlers::stock::reject_movement,
        crate::handlers::stock::list_balances,
        crate::handlers::stock::low_stock,
        crate::handlers::stock::rebuild_balance,

        // BOM
        crate::handlers::bom::create_bom,
        crate::handlers::bom::list_boms,
        crate::handlers::bom::get_bom,
        crate::handlers::bom::component_requirements,
        crate::handlers::bom::cost_rollup,

        // Master data
        crate::handlers::items::create_item,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // GRN types
            crate::handlers::grn::CreateGrnRequest,
            crate::handlers::grn::GrnItemRequest,
            crate::handlers::grn::TransitionRequest,
            crate::handlers::grn::ReasonedTransitionRequest,
            crate::handlers::grn::InspectItemRequest,
            crate::handlers::grn::GrnSummary,
            crate::handlers::grn::GrnItemResponse,
            crate::handlers::grn::GrnDetail,
            crate::handlers::grn::ApproveGrnResponse,

            // Stock types
            crate::handlers::stock::CreateMovementRequest,
            crate::handlers::stock::RejectMovementRequest,
            crate::handlers::stock::RebuildBalanceRequest,
            crate::handlers::stock::MovementResponse,
            crate::handlers::stock::BalanceResponse,
            crate::services::stock_ledger::RebuildReport,

            // BOM types
            crate::handlers::bom::CreateBomRequest,
            crate::handlers::bom::BomComponentRequest,
            crate::handlers::bom::BomOperationRequest,
            crate::handlers::bom::CostRollupRequest,
            crate::handlers::bom::BomSummary,
            crate::handlers::bom::BomComponentResponse,
            crate::handlers::bom::BomOperationResponse,
            crate::handlers::bom::BomDetailResponse,
            crate::services::bom::ComponentRequirement,
            crate::services::bom::CostBreakdown,

            // Master data types
            crate::handlers::items::CreateItemRequest,
            crate::handlers::items::ItemResponse,
            crate::handlers::warehouses::CreateWarehouseRequest,
            crate::handlers::warehouses::WarehouseResponse,
            crate::handlers::purchase_orders::CreatePurchaseOrderRequest,
            crate::handlers::purchase_orders::PurchaseOrderResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_the_workflow_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Stockroom API"));
        assert!(json.contains("/api/v1/grns/{grn_no}/approve"));
        assert!(json.contains("/api/v1/stock/balances/rebuild"));
        assert!(json.contains("/api/v1/boms/{bom_no}/cost"));
    }
}
