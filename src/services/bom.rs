use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        bom::{self, BomStatus, Entity as BomEntity},
        bom_component::{self, ComponentType, Entity as BomComponentEntity},
        bom_operation::{self, Entity as BomOperationEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// One component line of a BOM being created.
#[derive(Debug, Clone)]
pub struct ComponentInput {
    pub component_type: ComponentType,
    pub item_code: String,
    pub item_name: String,
    pub qty: Decimal,
    pub rate: Decimal,
    pub uom: String,
}

/// One routing operation of a BOM being created.
#[derive(Debug, Clone)]
pub struct OperationInput {
    pub operation_name: String,
    pub workstation: Option<String>,
    pub time_mins: Decimal,
    pub hourly_rate: Decimal,
    pub operating_cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateBomInput {
    pub item_code: String,
    pub bom_name: String,
    pub quantity: Decimal,
    pub components: Vec<ComponentInput>,
    pub operations: Vec<OperationInput>,
    pub created_by: Option<String>,
}

/// A BOM header with its component and operation lines.
#[derive(Debug, Clone, Serialize)]
pub struct BomDetail {
    pub bom: bom::Model,
    pub components: Vec<bom_component::Model>,
    pub operations: Vec<bom_operation::Model>,
}

/// Requirement for one component at a given production quantity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentRequirement {
    pub item_code: String,
    pub item_name: String,
    pub component_type: String,
    pub required_qty: Decimal,
    pub uom: String,
}

/// Full breakdown of a BOM cost roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CostBreakdown {
    pub quantity: Decimal,
    pub material_cost: Decimal,
    pub operation_cost: Decimal,
    pub base_cost: Decimal,
    pub margin_pct: Decimal,
    pub profit: Decimal,
    pub cgst_pct: Decimal,
    pub sgst_pct: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub grand_total: Decimal,
}

/// Cost of one routing operation. An explicit operating cost wins; otherwise
/// the cost is derived from operation time and the workstation hourly rate.
fn operation_cost(op: &bom_operation::Model) -> Decimal {
    if op.operating_cost > Decimal::ZERO {
        op.operating_cost
    } else {
        op.time_mins / Decimal::from(60) * op.hourly_rate
    }
}

/// Rolls up the cost of producing `quantity` assemblies.
///
/// Material and operation costs are summed per assembly and scaled, the
/// profit margin is applied to the base cost, and CGST+SGST apply to the
/// margined subtotal. Missing or zero rates contribute zero; they are never
/// an error. Scrap lines are excluded.
pub fn roll_up_cost(
    components: &[bom_component::Model],
    operations: &[bom_operation::Model],
    quantity: Decimal,
    margin_pct: Decimal,
    cgst_pct: Decimal,
    sgst_pct: Decimal,
) -> CostBreakdown {
    let material_per_assembly: Decimal = components
        .iter()
        .filter(|c| c.component_type != ComponentType::Scrap)
        .map(|c| c.qty * c.rate)
        .sum();

    let operation_per_assembly: Decimal = operations.iter().map(operation_cost).sum();

    let material_cost = material_per_assembly * quantity;
    let operation_cost = operation_per_assembly * quantity;
    let base_cost = material_cost + operation_cost;

    let profit = base_cost * margin_pct / Decimal::ONE_HUNDRED;
    let subtotal = base_cost + profit;

    let cgst_amount = subtotal * cgst_pct / Decimal::ONE_HUNDRED;
    let sgst_amount = subtotal * sgst_pct / Decimal::ONE_HUNDRED;

    CostBreakdown {
        quantity,
        material_cost,
        operation_cost,
        base_cost,
        margin_pct,
        profit,
        cgst_pct,
        sgst_pct,
        cgst_amount,
        sgst_amount,
        grand_total: subtotal + cgst_amount + sgst_amount,
    }
}

/// Scales the per-assembly component quantities to a production quantity.
pub fn scale_components(
    components: &[bom_component::Model],
    quantity: Decimal,
) -> Vec<ComponentRequirement> {
    components
        .iter()
        .map(|c| ComponentRequirement {
            item_code: c.item_code.clone(),
            item_name: c.item_name.clone(),
            component_type: c.component_type.to_string(),
            required_qty: c.qty * quantity,
            uom: c.uom.clone(),
        })
        .collect()
}

/// Service for bills of materials and their cost roll-up.
#[derive(Clone)]
pub struct BomService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl BomService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a BOM with its components and operations in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_bom(&self, input: CreateBomInput) -> Result<BomDetail, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "BOM batch quantity must be positive".to_string(),
            ));
        }
        for component in &input.components {
            if component.qty < Decimal::ZERO || component.rate < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Component {} has a negative quantity or rate",
                    component.item_code
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let bom_no = next_bom_no(&txn).await?;
        let header = bom::ActiveModel {
            id: Set(Uuid::new_v4()),
            bom_no: Set(bom_no.clone()),
            item_code: Set(input.item_code),
            bom_name: Set(input.bom_name),
            quantity: Set(input.quantity),
            status: Set(BomStatus::Active),
            created_at: Set(now),
            created_by: Set(input.created_by.clone()),
            updated_at: Set(now),
            updated_by: Set(None),
        };
        let created = header.insert(&txn).await.map_err(|e| {
            error!("Failed to create BOM: {}", e);
            ServiceError::db_error(e)
        })?;

        let mut components = Vec::with_capacity(input.components.len());
        for line in input.components {
            let component = bom_component::ActiveModel {
                id: Set(Uuid::new_v4()),
                bom_id: Set(created.id),
                component_type: Set(line.component_type),
                item_code: Set(line.item_code),
                item_name: Set(line.item_name),
                qty: Set(line.qty),
                rate: Set(line.rate),
                uom: Set(line.uom),
            };
            components.push(
                component
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::db_error)?,
            );
        }

        let mut operations = Vec::with_capacity(input.operations.len());
        for op in input.operations {
            let operation = bom_operation::ActiveModel {
                id: Set(Uuid::new_v4()),
                bom_id: Set(created.id),
                operation_name: Set(op.operation_name),
                workstation: Set(op.workstation),
                time_mins: Set(op.time_mins),
                hourly_rate: Set(op.hourly_rate),
                operating_cost: Set(op.operating_cost),
            };
            operations.push(
                operation
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::db_error)?,
            );
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::BomCreated {
                    bom_id: created.id,
                    bom_no: bom_no.clone(),
                })
                .await;
        }

        info!(
            "BOM {} created with {} component(s), {} operation(s)",
            bom_no,
            components.len(),
            operations.len()
        );
        Ok(BomDetail {
            bom: created,
            components,
            operations,
        })
    }

    /// Fetches a BOM with components and operations.
    #[instrument(skip(self))]
    pub async fn get_bom(&self, bom_no: &str) -> Result<Option<BomDetail>, ServiceError> {
        let db = &*self.db;

        let bom = BomEntity::find()
            .filter(bom::Column::BomNo.eq(bom_no))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let Some(bom) = bom else {
            return Ok(None);
        };

        let components = BomComponentEntity::find()
            .filter(bom_component::Column::BomId.eq(bom.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let operations = BomOperationEntity::find()
            .filter(bom_operation::Column::BomId.eq(bom.id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(Some(BomDetail {
            bom,
            components,
            operations,
        }))
    }

    /// Lists BOM headers with pagination.
    #[instrument(skip(self))]
    pub async fn list_boms(
        &self,
        status: Option<BomStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<bom::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let mut query = BomEntity::find().order_by_desc(bom::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(bom::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let boms = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((boms, total))
    }

    /// Component quantities required to produce `quantity` assemblies.
    #[instrument(skip(self))]
    pub async fn component_requirements(
        &self,
        bom_no: &str,
        quantity: Decimal,
    ) -> Result<Vec<ComponentRequirement>, ServiceError> {
        let detail = self
            .get_bom(bom_no)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_no)))?;

        Ok(scale_components(&detail.components, quantity))
    }

    /// Rolls up the cost for `quantity` assemblies with the given margin and
    /// GST percentages.
    #[instrument(skip(self))]
    pub async fn cost_rollup(
        &self,
        bom_no: &str,
        quantity: Decimal,
        margin_pct: Decimal,
        cgst_pct: Decimal,
        sgst_pct: Decimal,
    ) -> Result<CostBreakdown, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Roll-up quantity must be positive".to_string(),
            ));
        }

        let detail = self
            .get_bom(bom_no)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_no)))?;

        Ok(roll_up_cost(
            &detail.components,
            &detail.operations,
            quantity,
            margin_pct,
            cgst_pct,
            sgst_pct,
        ))
    }
}

/// Generates the next `BOM-YYYYMMDD-NNNN` document number.
async fn next_bom_no<C: sea_orm::ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let prefix = format!("BOM-{}-", Utc::now().format("%Y%m%d"));
    let existing = BomEntity::find()
        .filter(bom::Column::BomNo.starts_with(&prefix))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("{}{:04}", prefix, existing + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn component(component_type: ComponentType, qty: Decimal, rate: Decimal) -> bom_component::Model {
        bom_component::Model {
            id: Uuid::new_v4(),
            bom_id: Uuid::new_v4(),
            component_type,
            item_code: "CMP-001".into(),
            item_name: "Component".into(),
            qty,
            rate,
            uom: "Nos".into(),
        }
    }

    fn operation(time_mins: Decimal, hourly_rate: Decimal, operating_cost: Decimal) -> bom_operation::Model {
        bom_operation::Model {
            id: Uuid::new_v4(),
            bom_id: Uuid::new_v4(),
            operation_name: "Milling".into(),
            workstation: Some("VMC-1".into()),
            time_mins,
            hourly_rate,
            operating_cost,
        }
    }

    #[test]
    fn operation_cost_prefers_explicit_value() {
        assert_eq!(operation_cost(&operation(dec!(30), dec!(500), dec!(400))), dec!(400));
    }

    #[test]
    fn operation_cost_derives_from_time_and_rate() {
        // 30 minutes at 500/hour
        assert_eq!(operation_cost(&operation(dec!(30), dec!(500), dec!(0))), dec!(250));
    }

    #[test]
    fn scrap_lines_are_not_priced() {
        let components = [
            component(ComponentType::RawMaterial, dec!(2), dec!(10)),
            component(ComponentType::Scrap, dec!(1), dec!(999)),
        ];
        let breakdown = roll_up_cost(&components, &[], dec!(1), dec!(0), dec!(0), dec!(0));
        assert_eq!(breakdown.material_cost, dec!(20));
        assert_eq!(breakdown.grand_total, dec!(20));
    }

    #[test]
    fn requirements_scale_with_quantity() {
        let components = [component(ComponentType::RawMaterial, dec!(3), dec!(5))];
        let reqs = scale_components(&components, dec!(12));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].required_qty, dec!(36));
    }
}
