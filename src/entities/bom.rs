use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BomStatus {
    #[sea_orm(string_value = "draft")]
    Draft,

    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl fmt::Display for BomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BomStatus::Draft => write!(f, "draft"),
            BomStatus::Active => write!(f, "active"),
            BomStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Bill of materials header for one output item.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub bom_no: String,

    /// Item produced by this BOM.
    pub item_code: String,

    pub bom_name: String,

    /// Batch size the component quantities refer to.
    pub quantity: Decimal,

    pub status: BomStatus,

    pub created_at: DateTime<Utc>,

    pub created_by: Option<String>,

    pub updated_at: DateTime<Utc>,

    pub updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bom_component::Entity")]
    Components,

    #[sea_orm(has_many = "super::bom_operation::Entity")]
    Operations,
}

impl Related<super::bom_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl Related<super::bom_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
