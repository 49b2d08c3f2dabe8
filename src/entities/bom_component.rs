use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a component line within a BOM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComponentType {
    #[sea_orm(string_value = "finished_good")]
    FinishedGood,

    #[sea_orm(string_value = "sub_assembly")]
    SubAssembly,

    #[sea_orm(string_value = "raw_material")]
    RawMaterial,

    /// Scrap lines are tracked but never priced into the roll-up.
    #[sea_orm(string_value = "scrap")]
    Scrap,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::FinishedGood => write!(f, "finished_good"),
            ComponentType::SubAssembly => write!(f, "sub_assembly"),
            ComponentType::RawMaterial => write!(f, "raw_material"),
            ComponentType::Scrap => write!(f, "scrap"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bom_components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub bom_id: Uuid,

    pub component_type: ComponentType,

    pub item_code: String,

    pub item_name: String,

    /// Quantity consumed per assembly.
    pub qty: Decimal,

    /// Unit rate; zero when the item has no costing yet.
    pub rate: Decimal,

    pub uom: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bom::Entity",
        from = "Column::BomId",
        to = "super::bom::Column::Id"
    )]
    Bom,
}

impl Related<super::bom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
