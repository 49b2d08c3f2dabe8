pub use sea_orm_migration::prelude::*;

mod m20240501_000001_create_users_table;
mod m20240501_000002_create_items_table;
mod m20240501_000003_create_warehouses_table;
mod m20240501_000004_create_purchase_orders_table;
mod m20240501_000005_create_grn_tables;
mod m20240501_000006_create_stock_tables;
mod m20240501_000007_create_bom_tables;
mod m20240501_000008_add_workflow_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_users_table::Migration),
            Box::new(m20240501_000002_create_items_table::Migration),
            Box::new(m20240501_000003_create_warehouses_table::Migration),
            Box::new(m20240501_000004_create_purchase_orders_table::Migration),
            Box::new(m20240501_000005_create_grn_tables::Migration),
            Box::new(m20240501_000006_create_stock_tables::Migration),
            Box::new(m20240501_000007_create_bom_tables::Migration),
            Box::new(m20240501_000008_add_workflow_indexes::Migration),
        ]
    }
}
