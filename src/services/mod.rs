pub mod bom;
pub mod grn;
pub mod items;
pub mod purchase_orders;
pub mod stock_ledger;
pub mod warehouses;
