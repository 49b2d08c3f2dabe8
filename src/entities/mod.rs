pub mod bom;
pub mod bom_component;
pub mod bom_operation;
pub mod grn;
pub mod grn_item;
pub mod item;
pub mod purchase_order;
pub mod stock_balance;
pub mod stock_ledger;
pub mod stock_movement;
pub mod user;
pub mod warehouse;
