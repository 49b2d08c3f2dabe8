pub mod bom;
pub mod common;
pub mod grn;
pub mod items;
pub mod purchase_orders;
pub mod stock;
pub mod warehouses;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub grn: Arc<crate::services::grn::GrnService>,
    pub stock: Arc<crate::services::stock_ledger::StockLedgerService>,
    pub bom: Arc<crate::services::bom::BomService>,
    pub items: Arc<crate::services::items::ItemService>,
    pub warehouses: Arc<crate::services::warehouses::WarehouseService>,
    pub purchase_orders: Arc<crate::services::purchase_orders::PurchaseOrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let shared_sender = Arc::new(event_sender.clone());

        let grn = Arc::new(crate::services::grn::GrnService::new(
            db_pool.clone(),
            shared_sender,
        ));
        let stock = Arc::new(crate::services::stock_ledger::StockLedgerService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let bom = Arc::new(crate::services::bom::BomService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let items = Arc::new(crate::services::items::ItemService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let warehouses = Arc::new(crate::services::warehouses::WarehouseService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let purchase_orders = Arc::new(
            crate::services::purchase_orders::PurchaseOrderService::new(
                db_pool,
                Some(event_sender),
            ),
        );

        Self {
            grn,
            stock,
            bom,
            items,
            warehouses,
            purchase_orders,
        }
    }
}
