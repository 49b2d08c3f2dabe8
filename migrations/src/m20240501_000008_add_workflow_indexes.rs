use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // GRN kanban views filter by status, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_grn_requests_status_created")
                    .table(GrnRequests::Table)
                    .col(GrnRequests::Status)
                    .col((GrnRequests::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Line-item fetch per GRN
        manager
            .create_index(
                Index::create()
                    .name("idx_grn_request_items_grn_id")
                    .table(GrnRequestItems::Table)
                    .col(GrnRequestItems::GrnId)
                    .to_owned(),
            )
            .await?;

        // Balance rebuild scans completed movements per (item, warehouse)
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_item_warehouse_status")
                    .table(StockMovements::Table)
                    .col(StockMovements::ItemCode)
                    .col(StockMovements::WarehouseId)
                    .col(StockMovements::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_created")
                    .table(StockMovements::Table)
                    .col((StockMovements::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Ledger reads per (item, warehouse), chronological
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_ledger_item_warehouse_date")
                    .table(StockLedger::Table)
                    .col(StockLedger::ItemCode)
                    .col(StockLedger::WarehouseId)
                    .col(StockLedger::TransactionDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_stock_ledger_item_warehouse_date")
                    .table(StockLedger::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_stock_movements_created")
                    .table(StockMovements::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_stock_movements_item_warehouse_status")
                    .table(StockMovements::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_grn_request_items_grn_id")
                    .table(GrnRequestItems::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_grn_requests_status_created")
                    .table(GrnRequests::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum GrnRequests {
    Table,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GrnRequestItems {
    Table,
    GrnId,
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    ItemCode,
    WarehouseId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StockLedger {
    Table,
    ItemCode,
    WarehouseId,
    TransactionDate,
}
