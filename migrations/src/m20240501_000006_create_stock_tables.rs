use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::TransactionNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(StockMovements::ItemCode).string().not_null())
                    .col(ColumnDef::new(StockMovements::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockMovements::MovementType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Quantity)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::ReferenceType)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::ReferenceName)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(StockMovements::Status).string().not_null())
                    .col(ColumnDef::new(StockMovements::Notes).text().null())
                    .col(
                        ColumnDef::new(StockMovements::RejectionReason)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(StockMovements::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(StockMovements::ApprovedBy).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockLedger::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockLedger::ItemCode).string().not_null())
                    .col(ColumnDef::new(StockLedger::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockLedger::TransactionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockLedger::QtyIn)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockLedger::QtyOut)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockLedger::ReferenceType).string().null())
                    .col(ColumnDef::new(StockLedger::ReferenceName).string().null())
                    .col(ColumnDef::new(StockLedger::Remarks).text().null())
                    .col(ColumnDef::new(StockLedger::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(StockLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockBalances::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockBalances::ItemCode).string().not_null())
                    .col(ColumnDef::new(StockBalances::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockBalances::CurrentQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::ReservedQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::AvailableQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::ValuationRate)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::TotalValue)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::LastReceiptDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::LastIssueDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One cached balance per (item, warehouse) pair.
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_balances_item_warehouse")
                    .table(StockBalances::Table)
                    .col(StockBalances::ItemCode)
                    .col(StockBalances::WarehouseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockBalances::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(StockLedger::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    Id,
    TransactionNo,
    ItemCode,
    WarehouseId,
    MovementType,
    Quantity,
    ReferenceType,
    ReferenceName,
    Status,
    Notes,
    RejectionReason,
    CreatedAt,
    CreatedBy,
    ApprovedAt,
    ApprovedBy,
}

#[derive(DeriveIden)]
enum StockLedger {
    Table,
    Id,
    ItemCode,
    WarehouseId,
    TransactionDate,
    QtyIn,
    QtyOut,
    ReferenceType,
    ReferenceName,
    Remarks,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StockBalances {
    Table,
    Id,
    ItemCode,
    WarehouseId,
    CurrentQty,
    ReservedQty,
    AvailableQty,
    ValuationRate,
    TotalValue,
    LastReceiptDate,
    LastIssueDate,
    CreatedAt,
    UpdatedAt,
}
