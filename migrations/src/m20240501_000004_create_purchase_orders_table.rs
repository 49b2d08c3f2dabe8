use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::PoNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::SupplierName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::TotalAmount)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(PurchaseOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    PoNo,
    SupplierId,
    SupplierName,
    Status,
    OrderDate,
    TotalAmount,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
}
