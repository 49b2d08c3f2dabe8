use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GrnRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GrnRequests::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequests::GrnNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GrnRequests::PoNo).string().null())
                    .col(ColumnDef::new(GrnRequests::SupplierId).uuid().not_null())
                    .col(
                        ColumnDef::new(GrnRequests::SupplierName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequests::ReceiptDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrnRequests::Status).string().not_null())
                    .col(ColumnDef::new(GrnRequests::Notes).text().null())
                    .col(ColumnDef::new(GrnRequests::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(GrnRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrnRequests::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(GrnRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrnRequests::UpdatedBy).string().null())
                    .col(ColumnDef::new(GrnRequests::Version).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GrnRequestItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GrnRequestItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrnRequestItems::GrnId).uuid().not_null())
                    .col(
                        ColumnDef::new(GrnRequestItems::ItemCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::ItemName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::PoQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::ReceivedQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::AcceptedQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::RejectedQty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrnRequestItems::BatchNo).string().null())
                    .col(
                        ColumnDef::new(GrnRequestItems::WarehouseName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::ItemStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::QcChecks)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::InspectionNotes)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GrnRequestItems::InspectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grn_request_items_grn_id")
                            .from(GrnRequestItems::Table, GrnRequestItems::GrnId)
                            .to(GrnRequests::Table, GrnRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GrnRequestItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GrnRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GrnRequests {
    Table,
    Id,
    GrnNo,
    PoNo,
    SupplierId,
    SupplierName,
    ReceiptDate,
    Status,
    Notes,
    RejectionReason,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    Version,
}

#[derive(DeriveIden)]
enum GrnRequestItems {
    Table,
    Id,
    GrnId,
    ItemCode,
    ItemName,
    PoQty,
    ReceivedQty,
    AcceptedQty,
    RejectedQty,
    BatchNo,
    WarehouseName,
    ItemStatus,
    QcChecks,
    InspectionNotes,
    InspectedAt,
}
