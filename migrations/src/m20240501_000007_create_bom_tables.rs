use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Boms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Boms::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Boms::BomNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Boms::ItemCode).string().not_null())
                    .col(ColumnDef::new(Boms::BomName).string().not_null())
                    .col(
                        ColumnDef::new(Boms::Quantity)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Boms::Status).string().not_null())
                    .col(
                        ColumnDef::new(Boms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Boms::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(Boms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Boms::UpdatedBy).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BomComponents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BomComponents::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomComponents::BomId).uuid().not_null())
                    .col(
                        ColumnDef::new(BomComponents::ComponentType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomComponents::ItemCode).string().not_null())
                    .col(ColumnDef::new(BomComponents::ItemName).string().not_null())
                    .col(
                        ColumnDef::new(BomComponents::Qty)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BomComponents::Rate)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomComponents::Uom).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bom_components_bom_id")
                            .from(BomComponents::Table, BomComponents::BomId)
                            .to(Boms::Table, Boms::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BomOperations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BomOperations::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomOperations::BomId).uuid().not_null())
                    .col(
                        ColumnDef::new(BomOperations::OperationName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomOperations::Workstation).string().null())
                    .col(
                        ColumnDef::new(BomOperations::TimeMins)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BomOperations::HourlyRate)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BomOperations::OperatingCost)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bom_operations_bom_id")
                            .from(BomOperations::Table, BomOperations::BomId)
                            .to(Boms::Table, Boms::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BomOperations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BomComponents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Boms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Boms {
    Table,
    Id,
    BomNo,
    ItemCode,
    BomName,
    Quantity,
    Status,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum BomComponents {
    Table,
    Id,
    BomId,
    ComponentType,
    ItemCode,
    ItemName,
    Qty,
    Rate,
    Uom,
}

#[derive(DeriveIden)]
enum BomOperations {
    Table,
    Id,
    BomId,
    OperationName,
    Workstation,
    TimeMins,
    HourlyRate,
    OperatingCost,
}
