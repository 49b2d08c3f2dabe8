use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Warehouses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Warehouses::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Warehouses::WarehouseCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Warehouses::WarehouseName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Warehouses::Department).string().null())
                    .col(ColumnDef::new(Warehouses::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Warehouses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Warehouses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Warehouses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Warehouses {
    Table,
    Id,
    WarehouseCode,
    WarehouseName,
    Department,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
