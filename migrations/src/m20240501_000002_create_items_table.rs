use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Items::ItemCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Items::ItemName).string().not_null())
                    .col(ColumnDef::new(Items::ItemGroup).string().null())
                    .col(ColumnDef::new(Items::Uom).string().not_null())
                    .col(ColumnDef::new(Items::HsnCode).string().null())
                    .col(
                        ColumnDef::new(Items::ValuationRate)
                            .decimal_len(18, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Items::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Items::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    ItemCode,
    ItemName,
    ItemGroup,
    Uom,
    HsnCode,
    ValuationRate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
