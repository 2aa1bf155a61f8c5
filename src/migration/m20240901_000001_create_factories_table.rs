use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Factories {
    Table,
    Id,
    DisplayNumber,
    Lat,
    Lng,
    Landcode,
    Towncode,
    Townname,
    Sectcode,
    Sectname,
    Name,
    FactoryType,
    BeforeRelease,
    Source,
    CetReviewStatus,
    CetReportStatus,
    StatusTime,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Factories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Factories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Factories::DisplayNumber).integer().not_null())
                    .col(ColumnDef::new(Factories::Lat).double().not_null())
                    .col(ColumnDef::new(Factories::Lng).double().not_null())
                    .col(ColumnDef::new(Factories::Landcode).string_len(50).null())
                    .col(ColumnDef::new(Factories::Towncode).string_len(50).null())
                    .col(ColumnDef::new(Factories::Townname).string_len(50).null())
                    .col(ColumnDef::new(Factories::Sectcode).string_len(50).null())
                    .col(ColumnDef::new(Factories::Sectname).string_len(50).null())
                    .col(ColumnDef::new(Factories::Name).string_len(50).null())
                    .col(ColumnDef::new(Factories::FactoryType).string_len(3).null())
                    .col(
                        ColumnDef::new(Factories::BeforeRelease)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Factories::Source)
                            .string_len(1)
                            .not_null()
                            .default("U"),
                    )
                    .col(
                        ColumnDef::new(Factories::CetReviewStatus)
                            .string_len(1)
                            .not_null()
                            .default("A"),
                    )
                    .col(
                        ColumnDef::new(Factories::CetReportStatus)
                            .string_len(1)
                            .not_null()
                            .default("A"),
                    )
                    .col(
                        ColumnDef::new(Factories::StatusTime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Factories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Factories::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Factories::DeletedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // Storage-level guard for the display_number invariant: two racing
        // creations cannot both commit the same number.
        manager
            .create_index(
                Index::create()
                    .name("idx_factories_display_number_unique")
                    .table(Factories::Table)
                    .col(Factories::DisplayNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Range scans for the nearby-factory bounding-box prefilter.
        manager
            .create_index(
                Index::create()
                    .name("idx_factories_lat")
                    .table(Factories::Table)
                    .col(Factories::Lat)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_factories_lng")
                    .table(Factories::Table)
                    .col(Factories::Lng)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Factories::Table).to_owned())
            .await
    }
}
