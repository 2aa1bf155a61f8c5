use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Images {
    Table,
    Id,
    FactoryId,
    ReportRecordId,
    ImagePath,
    OrigTime,
    OrigLat,
    OrigLng,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Factories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ReportRecords {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Images::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Images::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Images::FactoryId).uuid().null())
                    .col(ColumnDef::new(Images::ReportRecordId).integer().null())
                    .col(ColumnDef::new(Images::ImagePath).string_len(256).not_null())
                    .col(ColumnDef::new(Images::OrigTime).timestamp().null())
                    .col(ColumnDef::new(Images::OrigLat).double().null())
                    .col(ColumnDef::new(Images::OrigLng).double().null())
                    .col(
                        ColumnDef::new(Images::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Images::DeletedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_images_factory_id")
                            .from(Images::Table, Images::FactoryId)
                            .to(Factories::Table, Factories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_images_report_record_id")
                            .from(Images::Table, Images::ReportRecordId)
                            .to(ReportRecords::Table, ReportRecords::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_images_factory_id")
                    .table(Images::Table)
                    .col(Images::FactoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_images_report_record_id")
                    .table(Images::Table)
                    .col(Images::ReportRecordId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Images::Table).to_owned())
            .await
    }
}
