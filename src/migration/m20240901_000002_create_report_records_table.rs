use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ReportRecords {
    Table,
    Id,
    FactoryId,
    UserIp,
    ActionType,
    ActionBody,
    Nickname,
    Contact,
    Others,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Factories {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportRecords::FactoryId).uuid().not_null())
                    .col(ColumnDef::new(ReportRecords::UserIp).string_len(45).null())
                    .col(
                        ColumnDef::new(ReportRecords::ActionType)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportRecords::ActionBody).json().not_null())
                    .col(ColumnDef::new(ReportRecords::Nickname).string_len(64).null())
                    .col(ColumnDef::new(ReportRecords::Contact).string_len(64).null())
                    .col(
                        ColumnDef::new(ReportRecords::Others)
                            .string_len(1024)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ReportRecords::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ReportRecords::DeletedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_records_factory_id")
                            .from(ReportRecords::Table, ReportRecords::FactoryId)
                            .to(Factories::Table, Factories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The aggregate loader batches on factory_id IN (...).
        manager
            .create_index(
                Index::create()
                    .name("idx_report_records_factory_id")
                    .table(ReportRecords::Table)
                    .col(ReportRecords::FactoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportRecords::Table).to_owned())
            .await
    }
}
