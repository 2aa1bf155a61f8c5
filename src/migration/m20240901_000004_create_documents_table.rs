use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    Code,
    FactoryId,
    DisplayStatus,
    CetStaff,
    Creator,
    Note,
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
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::Code).string_len(100).not_null())
                    .col(ColumnDef::new(Documents::FactoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(Documents::DisplayStatus)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Documents::CetStaff).string_len(100).null())
                    .col(ColumnDef::new(Documents::Creator).string_len(100).null())
                    .col(ColumnDef::new(Documents::Note).text().null())
                    .col(
                        ColumnDef::new(Documents::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Documents::DeletedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_factory_id")
                            .from(Documents::Table, Documents::FactoryId)
                            .to(Factories::Table, Factories::Id)
                            // Complaint paper trail outlives any factory row.
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-year serial codes race the same way display_number does.
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_code_unique")
                    .table(Documents::Table)
                    .col(Documents::Code)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_factory_id")
                    .table(Documents::Table)
                    .col(Documents::FactoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await
    }
}
