use sea_orm_migration::prelude::*;

mod m20240901_000001_create_factories_table;
mod m20240901_000002_create_report_records_table;
mod m20240901_000003_create_images_table;
mod m20240901_000004_create_documents_table;
mod m20240901_000005_create_follow_ups_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_factories_table::Migration),
            Box::new(m20240901_000002_create_report_records_table::Migration),
            Box::new(m20240901_000003_create_images_table::Migration),
            Box::new(m20240901_000004_create_documents_table::Migration),
            Box::new(m20240901_000005_create_follow_ups_table::Migration),
        ]
    }
}
