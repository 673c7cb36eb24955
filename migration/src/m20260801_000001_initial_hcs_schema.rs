use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Add the UUID primary key column with a backend-appropriate default.
/// Postgres generates IDs server-side; SQLite relies on the application
/// supplying them.
fn uuid_primary_key<T: IntoIden + 'static>(
    table: &mut TableCreateStatement,
    column: T,
    backend: sea_orm::DatabaseBackend,
) -> Result<(), DbErr> {
    match backend {
        sea_orm::DatabaseBackend::Postgres => {
            table.col(
                ColumnDef::new(column)
                    .uuid()
                    .not_null()
                    .primary_key()
                    .default(Expr::cust("uuid_generate_v4()")),
            );
        }
        sea_orm::DatabaseBackend::Sqlite => {
            table.col(ColumnDef::new(column).uuid().not_null().primary_key());
        }
        _ => {
            return Err(DbErr::Custom("Unsupported database backend".to_string()));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        // Enable the UUID extension for PostgreSQL
        if backend == sea_orm::DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";")
                .await?;
        }

        // Create screens table
        let mut screens_table = Table::create()
            .table(Screens::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Screens::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Screens::Description).text())
            .col(
                ColumnDef::new(Screens::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(Screens::LastUpdated)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .to_owned();
        uuid_primary_key(&mut screens_table, Screens::Id, backend)?;
        manager.create_table(screens_table).await?;

        // Create plates table
        let mut plates_table = Table::create()
            .table(Plates::Table)
            .if_not_exists()
            .col(ColumnDef::new(Plates::Name).string().not_null())
            .col(ColumnDef::new(Plates::ScreenId).uuid())
            .col(
                ColumnDef::new(Plates::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(Plates::LastUpdated)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_plates_screen_id")
                    .from(Plates::Table, Plates::ScreenId)
                    .to(Screens::Table, Screens::Id)
                    .on_update(ForeignKeyAction::NoAction)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        uuid_primary_key(&mut plates_table, Plates::Id, backend)?;
        manager.create_table(plates_table).await?;

        // Create wells table
        let mut wells_table = Table::create()
            .table(Wells::Table)
            .if_not_exists()
            .col(ColumnDef::new(Wells::PlateId).uuid().not_null())
            .col(ColumnDef::new(Wells::RowIndex).integer().not_null())
            .col(ColumnDef::new(Wells::ColumnIndex).integer().not_null())
            .col(
                ColumnDef::new(Wells::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(Wells::LastUpdated)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_wells_plate_id")
                    .from(Wells::Table, Wells::PlateId)
                    .to(Plates::Table, Plates::Id)
                    .on_update(ForeignKeyAction::NoAction)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        uuid_primary_key(&mut wells_table, Wells::Id, backend)?;
        manager.create_table(wells_table).await?;

        // One well per (plate, row, column)
        manager
            .create_index(
                Index::create()
                    .name("idx_wells_plate_position")
                    .table(Wells::Table)
                    .col(Wells::PlateId)
                    .col(Wells::RowIndex)
                    .col(Wells::ColumnIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create plate_acquisitions table
        let mut acquisitions_table = Table::create()
            .table(PlateAcquisitions::Table)
            .if_not_exists()
            .col(ColumnDef::new(PlateAcquisitions::PlateId).uuid().not_null())
            .col(ColumnDef::new(PlateAcquisitions::Name).string().not_null())
            .col(ColumnDef::new(PlateAcquisitions::StartTime).timestamp_with_time_zone())
            .col(
                ColumnDef::new(PlateAcquisitions::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(PlateAcquisitions::LastUpdated)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_plate_acquisitions_plate_id")
                    .from(PlateAcquisitions::Table, PlateAcquisitions::PlateId)
                    .to(Plates::Table, Plates::Id)
                    .on_update(ForeignKeyAction::NoAction)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        uuid_primary_key(&mut acquisitions_table, PlateAcquisitions::Id, backend)?;
        manager.create_table(acquisitions_table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plate_acquisitions_plate_id")
                    .table(PlateAcquisitions::Table)
                    .col(PlateAcquisitions::PlateId)
                    .to_owned(),
            )
            .await?;

        // Create well_samples table
        let mut well_samples_table = Table::create()
            .table(WellSamples::Table)
            .if_not_exists()
            .col(ColumnDef::new(WellSamples::WellId).uuid().not_null())
            .col(ColumnDef::new(WellSamples::PlateAcquisitionId).uuid())
            .col(ColumnDef::new(WellSamples::ImageName).string())
            .col(
                ColumnDef::new(WellSamples::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .col(
                ColumnDef::new(WellSamples::LastUpdated)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_well_samples_well_id")
                    .from(WellSamples::Table, WellSamples::WellId)
                    .to(Wells::Table, Wells::Id)
                    .on_update(ForeignKeyAction::NoAction)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_well_samples_plate_acquisition_id")
                    .from(WellSamples::Table, WellSamples::PlateAcquisitionId)
                    .to(PlateAcquisitions::Table, PlateAcquisitions::Id)
                    .on_update(ForeignKeyAction::NoAction)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        uuid_primary_key(&mut well_samples_table, WellSamples::Id, backend)?;
        manager.create_table(well_samples_table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_well_samples_well_id")
                    .table(WellSamples::Table)
                    .col(WellSamples::WellId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_well_samples_plate_acquisition_id")
                    .table(WellSamples::Table)
                    .col(WellSamples::PlateAcquisitionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WellSamples::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlateAcquisitions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wells::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Screens::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Screens {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum Plates {
    Table,
    Id,
    Name,
    ScreenId,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum Wells {
    Table,
    Id,
    PlateId,
    RowIndex,
    ColumnIndex,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum PlateAcquisitions {
    Table,
    Id,
    PlateId,
    Name,
    StartTime,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum WellSamples {
    Table,
    Id,
    WellId,
    PlateAcquisitionId,
    ImageName,
    CreatedAt,
    LastUpdated,
}
