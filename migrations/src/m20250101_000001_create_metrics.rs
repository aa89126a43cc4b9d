use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Metrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metrics::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Metrics::ClientId).text().not_null())
                    .col(ColumnDef::new(Metrics::ClientName).text().null())
                    .col(ColumnDef::new(Metrics::Timestamp).text().not_null())
                    .col(ColumnDef::new(Metrics::ReceivedAt).text().not_null())
                    .col(ColumnDef::new(Metrics::CpuPercent).double().null())
                    .col(ColumnDef::new(Metrics::GpuPercent).double().null())
                    .col(ColumnDef::new(Metrics::RamJson).text().null())
                    .col(ColumnDef::new(Metrics::PingMs).double().null())
                    .col(ColumnDef::new(Metrics::InternetConnected).boolean().null())
                    .col(ColumnDef::new(Metrics::RawData).text().not_null())
                    .col(
                        ColumnDef::new(Metrics::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_metrics_client_id")
                    .table(Metrics::Table)
                    .col(Metrics::ClientId)
                    .to_owned(),
            )
            .await?;

        // Listings sort by the agent-supplied timestamp, newest first.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_metrics_timestamp")
                    .table(Metrics::Table)
                    .col((Metrics::Timestamp, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        log::info!("Created metrics table and indexes");

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Metrics::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Metrics {
    Table,
    Id,
    ClientId,
    ClientName,
    Timestamp,
    ReceivedAt,
    CpuPercent,
    GpuPercent,
    RamJson,
    PingMs,
    InternetConnected,
    RawData,
    CreatedAt,
}
