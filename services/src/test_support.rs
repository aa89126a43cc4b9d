use crate::database::{create_connection, ConnectionSettings};
use migration::{Migrator, MigratorTrait};
use pulsewatch_shared::MetricPayload;
use sea_orm::DatabaseConnection;
use serde_json::Value;

/// Single-connection in-memory SQLite; without `migrate` every query fails,
/// which stands in for an unreachable store.
pub(crate) async fn memory_db(migrate: bool) -> DatabaseConnection {
    let settings = ConnectionSettings {
        max_connections: 1,
        ..ConnectionSettings::default()
    };
    let db = create_connection("sqlite::memory:", &settings).await.unwrap();
    if migrate {
        Migrator::up(&db, None).await.unwrap();
    }
    db
}

pub(crate) fn payload(value: Value) -> MetricPayload {
    serde_json::from_value(value).unwrap()
}
