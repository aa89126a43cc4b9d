use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens a lazily-connecting pool: an unreachable database surfaces as an
/// error on the first query instead of blocking startup.
pub async fn create_connection(
    database_url: &str,
    settings: &ConnectionSettings,
) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(settings.max_connections)
        .connect_timeout(settings.connect_timeout)
        .acquire_timeout(settings.connect_timeout)
        .connect_lazy(true)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    Ok(db)
}

// Note: the schema lives in the migration crate:
// cargo run --bin migration up
// or start the server with RUN_MIGRATIONS=true
