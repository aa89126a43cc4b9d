use sea_orm_migration::prelude::*;
use std::env;
use std::process::ExitCode;

use migration::Migrator;

/// Applies or inspects the metrics schema: `migration [up|down|fresh|status]`.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let Ok(db_url) = env::var("DATABASE_URL") else {
        log::error!("DATABASE_URL must be set");
        return ExitCode::FAILURE;
    };
    let command = env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let db = match sea_orm::Database::connect(&db_url).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match command.as_str() {
        "up" => Migrator::up(&db, None).await.map(|_| "Migrations applied"),
        "down" => Migrator::down(&db, None).await.map(|_| "Migration rolled back"),
        "fresh" => Migrator::fresh(&db).await.map(|_| "Schema recreated"),
        "status" => Migrator::status(&db).await.map(|_| "Status reported"),
        other => {
            log::error!("Unknown command: {}. Use: up, down, fresh, or status", other);
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(message) => {
            log::info!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Migration command '{}' failed: {}", command, e);
            ExitCode::FAILURE
        }
    }
}
