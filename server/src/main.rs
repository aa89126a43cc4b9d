mod auth;
mod config;
mod handlers;
mod routes;

use actix_web::{web, App, HttpServer};
use auth::HeaderAllowList;
use config::Config;
use handlers::AppState;
use migration::{Migrator, MigratorTrait};
use pulsewatch_services::{create_connection, ConnectionSettings};
use std::sync::Arc;
use actix_cors::Cors;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    log::info!("Starting metrics collector on {}:{}", config.server_host, config.server_port);
    log::info!("Database connect timeout: {:?}", config.db_connect_timeout);
    log::info!(
        "Dashboard allow-list has {} identities (header: {})",
        config.dashboard_allowed_identities.len(),
        config.dashboard_identity_header
    );

    let settings = ConnectionSettings {
        max_connections: config.db_max_connections,
        connect_timeout: config.db_connect_timeout,
    };
    let db = create_connection(&config.database_url, &settings).await?;

    if config.run_migrations {
        match Migrator::up(&db, None).await {
            Ok(()) => log::info!("Database schema is up to date"),
            Err(e) => log::error!("Database initialization failed: {}. Continuing without it.", e),
        }
    } else {
        log::info!("Note: run migrations with 'cargo run --bin migration up' if not already done");
    }

    let auth_gate = Arc::new(HeaderAllowList::new(
        config.dashboard_identity_header.clone(),
        config.dashboard_allowed_identities.clone(),
    ));
    let app_state = web::Data::new(AppState::new(db, auth_gate));

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_method()
            .allow_any_origin()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    Ok(())
}
