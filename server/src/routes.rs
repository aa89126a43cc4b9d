use crate::handlers;
use actix_web::web;

/// Largest metric payload accepted from an agent.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))

        // Agent ingestion and metric queries
        .service(
            web::resource("/api/metrics")
                .route(web::post().to(handlers::receive_metrics))
                .route(web::get().to(handlers::get_metrics)),
        )

        // Client endpoints
        .route("/api/clients", web::get().to(handlers::get_clients))
        .route(
            "/api/clients/{client_id}/metrics",
            web::get().to(handlers::get_client_metrics),
        )

        // Operational and dashboard endpoints
        .route("/health", web::get().to(handlers::health))
        .route("/dashboard", web::get().to(handlers::dashboard));
}
