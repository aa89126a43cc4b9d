use crate::auth::{AuthDecision, AuthorizationGate};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use pulsewatch_services::query_service::{API_METRICS_LIMIT, CLIENT_HISTORY_LIMIT};
use pulsewatch_services::{IngestionService, MetricStore, QueryService};
use pulsewatch_shared::{DashboardView, HealthReport, IngestAck};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub struct AppState {
    pub ingestion: IngestionService,
    pub queries: QueryService,
    pub auth_gate: Arc<dyn AuthorizationGate>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, auth_gate: Arc<dyn AuthorizationGate>) -> Self {
        let store = Arc::new(MetricStore::new(db));
        Self {
            ingestion: IngestionService::new(Arc::clone(&store)),
            queries: QueryService::new(store),
            auth_gate,
        }
    }
}

/// Query parameters for metric listings
#[derive(Debug, serde::Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl MetricsQuery {
    fn bounded_limit(&self, default: u64) -> u64 {
        self.limit.unwrap_or(default).clamp(1, API_METRICS_LIMIT)
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Receive one metric sample from an agent
pub async fn receive_metrics(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let caller = req.peer_addr().map(|addr| addr.ip().to_string());
    log::info!(
        "POST /api/metrics from {}",
        caller.as_deref().unwrap_or("unknown")
    );

    match state.ingestion.ingest(&body, caller.as_deref()).await {
        Ok(client_id) => HttpResponse::Ok().json(IngestAck::accepted(client_id)),
        Err(e) if e.is_client_error() => {
            log::warn!("Rejected metrics payload: {}", e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
        Err(e) => {
            log::error!("Receive metrics failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
    }
}

/// Most recent metrics across all clients, or one client with `?client_id=`
pub async fn get_metrics(
    state: web::Data<AppState>,
    query: web::Query<MetricsQuery>,
) -> impl Responder {
    log::info!("GET /api/metrics");
    let limit = query.bounded_limit(API_METRICS_LIMIT);
    let overview = state
        .queries
        .metrics_overview(query.client_id.as_deref(), limit)
        .await;

    HttpResponse::Ok().json(overview)
}

pub async fn get_clients(state: web::Data<AppState>) -> impl Responder {
    log::info!("GET /api/clients");
    HttpResponse::Ok().json(state.queries.client_roster().await)
}

/// Recent history of a single client
pub async fn get_client_metrics(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<MetricsQuery>,
) -> impl Responder {
    let client_id = path.into_inner();
    log::info!("GET /api/clients/{}/metrics", client_id);
    let limit = query.bounded_limit(CLIENT_HISTORY_LIMIT);

    HttpResponse::Ok().json(state.queries.client_history(&client_id, limit).await)
}

/// Reports whether the metric store answers queries
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    log::info!("Health check accessed");

    match state.queries.check_store().await {
        Ok(clients) => HttpResponse::Ok().json(HealthReport::healthy(clients, now_iso())),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError()
                .json(HealthReport::unhealthy(e.to_string(), now_iso()))
        }
    }
}

/// Data behind the dashboard view; rendering happens elsewhere
pub async fn dashboard(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let identity = match state.auth_gate.check(&req) {
        AuthDecision::Allow { identity } => identity,
        AuthDecision::Deny { identity: None } => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Authentication required"
            }));
        }
        AuthDecision::Deny { identity: Some(identity) } => {
            log::warn!("Dashboard access denied for {}", identity);
            return HttpResponse::Forbidden().json(serde_json::json!({
                "error": format!("Access Denied: {} is not authorized", identity)
            }));
        }
    };

    log::info!("Dashboard accessed by {}", identity);
    let base_url = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };
    let summary = state.queries.dashboard_summary().await;

    HttpResponse::Ok().json(DashboardView {
        identity,
        base_url,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HeaderAllowList;
    use crate::routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use migration::{Migrator, MigratorTrait};
    use pulsewatch_services::{create_connection, ConnectionSettings};
    use serde_json::{json, Value};

    const IDENTITY_HEADER: &str = "X-Authenticated-Email";

    async fn state(migrate: bool) -> web::Data<AppState> {
        let settings = ConnectionSettings {
            max_connections: 1,
            ..ConnectionSettings::default()
        };
        let db = create_connection("sqlite::memory:", &settings).await.unwrap();
        if migrate {
            Migrator::up(&db, None).await.unwrap();
        }
        let gate = HeaderAllowList::new(IDENTITY_HEADER, vec!["ops@example.com".to_string()]);
        web::Data::new(AppState::new(db, Arc::new(gate)))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(routes::configure)).await
        };
    }

    fn post_metric(body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/metrics")
            .insert_header(("Content-Type", "application/json"))
            .peer_addr("10.1.2.3:40000".parse().unwrap())
            .set_payload(body.to_string())
    }

    #[actix_web::test]
    async fn ingested_payload_round_trips_with_extra_fields() {
        let state = state(true).await;
        let app = app!(state);

        let sent = json!({
            "client_name": "alice",
            "timestamp": "2024-05-01T12:34:56",
            "received_at": "agent-supplied",
            "cpu_percent": 12.5,
            "ram": {"percent": 48.1, "total_gb": 16},
            "firmware": {"rev": "b7", "flags": [1, 2, 3]}
        });
        let resp = test::call_service(&app, post_metric(sent.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack, json!({"status": "success", "message": "Metrics received", "client_id": "alice"}));

        let req = test::TestRequest::get().uri("/api/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_entries"], 1);
        assert_eq!(body["total_clients"], 1);

        let stored = body["metrics"][0].as_object().unwrap();
        for (key, value) in sent.as_object().unwrap() {
            if key == "received_at" {
                assert_ne!(&stored[key], value);
            } else {
                assert_eq!(&stored[key], value, "field {key} changed");
            }
        }
        assert_eq!(stored["client_id"], "alice");
    }

    #[actix_web::test]
    async fn anonymous_agent_gets_its_address_as_client_id() {
        let state = state(true).await;
        let app = app!(state);

        let req = post_metric(json!({"timestamp": "2024-05-01T12:00:00", "cpu_percent": 1})).to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["client_id"], "10.1.2.3");
    }

    #[actix_web::test]
    async fn malformed_bodies_are_rejected_without_storing() {
        let state = state(true).await;
        let app = app!(state);

        for payload in ["", "{}", "not json", "[1,2,3]"] {
            let req = test::TestRequest::post()
                .uri("/api/metrics")
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload:?}");
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }

        assert_eq!(state.queries.total_records().await, 0);
    }

    #[actix_web::test]
    async fn write_failure_is_a_server_error() {
        let state = state(false).await;
        let app = app!(state);

        let resp = test::call_service(&app, post_metric(json!({"client_name": "alice"})).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Failed to store metric"));
    }

    #[actix_web::test]
    async fn listings_respect_limit_order_and_client_filter() {
        let state = state(true).await;
        let app = app!(state);

        for (client, ts) in [
            ("alice", "2024-05-01T10:00:00"),
            ("bob", "2024-05-01T12:00:00"),
            ("alice", "2024-05-01T11:00:00"),
        ] {
            let req = post_metric(json!({"client_name": client, "timestamp": ts})).to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get().uri("/api/metrics?limit=2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_entries"], 2);
        assert_eq!(body["total_clients"], 2);
        assert_eq!(body["metrics"][0]["timestamp"], "2024-05-01T12:00:00");
        assert_eq!(body["metrics"][1]["timestamp"], "2024-05-01T11:00:00");

        let req = test::TestRequest::get().uri("/api/metrics?client_id=alice").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_entries"], 2);

        let req = test::TestRequest::get().uri("/api/clients/bob/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["client_id"], "bob");
        assert_eq!(body["total_entries"], 1);

        let req = test::TestRequest::get().uri("/api/clients").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_clients"], 2);
        assert_eq!(
            body["clients"][0],
            json!({
                "client_id": "alice",
                "client_name": "alice",
                "last_seen": "2024-05-01T11:00:00",
                "metric_count": 2
            })
        );
    }

    #[actix_web::test]
    async fn health_reports_store_reachability() {
        let healthy = state(true).await;
        let app = app!(healthy);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["clients"], 0);
        assert!(body["timestamp"].is_string());

        let broken = state(false).await;
        let app = app!(broken);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "unhealthy");
        assert!(body["error"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn dashboard_is_gated() {
        let state = state(true).await;
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/dashboard").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/dashboard")
            .insert_header((IDENTITY_HEADER, "intruder@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn dashboard_serves_summary_with_charts() {
        let state = state(true).await;
        let app = app!(state);

        for (second, cpu) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
            let sample = json!({
                "client_name": "alice",
                "timestamp": format!("2024-05-01T12:00:0{second}"),
                "cpu_percent": cpu,
                "ping_ms": 15.0
            });
            test::call_service(&app, post_metric(sample).to_request()).await;
        }

        let req = test::TestRequest::get()
            .uri("/dashboard")
            .insert_header((IDENTITY_HEADER, "ops@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(body["identity"], "ops@example.com");
        assert_eq!(body["total_clients"], 1);
        assert_eq!(body["total_metrics"], 3);
        assert_eq!(body["metrics"].as_array().unwrap().len(), 3);
        assert_eq!(body["latest_metrics"]["timestamp"], "2024-05-01T12:00:03");
        assert_eq!(body["charts"]["CPU Usage"]["values"], json!([10.0, 20.0, 30.0]));
        assert_eq!(
            body["charts"]["CPU Usage"]["labels"],
            json!(["12:00:01", "12:00:02", "12:00:03"])
        );
        assert!(body["charts"]["Network Latency"].is_object());
        assert!(body["charts"].get("RAM Usage").is_none());
    }
}
