//! SRM Registry Server
//!
//! Records company form submissions in an embedded SQLite store and exposes
//! aggregate statistics for the dashboard.
//!
//! Uses SQLite (embedded) instead of PostgreSQL for simplicity.

mod error;
mod handlers;
mod storage;

use anyhow::{Context, Result};
use axum::routing::{delete, get};
use axum::Router;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use storage::Database;

const DEFAULT_ADMIN_KEY: &str = "SRM2025ADMIN";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub admin_key: String,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting SRM Registry Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    info!(
        "Config loaded: port={}, static_dir={}",
        config.port,
        config.static_dir.display()
    );

    info!("Initializing SQLite database...");
    let db = Arc::new(
        Database::new(&config.database_url)
            .await
            .context("Failed to initialize database")?,
    );

    let state = AppState {
        db,
        admin_key: config.admin_key,
    };

    let app = build_router(state, &config.static_dir);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Failed to parse bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server listening on {}", addr);
    info!("API disponible en: {}/api/empresas", config.public_url);
    info!("Dashboard: {}/dashboard.html", config.public_url);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_router(state: AppState, static_dir: &Path) -> Router {
    let dashboard = ServeFile::new(static_dir.join("dashboard.html"));

    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/api", api_routes())
        .route_service("/", dashboard)
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/empresas",
            get(handlers::empresas::list).post(handlers::empresas::create),
        )
        .route("/limpiar", delete(handlers::admin::limpiar))
        .route("/stats", get(handlers::stats::stats))
}

#[derive(Debug, Clone)]
struct Config {
    port: u16,
    database_url: String,
    admin_key: String,
    public_url: String,
    static_dir: PathBuf,
}

fn load_config() -> Result<Config> {
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "10000".to_string())
        .parse()
        .context("PORT must be a valid port number")?;

    // No fallback here: starting without a store would only defer the
    // failure to the first request.
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in the environment")?;

    let admin_key = std::env::var("ADMIN_KEY").unwrap_or_else(|_| {
        warn!("ADMIN_KEY not set, using default (insecure for production)");
        DEFAULT_ADMIN_KEY.to_string()
    });

    let public_url =
        std::env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

    let static_dir = std::env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"));

    Ok(Config {
        port,
        database_url,
        admin_key,
        public_url,
        static_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::tests::test_db;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use srm_types::{Empresa, StatsResponse};
    use tower::ServiceExt;

    const TEST_KEY: &str = "test-admin-key";

    async fn test_app() -> Router {
        let db = Arc::new(test_db().await);
        let state = AppState {
            db,
            admin_key: TEST_KEY.to_string(),
        };
        build_router(state, Path::new("public"))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_payload(nombre: &str) -> serde_json::Value {
        serde_json::json!({
            "session_id": "s1",
            "nombre": nombre,
            "correo": "a@x.com",
            "tipo_empresa": "retail",
        })
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;

        let response = app.oneshot(get_request("/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"pong");
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/empresas", valid_payload("Acme")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(get_request("/api/empresas")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let empresas: Vec<Empresa> = body_json(response).await;
        assert_eq!(empresas.len(), 1);
        assert_eq!(empresas[0].nombre, "Acme");
        assert_eq!(empresas[0].tipo_empresa.as_deref(), Some("retail"));
        assert!(empresas[0].id >= 1);
    }

    #[tokio::test]
    async fn test_create_missing_nombre_rejected() {
        let app = test_app().await;

        let payload = serde_json::json!({
            "session_id": "s1",
            "correo": "a@x.com",
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/empresas", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing persisted
        let response = app.oneshot(get_request("/api/empresas")).await.unwrap();
        let empresas: Vec<Empresa> = body_json(response).await;
        assert!(empresas.is_empty());
    }

    #[tokio::test]
    async fn test_create_empty_required_field_rejected() {
        let app = test_app().await;

        let payload = serde_json::json!({
            "session_id": "",
            "nombre": "Acme",
            "correo": "a@x.com",
        });
        let response = app
            .oneshot(json_request("POST", "/api/empresas", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_limpiar_wrong_key_forbidden() {
        let app = test_app().await;

        app.clone()
            .oneshot(json_request("POST", "/api/empresas", valid_payload("Acme")))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "DELETE",
                "/api/limpiar",
                serde_json::json!({ "key": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Record still there
        let response = app.oneshot(get_request("/api/empresas")).await.unwrap();
        let empresas: Vec<Empresa> = body_json(response).await;
        assert_eq!(empresas.len(), 1);
    }

    #[tokio::test]
    async fn test_limpiar_resets_identity() {
        let app = test_app().await;

        app.clone()
            .oneshot(json_request("POST", "/api/empresas", valid_payload("Acme")))
            .await
            .unwrap();
        app.clone()
            .oneshot(json_request("POST", "/api/empresas", valid_payload("Beta")))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "DELETE",
                "/api/limpiar",
                serde_json::json!({ "key": TEST_KEY }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_request("/api/empresas"))
            .await
            .unwrap();
        let empresas: Vec<Empresa> = body_json(response).await;
        assert!(empresas.is_empty());

        // Identity counter back at the start
        app.clone()
            .oneshot(json_request("POST", "/api/empresas", valid_payload("Gamma")))
            .await
            .unwrap();
        let response = app.oneshot(get_request("/api/empresas")).await.unwrap();
        let empresas: Vec<Empresa> = body_json(response).await;
        assert_eq!(empresas[0].id, 1);
    }

    #[tokio::test]
    async fn test_stats_consistent_at_quiescence() {
        let app = test_app().await;

        for nombre in ["A", "B", "C"] {
            app.clone()
                .oneshot(json_request("POST", "/api/empresas", valid_payload(nombre)))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/stats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats: StatsResponse = body_json(response).await;
        assert!(stats.success);
        assert_eq!(stats.total_empresas, 3);
        assert!(stats.recientes.len() <= 5);
        assert_eq!(stats.recientes[0].nombre, "C");

        let tipo_total: i64 = stats.tipos.iter().map(|b| b.count).sum();
        assert_eq!(tipo_total, stats.total_empresas);

        // No herramientas submitted, so everything lands in the sentinel
        assert_eq!(stats.herramientas.len(), 1);
        assert_eq!(stats.herramientas[0].label, "No especifica");
        assert_eq!(stats.herramientas[0].count, 3);
    }
}
