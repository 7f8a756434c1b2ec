use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Extension, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use daycare_api::config::{self, AppConfig};
use daycare_api::database::DatabaseManager;
use daycare_api::handlers::{protected, public};
use daycare_api::middleware::{admin_only, jwt_auth_middleware, responsible_only, staff_only};
use daycare_api::storage::{ImageStore, LocalImageStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daycare_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!("Starting Daycare API in {:?} mode", config.environment);
    if !daycare_api::is_production!() && !config.security.jwt_secret_from_env {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let store = LocalImageStore::from_config(&config.storage)?;
    tokio::fs::create_dir_all(store.dir()).await?;

    let app = app(config, store);

    // Allow tests or deployments to override port via env
    let port = std::env::var("DAYCARE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Daycare API listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    DatabaseManager::close().await;
    tracing::info!("Daycare API stopped");
    Ok(())
}

/// Ctrl-C, or stdin closing when DAYCARE_API_EXIT_ON_STDIN_EOF=1 (set by the
/// test harness so the server dies with the process that spawned it)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let stdin_closed = async {
        if std::env::var("DAYCARE_API_EXIT_ON_STDIN_EOF").as_deref() == Ok("1") {
            let _ = tokio::io::copy(&mut tokio::io::stdin(), &mut tokio::io::sink()).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl-c, shutting down"),
        _ = stdin_closed => tracing::info!("Stdin closed, shutting down"),
    }
}

fn app(config: &AppConfig, store: LocalImageStore) -> Router {
    let image_dir = store.dir().clone();
    let store: Arc<dyn ImageStore> = Arc::new(store);

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(public::login_post))
        .nest_service("/images", ServeDir::new(image_dir))
        // Protected API
        .merge(api_routes())
        .layer(Extension(store))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

/// Everything under /api: JWT first, then the role gate of each group
fn api_routes() -> Router {
    Router::new()
        .merge(session_routes())
        .merge(admin_routes())
        .merge(staff_routes())
        .merge(responsible_routes())
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

/// Any authenticated role
fn session_routes() -> Router {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/auth/refresh", post(auth::refresh_post))
        .route("/api/auth/password", put(auth::password_put))
}

fn admin_routes() -> Router {
    use protected::{daycares, office_managers};

    Router::new()
        // Daycare reads are staff-wide; writes need an admin
        .route(
            "/api/daycares",
            get(daycares::list)
                .route_layer(middleware::from_fn(staff_only))
                .merge(post(daycares::create).route_layer(middleware::from_fn(admin_only))),
        )
        .route(
            "/api/daycares/:id",
            get(daycares::show).route_layer(middleware::from_fn(staff_only)).merge(
                put(daycares::update)
                    .patch(daycares::update)
                    .delete(daycares::delete)
                    .route_layer(middleware::from_fn(admin_only)),
            ),
        )
        .merge(
            Router::new()
                .route("/api/office-managers", get(office_managers::list).post(office_managers::create))
                .route(
                    "/api/office-managers/:id",
                    get(office_managers::show)
                        .put(office_managers::update)
                        .patch(office_managers::update)
                        .delete(office_managers::delete),
                )
                .route_layer(middleware::from_fn(admin_only)),
        )
}

/// Admins and office managers, scoped to a daycare for the latter
fn staff_routes() -> Router {
    use protected::{age_ranges, allergies, children, classes, instructions, responsibles};

    Router::new()
        .route("/api/responsibles", get(responsibles::list).post(responsibles::create))
        .route(
            "/api/responsibles/:id",
            get(responsibles::show)
                .put(responsibles::update)
                .patch(responsibles::update)
                .delete(responsibles::delete),
        )
        .route("/api/responsibles/:id/children", get(responsibles::children))
        .route("/api/responsibles/:id/image", put(responsibles::image_put))
        .route("/api/children", get(children::list).post(children::create))
        .route(
            "/api/children/:id",
            get(children::show)
                .put(children::update)
                .patch(children::update)
                .delete(children::delete),
        )
        .route(
            "/api/children/:id/responsibles",
            get(children::responsibles).post(children::link),
        )
        .route(
            "/api/children/:id/responsibles/:responsible_id",
            axum::routing::delete(children::unlink),
        )
        .route("/api/children/:id/image", put(children::image_put))
        .route("/api/children/:id/allergies", get(allergies::list).post(allergies::create))
        .route(
            "/api/children/:id/allergies/:allergy_id",
            get(allergies::show)
                .put(allergies::update)
                .patch(allergies::update)
                .delete(allergies::delete),
        )
        .route(
            "/api/children/:id/instructions",
            get(instructions::list).post(instructions::create),
        )
        .route(
            "/api/children/:id/instructions/:instruction_id",
            get(instructions::show)
                .put(instructions::update)
                .patch(instructions::update)
                .delete(instructions::delete),
        )
        .route("/api/classes", get(classes::list).post(classes::create))
        .route(
            "/api/classes/:id",
            get(classes::show)
                .put(classes::update)
                .patch(classes::update)
                .delete(classes::delete),
        )
        .route("/api/classes/:id/children", get(classes::children))
        .route("/api/age-ranges", get(age_ranges::list).post(age_ranges::create))
        .route(
            "/api/age-ranges/:id",
            get(age_ranges::show)
                .put(age_ranges::update)
                .patch(age_ranges::update)
                .delete(age_ranges::delete),
        )
        .route_layer(middleware::from_fn(staff_only))
}

fn responsible_routes() -> Router {
    use protected::me;

    Router::new()
        .route("/api/me", get(me::profile))
        .route("/api/me/children", get(me::children))
        .route_layer(middleware::from_fn(responsible_only))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Daycare API",
            "version": version,
            "description": "Daycare management backend: children, responsibles, classes and staff",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/auth/login (public - token acquisition)",
                "session": "/api/auth/whoami, /api/auth/refresh, /api/auth/password (any role)",
                "daycares": "/api/daycares[/:id] (read: staff, write: admin)",
                "office_managers": "/api/office-managers[/:id] (admin)",
                "responsibles": "/api/responsibles[/:id[/children|/image]] (staff)",
                "children": "/api/children[/:id[/responsibles|/allergies|/instructions|/image]] (staff)",
                "classes": "/api/classes[/:id[/children]] (staff)",
                "age_ranges": "/api/age-ranges[/:id] (staff)",
                "me": "/api/me, /api/me/children (responsible)",
                "images": "/images/* (public)",
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
