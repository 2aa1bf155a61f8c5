mod config;
mod error;
mod handlers;
mod migration;
mod models;
mod response;
mod routes;
mod services;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use config::geo::GeoConfig;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::land::LandLookupService;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Factory routes
        crate::handlers::factory::get_nearby_factories,
        crate::handlers::factory::create_factory,
        crate::handlers::factory::get_factory,
        crate::handlers::factory::update_factory,
        crate::handlers::factory::get_factory_report_records,
        // Image routes
        crate::handlers::image::post_image,
        crate::handlers::image::post_factory_image,
        // Document routes
        crate::handlers::document::create_document,
        crate::handlers::document::update_document_status,
        crate::handlers::document::create_follow_up,
        // Statistics routes
        crate::handlers::statistics::get_statistics_total,
        crate::handlers::statistics::get_factories_count,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::error::AppError,
            // Factory
            crate::handlers::factory::NearbyQuery,
            crate::handlers::factory::CreateFactoryRequest,
            crate::handlers::factory::UpdateFactoryRequest,
            crate::handlers::factory::ReportRecordResponse,
            crate::services::view::FactoryView,
            crate::services::view::ImageView,
            crate::services::view::FollowUpView,
            // Image
            crate::handlers::image::PostImageRequest,
            crate::handlers::image::PostImageResponse,
            crate::handlers::image::ImageResponse,
            // Document
            crate::handlers::document::CreateDocumentRequest,
            crate::handlers::document::UpdateDocumentStatusRequest,
            crate::handlers::document::CreateFollowUpRequest,
            crate::handlers::document::DocumentResponse,
            crate::handlers::document::FollowUpResponse,
            // Statistics
            crate::services::statistics::StatisticsTotals,
            crate::handlers::statistics::FactoryCountParams,
            crate::handlers::statistics::FactoryCountResponse,
        )
    ),
    tags(
        (name = "factories", description = "Nearby queries and factory reports"),
        (name = "images", description = "Image registration and attachment"),
        (name = "documents", description = "Complaint documents and follow-ups"),
        (name = "statistics", description = "Dataset counters"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "factwatch=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    validate_config()?;

    tracing::info!("Starting Factory Report API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let geo = GeoConfig::from_env();
    tracing::info!(
        "Query bounding box: lat {} ~ {}, lng {} ~ {}, result cap {}",
        geo.min_lat,
        geo.max_lat,
        geo.min_lng,
        geo.max_lng,
        geo.max_query_results
    );

    let land = LandLookupService::from_env();
    if land.is_configured() {
        tracing::info!("Land lookup service configured");
    } else {
        tracing::warn!("Land lookup not configured, cadastral fields will stay null");
    }

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(geo))
        .layer(Extension(land));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<()> {
    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(())
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Factory Report API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
