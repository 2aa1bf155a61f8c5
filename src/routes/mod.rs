use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use axum::{routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let public_read = public_read_routes(&rate_limit_config);
    let write = write_routes(&rate_limit_config);
    let image = image_routes(&rate_limit_config);

    public_read.merge(write).merge(image)
}

/// Public reads: map queries and per-factory lookups.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/factories",
            routing::get(handlers::factory::get_nearby_factories),
        )
        .route("/factories/{id}", routing::get(handlers::factory::get_factory))
        .route(
            "/factories/{id}/report_records",
            routing::get(handlers::factory::get_factory_report_records),
        )
        .route(
            "/statistics/total",
            routing::get(handlers::statistics::get_statistics_total),
        )
        .route(
            "/statistics/factories",
            routing::get(handlers::statistics::get_factories_count),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Report writes: factory creation and updates, document handling.
fn write_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/factories",
            routing::post(handlers::factory::create_factory),
        )
        .route(
            "/factories/{id}",
            routing::put(handlers::factory::update_factory),
        )
        .route(
            "/factories/{id}/documents",
            routing::post(handlers::document::create_document),
        )
        .route(
            "/documents/{id}/status",
            routing::put(handlers::document::update_document_status),
        )
        .route(
            "/documents/{id}/follow_ups",
            routing::post(handlers::document::create_follow_up),
        );

    with_optional_rate_limit(router, config.enabled, config.write)
}

/// Image registration is the endpoint most worth throttling hard.
fn image_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/images", routing::post(handlers::image::post_image))
        .route(
            "/factories/{id}/images",
            routing::post(handlers::image::post_factory_image),
        );

    with_optional_rate_limit(router, config.enabled, config.image)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
