#![allow(dead_code)]

use factwatch::config::geo::GeoConfig;
use factwatch::services::land::LandLookupService;
use reqwest::Client;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait, Statement,
};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Once,
};
use uuid::Uuid;

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
// Tests in one binary share the database; holding this for the lifetime of
// a TestApp keeps their table cleanups from racing each other.
static DB_GUARD: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        // Integration tests hammer the API from one address.
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _db_guard: tokio::sync::MutexGuard<'static, ()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let db_guard = DB_GUARD.lock().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        factwatch::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order)
    cleanup_tables(&db).await;

    let geo = GeoConfig::from_env();
    let land = LandLookupService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(factwatch::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(geo))
        .layer(axum::extract::Extension(land));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        _db_guard: db_guard,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "follow_ups",
        "documents",
        "images",
        "report_records",
        "factories",
    ];
    for table in tables {
        db.execute(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            format!("DELETE FROM {}", table),
        ))
        .await
        .unwrap_or_else(|e| panic!("Failed to clean table {}: {}", table, e));
    }
}

/// Insert a factory row directly, bypassing the write path. Used to seed
/// the government-imported dataset.
pub async fn seed_factory(
    db: &DatabaseConnection,
    display_number: i32,
    name: &str,
    lat: f64,
    lng: f64,
    source: &str,
    before_release: bool,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().naive_utc();
    let row = factwatch::models::factory::ActiveModel {
        id: Set(id),
        display_number: Set(display_number),
        lat: Set(lat),
        lng: Set(lng),
        name: Set(Some(name.to_string())),
        before_release: Set(before_release),
        source: Set(source.to_string()),
        cet_review_status: Set("A".to_string()),
        cet_report_status: Set("A".to_string()),
        status_time: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    factwatch::models::Factory::insert(row)
        .exec(db)
        .await
        .expect("Failed to seed factory");
    id
}

/// Seed a factory with a resolved town name, as if the land lookup already
/// ran for it.
pub async fn seed_factory_in_town(
    db: &DatabaseConnection,
    display_number: i32,
    name: &str,
    townname: &str,
    source: &str,
) -> Uuid {
    let id = seed_factory(db, display_number, name, 23.234, 120.1, source, true).await;
    let row = factwatch::models::factory::ActiveModel {
        id: Set(id),
        townname: Set(Some(townname.to_string())),
        ..Default::default()
    };
    factwatch::models::Factory::update(row)
        .exec(db)
        .await
        .expect("Failed to set townname");
    id
}

pub async fn register_image(app: &TestApp, url: &str) -> Uuid {
    let resp = app
        .client
        .post(app.url("/images"))
        .json(&serde_json::json!({ "url": url }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "image registration failed");
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"]["token"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("image token missing")
}

pub async fn create_factory_via_api(app: &TestApp, body: &serde_json::Value) -> serde_json::Value {
    let resp = app
        .client
        .post(app.url("/factories"))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "factory creation failed");
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"].clone()
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            format!("SELECT COUNT(*) FROM {}", table),
        ))
        .await
        .expect("count query failed")
        .expect("count query returned no row");
    row.try_get_by_index(0).expect("count column missing")
}
