use crate::models::{factory, Factory};
use anyhow::{anyhow, Result};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Cadastral identifiers resolved from WGS84 coordinates by the government
/// land-data lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandInfo {
    pub landcode: Option<String>,
    pub sectcode: Option<String>,
    pub sectname: Option<String>,
    pub towncode: Option<String>,
    pub townname: Option<String>,
}

/// Client for the external land-lookup collaborator. Resolution is best
/// effort: the service may be unconfigured or down, and factory creation
/// never waits on it or fails because of it.
#[derive(Clone)]
pub struct LandLookupService {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl LandLookupService {
    /// Build from environment variables. Without LAND_LOOKUP_URL the service
    /// is a no-op and enrichment fields simply stay null.
    pub fn from_env() -> Self {
        let base_url = std::env::var("LAND_LOOKUP_URL").ok();
        let timeout_secs: u64 = std::env::var("LAND_LOOKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build land lookup HTTP client: {e}");
                reqwest::Client::new()
            }
        };

        Self { client, base_url }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub async fn resolve(&self, lat: f64, lng: f64) -> Result<LandInfo> {
        let base_url = self
            .base_url
            .as_ref()
            .ok_or_else(|| anyhow!("land lookup is not configured"))?;

        let response = self
            .client
            .get(base_url)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Fire-and-forget enrichment after a factory is created. Failures are
    /// logged and leave the cadastral fields null; the caller never sees
    /// them.
    pub fn spawn_resolve(&self, db: DatabaseConnection, factory_id: Uuid, lat: f64, lng: f64) {
        if !self.is_configured() {
            tracing::debug!("Land lookup not configured, skipping factory {}", factory_id);
            return;
        }

        let service = self.clone();
        tokio::spawn(async move {
            match service.resolve(lat, lng).await {
                Ok(info) => {
                    if let Err(e) = persist_land_info(&db, factory_id, info).await {
                        tracing::warn!(
                            "Failed to persist land info for factory {}: {}",
                            factory_id,
                            e
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!("Land lookup failed for factory {}: {}", factory_id, e);
                }
            }
        });
    }
}

async fn persist_land_info(
    db: &DatabaseConnection,
    factory_id: Uuid,
    info: LandInfo,
) -> Result<()> {
    let existing = Factory::find_by_id(factory_id)
        .one(db)
        .await?
        .ok_or_else(|| anyhow!("factory {} vanished before land info arrived", factory_id))?;

    let now = chrono::Utc::now().naive_utc();
    let mut active: factory::ActiveModel = existing.into();
    active.landcode = Set(info.landcode);
    active.sectcode = Set(info.sectcode);
    active.sectname = Set(info.sectname);
    active.towncode = Set(info.towncode);
    active.townname = Set(info.townname);
    active.updated_at = Set(now);
    active.update(db).await?;

    tracing::info!("Land info resolved for factory {}", factory_id);
    Ok(())
}
