use std::env;

/// Geographic query limits. Queries outside the Taiwan bounding box or the
/// radius window are rejected before any database work happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoConfig {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_radius_km: f64,
    pub max_radius_km: f64,
    /// Cap on the number of factories a single nearby query may return.
    /// Oversized result sets are randomly sampled down to this count.
    pub max_query_results: usize,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            min_lat: 22.0,
            max_lat: 25.0,
            min_lng: 120.0,
            max_lng: 122.0,
            min_radius_km: 0.01,
            max_radius_km: 100.0,
            max_query_results: 500,
        }
    }
}

impl GeoConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.min_lat = parse_f64_env("TAIWAN_MIN_LAT", cfg.min_lat);
        cfg.max_lat = parse_f64_env("TAIWAN_MAX_LAT", cfg.max_lat);
        cfg.min_lng = parse_f64_env("TAIWAN_MIN_LNG", cfg.min_lng);
        cfg.max_lng = parse_f64_env("TAIWAN_MAX_LNG", cfg.max_lng);
        cfg.max_query_results = env::var("FACTORY_QUERY_MAX_RESULTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(cfg.max_query_results);
        cfg
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    pub fn radius_valid(&self, radius_km: f64) -> bool {
        radius_km >= self.min_radius_km && radius_km <= self.max_radius_km
    }

    /// Error body for a query point outside the bounding box.
    pub fn out_of_bounds_message(&self) -> String {
        format!(
            "The query position is not in the range of Taiwan. \
             Valid query parameters should be: \
             {} < lng < {}, {} < lat < {}.",
            self.min_lng, self.max_lng, self.min_lat, self.max_lat
        )
    }
}

fn parse_f64_env(var_name: &str, default: f64) -> f64 {
    match env::var(var_name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("Invalid {} '{}', using default {}", var_name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
