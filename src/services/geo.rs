use crate::{
    error::AppResult,
    models::{factory, Factory},
};
use rand::seq::SliceRandom;
use sea_orm::{ColumnTrait, DatabaseConnection, FromQueryResult, QueryFilter, QuerySelect};
use uuid::Uuid;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Kilometers per degree, used only to size the coarse SQL prefilter box.
// Latitude uses the smallest value on the ellipsoid so the box always errs
// on the wide side; the exact spherical distance is applied afterwards.
const KM_PER_DEGREE_LAT: f64 = 110.574;
const KM_PER_DEGREE_LNG_EQUATOR: f64 = 111.320;

/// Minimal projection of a factory row for distance filtering.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct FactoryPoint {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
}

/// Great-circle distance via the spherical law of cosines:
/// `R * acos(cos(lat1)·cos(lat2)·cos(lng2−lng1) + sin(lat1)·sin(lat2))`.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lng1) = (lat1.to_radians(), lng1.to_radians());
    let (lat2, lng2) = (lat2.to_radians(), lng2.to_radians());

    let central_angle_cos = lat1.cos() * lat2.cos() * (lng2 - lng1).cos() + lat1.sin() * lat2.sin();
    // Rounding can push the cosine a hair outside [-1, 1] for (near-)identical
    // points, which would make acos return NaN.
    EARTH_RADIUS_KM * central_angle_cos.clamp(-1.0, 1.0).acos()
}

/// Keep the points strictly closer than `radius_km` to the query position,
/// ordered by factory id ascending. The ordering is intentionally NOT by
/// distance: a stable candidate list keeps downstream sampling decisions
/// independent of the query position.
pub fn filter_within_radius(
    points: &[FactoryPoint],
    lat: f64,
    lng: f64,
    radius_km: f64,
) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = points
        .iter()
        .filter(|p| distance_km(lat, lng, p.lat, p.lng) < radius_km)
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Bound an oversized candidate set to `max` ids by unweighted random
/// sampling. Sets at or below the cap come back untouched, in their original
/// order. Once truncation triggers, repeated identical queries will return
/// different subsets; the map UI treats results as a refreshable snapshot,
/// so that is acceptable.
pub fn bound_results(mut ids: Vec<Uuid>, max: usize) -> Vec<Uuid> {
    if ids.len() <= max {
        return ids;
    }
    ids.shuffle(&mut rand::rng());
    ids.truncate(max);
    ids
}

pub struct GeoService {
    db: DatabaseConnection,
}

impl GeoService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Ids of all live factories strictly within `radius_km` of the query
    /// point, ascending. A rectangular lat/lng prefilter runs in SQL so the
    /// exact per-row distance only has to look at plausible candidates.
    pub async fn find_within_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> AppResult<Vec<Uuid>> {
        let lat_delta = radius_km / KM_PER_DEGREE_LAT;
        // Longitude degrees shrink with latitude; size the box for the
        // latitude furthest from the equator the window can reach.
        let widest_lat = (lat.abs() + lat_delta).min(89.9);
        let lng_delta = radius_km / (KM_PER_DEGREE_LNG_EQUATOR * widest_lat.to_radians().cos());

        let points = Factory::active()
            .select_only()
            .column(factory::Column::Id)
            .column(factory::Column::Lat)
            .column(factory::Column::Lng)
            .filter(factory::Column::Lat.between(lat - lat_delta, lat + lat_delta))
            .filter(factory::Column::Lng.between(lng - lng_delta, lng + lng_delta))
            .into_model::<FactoryPoint>()
            .all(&self.db)
            .await?;

        Ok(filter_within_radius(&points, lat, lng, radius_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u128, lat: f64, lng: f64) -> FactoryPoint {
        FactoryPoint {
            id: Uuid::from_u128(id),
            lat,
            lng,
        }
    }

    #[test]
    fn distance_zero_for_identical_points() {
        assert_eq!(distance_km(23.5, 120.5, 23.5, 120.5), 0.0);
    }

    #[test]
    fn distance_one_degree_of_latitude() {
        // 1° of latitude on a 6371 km sphere is 2π·6371/360 ≈ 111.19 km.
        let d = distance_km(0.0, 121.0, 1.0, 121.0);
        assert!((d - 111.19).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn distance_taipei_kaohsiung() {
        let d = distance_km(25.0330, 121.5654, 22.6273, 120.3014);
        assert!((280.0..310.0).contains(&d), "got {}", d);
    }

    #[test]
    fn filter_keeps_only_points_inside_radius() {
        let points = vec![
            point(1, 23.234, 120.1),
            point(2, 23.236, 120.102), // a few hundred meters away
            point(3, 24.234, 120.1),   // ~111 km away
        ];
        let ids = filter_within_radius(&points, 23.234, 120.1, 1.0);
        assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
    }

    #[test]
    fn filter_radius_is_strict() {
        let p = point(1, 23.243, 120.1);
        let d = distance_km(23.234, 120.1, p.lat, p.lng);

        let points = vec![p];
        assert!(filter_within_radius(&points, 23.234, 120.1, d).is_empty());
        assert_eq!(filter_within_radius(&points, 23.234, 120.1, d + 1e-9).len(), 1);
    }

    #[test]
    fn filter_orders_by_id_ascending() {
        let points = vec![
            point(9, 23.234, 120.1),
            point(1, 23.234, 120.1),
            point(5, 23.234, 120.1),
        ];
        let ids = filter_within_radius(&points, 23.234, 120.1, 1.0);
        assert_eq!(
            ids,
            vec![Uuid::from_u128(1), Uuid::from_u128(5), Uuid::from_u128(9)]
        );
    }

    #[test]
    fn bound_returns_input_unchanged_below_cap() {
        let ids: Vec<Uuid> = (1..=5).map(Uuid::from_u128).collect();
        assert_eq!(bound_results(ids.clone(), 5), ids);
        assert_eq!(bound_results(ids.clone(), 100), ids);
    }

    #[test]
    fn bound_truncates_to_cap() {
        let ids: Vec<Uuid> = (1..=100).map(Uuid::from_u128).collect();
        let bounded = bound_results(ids.clone(), 10);
        assert_eq!(bounded.len(), 10);
        // Sampled ids are a subset of the candidates, with no duplicates.
        let mut seen = bounded.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 10);
        assert!(bounded.iter().all(|id| ids.contains(id)));
    }
}
