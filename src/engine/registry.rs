//! Courier registry: availability, location, and the current-assignment
//! pointer. The dispatch transactions are the only other writer of courier
//! documents.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::geo;
use crate::models::courier::{Courier, CourierStatus, GeoPoint};
use crate::store::Store;

pub struct CourierRegistry {
    store: Arc<Store>,
}

impl CourierRegistry {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Registration itself is out-of-band; this seeds the courier document.
    pub fn register(&self, courier: Courier) {
        self.store.couriers.insert(courier.id.clone(), courier);
    }

    pub fn get(&self, courier_id: &str) -> Result<Courier, AppError> {
        self.store.couriers.get(courier_id)
    }

    pub fn set_location(&self, courier_id: &str, location: GeoPoint) -> Result<(), AppError> {
        self.store.couriers.try_update(courier_id, |courier| {
            courier.current_location = location;
            courier.last_location_update = Some(Utc::now());
            Ok(())
        })
    }

    pub fn set_status(&self, courier_id: &str, status: CourierStatus) -> Result<(), AppError> {
        self.store.couriers.try_update(courier_id, |courier| {
            courier.status = status;
            courier.updated_at = Utc::now();
            info!(courier_id, status = ?status, "courier status updated");
            Ok(())
        })
    }

    /// Available couriers, optionally restricted to a radius around a point
    /// and sorted nearest-first when a point is given.
    pub fn available(&self, near: Option<GeoPoint>, radius_km: Option<f64>) -> Vec<Courier> {
        let mut couriers = self.store.couriers.filter(|courier| {
            if courier.status != CourierStatus::Available {
                return false;
            }
            match (near, radius_km) {
                (Some(point), Some(radius)) => {
                    geo::within_radius(&courier.current_location, &point, radius)
                }
                _ => true,
            }
        });

        if let Some(point) = near {
            couriers.sort_by(|a, b| {
                let da = geo::haversine_km(&a.current_location, &point);
                let db = geo::haversine_km(&b.current_location, &point);
                da.total_cmp(&db)
            });
        }

        couriers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::CourierRegistry;
    use crate::error::AppError;
    use crate::models::courier::{Courier, CourierStatus, GeoPoint};
    use crate::store::Store;

    fn registry() -> CourierRegistry {
        CourierRegistry::new(Arc::new(Store::new(Duration::from_millis(100))))
    }

    fn at(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    #[test]
    fn unknown_courier_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.set_status("ghost", CourierStatus::Available),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            registry.set_location("ghost", at(0.0, 0.0)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn set_location_stamps_last_update() {
        let registry = registry();
        registry.register(Courier::new("c1", at(31.95, 35.91)));

        registry.set_location("c1", at(31.96, 35.92)).unwrap();
        let courier = registry.get("c1").unwrap();
        assert_eq!(courier.current_location, at(31.96, 35.92));
        assert!(courier.last_location_update.is_some());
    }

    #[test]
    fn available_filters_status_and_radius_and_sorts_by_distance() {
        let registry = registry();
        let center = at(31.9539, 35.9106);

        let mut offline = Courier::new("offline", center);
        offline.status = CourierStatus::Offline;
        registry.register(offline);

        registry.register(Courier::new("near", at(31.9540, 35.9110)));
        registry.register(Courier::new("close", at(31.9522, 35.9283)));
        registry.register(Courier::new("far", at(32.05, 36.10)));

        let found = registry.available(Some(center), Some(5.0));
        let ids: Vec<_> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "close"]);
    }

    #[test]
    fn available_without_point_returns_all_available() {
        let registry = registry();
        registry.register(Courier::new("a", at(0.0, 0.0)));
        registry.register(Courier::new("b", at(10.0, 10.0)));

        assert_eq!(registry.available(None, None).len(), 2);
    }
}
