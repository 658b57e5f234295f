use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
    Available,
    Busy,
    Offline,
}

/// Courier document. Created out-of-band at registration; status, location
/// and the current-assignment pointer are mutated only by the registry and
/// the dispatch transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: String,
    pub status: CourierStatus,
    pub current_location: GeoPoint,
    /// Non-null iff status == Busy; agrees with the order's courier_id.
    pub current_order_id: Option<String>,
    pub rating: f64,
    pub total_deliveries: u64,
    pub last_location_update: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Courier {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            status: CourierStatus::Available,
            current_location: location,
            current_order_id: None,
            rating: 5.0,
            total_deliveries: 0,
            last_location_update: None,
            updated_at: Utc::now(),
        }
    }
}

/// Append-only earnings record, one per completed delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsEntry {
    pub id: String,
    pub courier_id: String,
    pub order_id: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}
