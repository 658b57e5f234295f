//! Read-only reporting over the ledger and earnings data.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::order::OrderStatus;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourierStatistics {
    pub total_deliveries: u64,
    pub total_earnings: f64,
    pub period: Period,
}

pub struct StatisticsAggregator {
    store: Arc<Store>,
}

impl StatisticsAggregator {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Deliveries and earnings for the courier inside [start, end]. The
    /// default window is the caller-local current day, 00:00:00.000 to
    /// 23:59:59.999.
    pub fn statistics(
        &self,
        courier_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> CourierStatistics {
        let today = Local::now().date_naive();
        let start = start.unwrap_or_else(|| local_day_bound(today, false));
        let end = end.unwrap_or_else(|| local_day_bound(today, true));

        let total_deliveries = self
            .store
            .orders
            .filter(|order| {
                order.courier_id.as_deref() == Some(courier_id)
                    && order.status == OrderStatus::Delivered
                    && order
                        .delivered_at
                        .is_some_and(|at| at >= start && at <= end)
            })
            .len() as u64;

        let total_earnings = self
            .store
            .earnings
            .filter(|entry| {
                entry.courier_id == courier_id
                    && entry.created_at >= start
                    && entry.created_at <= end
            })
            .iter()
            .map(|entry| entry.amount)
            .sum();

        CourierStatistics {
            total_deliveries,
            total_earnings,
            period: Period { start, end },
        }
    }
}

fn local_day_bound(date: NaiveDate, end_of_day: bool) -> DateTime<Utc> {
    let naive = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_milli_opt(0, 0, 0, 0)
    }
    .expect("valid time of day");

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
