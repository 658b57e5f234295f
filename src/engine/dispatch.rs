//! Dispatch coordinator: matches available couriers to ready orders and
//! performs the two cross-entity transitions (accept, complete). Both run
//! inside one store transaction with the preconditions re-validated under
//! the transaction lock; the initial reads only exist to fail fast.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::courier::{Courier, CourierStatus, EarningsEntry, GeoPoint};
use crate::models::order::{Order, OrderStatus};
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Courier share of the delivery fee.
pub const COURIER_TAKE_RATE: f64 = 0.8;

pub struct DispatchCoordinator {
    store: Arc<Store>,
    metrics: Metrics,
}

impl DispatchCoordinator {
    pub fn new(store: Arc<Store>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    /// Unassigned ready orders, optionally restricted to those whose
    /// restaurant lies within `radius_km` of `near`.
    pub fn list_ready_orders(&self, near: Option<GeoPoint>, radius_km: Option<f64>) -> Vec<Order> {
        self.store.orders.filter(|order| {
            if order.status != OrderStatus::ReadyForPickup || order.courier_id.is_some() {
                return false;
            }
            match (near, radius_km) {
                (Some(point), Some(radius)) => {
                    geo::within_radius(&order.restaurant_location, &point, radius)
                }
                _ => true,
            }
        })
    }

    /// Atomically assigns the order to the courier. At most one of N
    /// concurrent accepts for the same order succeeds; the losers see the
    /// courier_id set inside the transaction and get PreconditionFailed.
    pub async fn accept_order(&self, courier_id: &str, order_id: &str) -> Result<(), AppError> {
        let start = Instant::now();
        let result = self.accept_order_inner(courier_id, order_id).await;
        self.observe("accept", start, &result);
        result
    }

    async fn accept_order_inner(&self, courier_id: &str, order_id: &str) -> Result<(), AppError> {
        // Fast-path checks before taking the transaction lock.
        check_courier_available(&self.store.couriers.get(courier_id)?)?;
        check_order_ready(&self.store.orders.get(order_id)?)?;

        let courier_id = courier_id.to_string();
        let order_id = order_id.to_string();

        self.store
            .with_transaction(|txn| {
                check_courier_available(&txn.store().couriers.get(&courier_id)?)?;
                check_order_ready(&txn.store().orders.get(&order_id)?)?;

                let now = Utc::now();
                let oid = order_id.clone();
                let cid = courier_id.clone();
                txn.stage(move |s| {
                    s.orders.update(&oid, |order| {
                        order.courier_id = Some(cid.clone());
                        order.status = OrderStatus::PickedUp;
                        order.updated_at = now;
                    });
                });

                let oid = order_id.clone();
                let cid = courier_id.clone();
                txn.stage(move |s| {
                    s.couriers.update(&cid, |courier| {
                        courier.status = CourierStatus::Busy;
                        courier.current_order_id = Some(oid.clone());
                        courier.updated_at = now;
                    });
                });

                Ok(())
            })
            .await?;

        info!(order_id = %order_id, courier_id = %courier_id, "order accepted");
        Ok(())
    }

    /// Atomically completes the delivery: order delivered, courier released,
    /// one earnings entry appended. Safe to retry; a second call for an
    /// already-delivered order is a no-op and never duplicates earnings.
    pub async fn complete_delivery(&self, courier_id: &str, order_id: &str) -> Result<(), AppError> {
        let start = Instant::now();
        let result = self.complete_delivery_inner(courier_id, order_id).await;
        self.observe("complete", start, &result);
        result
    }

    async fn complete_delivery_inner(
        &self,
        courier_id: &str,
        order_id: &str,
    ) -> Result<(), AppError> {
        let order = self.store.orders.get(order_id)?;
        if order.courier_id.as_deref() != Some(courier_id) {
            return Err(AppError::Forbidden(
                "order is not assigned to this courier".to_string(),
            ));
        }

        let courier_id = courier_id.to_string();
        let order_id = order_id.to_string();

        self.store
            .with_transaction(|txn| {
                let order = txn.store().orders.get(&order_id)?;
                if order.courier_id.as_deref() != Some(courier_id.as_str()) {
                    return Err(AppError::Forbidden(
                        "order is not assigned to this courier".to_string(),
                    ));
                }
                if order.status == OrderStatus::Delivered {
                    // Retried completion; everything below already applied.
                    return Ok(());
                }

                let now = Utc::now();
                let amount = order.delivery_fee * COURIER_TAKE_RATE;

                let oid = order_id.clone();
                txn.stage(move |s| {
                    s.orders.update(&oid, |order| {
                        order.status = OrderStatus::Delivered;
                        order.delivered_at = Some(now);
                        order.updated_at = now;
                    });
                });

                let cid = courier_id.clone();
                txn.stage(move |s| {
                    s.couriers.update(&cid, |courier| {
                        courier.status = CourierStatus::Available;
                        courier.current_order_id = None;
                        courier.total_deliveries += 1;
                        courier.updated_at = now;
                    });
                });

                // Append-only, keyed off the order: never insert twice even
                // if the transaction body is retried.
                let already_credited = !txn
                    .store()
                    .earnings
                    .filter(|entry| entry.order_id == order_id)
                    .is_empty();
                if !already_credited {
                    let entry = EarningsEntry {
                        id: Uuid::new_v4().to_string(),
                        courier_id: courier_id.clone(),
                        order_id: order_id.clone(),
                        amount,
                        created_at: now,
                    };
                    txn.stage(move |s| {
                        s.earnings.insert(entry.id.clone(), entry);
                    });
                }

                Ok(())
            })
            .await?;

        info!(order_id = %order_id, courier_id = %courier_id, "delivery completed");
        Ok(())
    }

    fn observe(&self, op: &str, start: Instant, result: &Result<(), AppError>) {
        let outcome = match result {
            Ok(()) => "success",
            Err(AppError::TransactionAborted) => {
                self.metrics.transactions_aborted_total.inc();
                "aborted"
            }
            Err(_) => "rejected",
        };
        self.metrics
            .dispatch_total
            .with_label_values(&[op, outcome])
            .inc();
        self.metrics
            .dispatch_latency_seconds
            .with_label_values(&[op])
            .observe(start.elapsed().as_secs_f64());
    }
}

fn check_courier_available(courier: &Courier) -> Result<(), AppError> {
    if courier.status != CourierStatus::Available {
        return Err(AppError::PreconditionFailed(format!(
            "courier {} is not available",
            courier.id
        )));
    }
    Ok(())
}

fn check_order_ready(order: &Order) -> Result<(), AppError> {
    if order.status != OrderStatus::ReadyForPickup || order.courier_id.is_some() {
        return Err(AppError::PreconditionFailed(format!(
            "order {} is not available for pickup",
            order.id
        )));
    }
    Ok(())
}
