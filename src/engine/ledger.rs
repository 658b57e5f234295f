//! Order ledger: owns order documents, their pricing at creation, and the
//! status state machine. Orders are never deleted; cancellation is a
//! terminal status.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Address, Order, OrderItem, OrderStatus};
use crate::store::Store;

pub const TAX_RATE: f64 = 0.15;
pub const DELIVERY_FEE: f64 = 10.0;

/// An item reference as submitted by the customer; the unit price is
/// resolved from the restaurant menu, never trusted from the request.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub quantity: u32,
}

pub struct OrderLedger {
    store: Arc<Store>,
}

impl OrderLedger {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        customer_id: &str,
        restaurant_id: &str,
        items: &[LineItem],
        delivery_address: Address,
    ) -> Result<Order, AppError> {
        if items.is_empty() {
            return Err(AppError::Validation("order has no items".to_string()));
        }
        if items.iter().any(|item| item.quantity == 0) {
            return Err(AppError::Validation("item quantity must be > 0".to_string()));
        }

        let restaurant = self.store.restaurants.get(restaurant_id)?;

        let mut priced_items = Vec::with_capacity(items.len());
        let mut subtotal = 0.0;
        for item in items {
            let menu_item = restaurant.menu_item(&item.item_id).ok_or_else(|| {
                AppError::NotFound(format!("menu item {} not found", item.item_id))
            })?;

            subtotal += menu_item.price * f64::from(item.quantity);
            priced_items.push(OrderItem {
                item_id: menu_item.id.clone(),
                name: menu_item.name.clone(),
                quantity: item.quantity,
                unit_price: menu_item.price,
            });
        }

        let tax = subtotal * TAX_RATE;
        let total = subtotal + tax + DELIVERY_FEE;
        let now = Utc::now();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            items: priced_items,
            customer_location: delivery_address.location,
            delivery_address,
            restaurant_location: restaurant.location,
            subtotal,
            tax,
            delivery_fee: DELIVERY_FEE,
            total,
            status: OrderStatus::Pending,
            courier_id: None,
            created_at: now,
            updated_at: now,
            delivered_at: None,
            cancelled_at: None,
            cancelled_by: None,
        };

        self.store.orders.insert(order.id.clone(), order.clone());
        info!(order_id = %order.id, customer_id, total = order.total, "order created");

        Ok(order)
    }

    pub fn get(&self, order_id: &str) -> Result<Order, AppError> {
        self.store.orders.get(order_id)
    }

    /// Validates the edge against the lifecycle graph; an out-of-graph edge
    /// rejects with InvalidTransition and leaves the order untouched.
    pub fn set_status(&self, order_id: &str, new_status: OrderStatus) -> Result<(), AppError> {
        self.store.orders.try_update(order_id, |order| {
            if !order.status.can_transition_to(new_status) {
                return Err(AppError::InvalidTransition(format!(
                    "order {} cannot move from {} to {}",
                    order.id, order.status, new_status
                )));
            }

            order.status = new_status;
            order.updated_at = Utc::now();
            if new_status == OrderStatus::Delivered {
                order.delivered_at = Some(order.updated_at);
            }
            info!(order_id, status = %new_status, "order status updated");
            Ok(())
        })
    }

    /// Only the owning customer may cancel, and only from Pending or
    /// Accepted.
    pub fn cancel(&self, order_id: &str, requesting_user_id: &str) -> Result<(), AppError> {
        self.store.orders.try_update(order_id, |order| {
            if order.customer_id != requesting_user_id {
                return Err(AppError::Forbidden(
                    "only the ordering customer may cancel".to_string(),
                ));
            }
            if !matches!(order.status, OrderStatus::Pending | OrderStatus::Accepted) {
                return Err(AppError::InvalidTransition(format!(
                    "order {} cannot be cancelled from {}",
                    order.id, order.status
                )));
            }

            let now = Utc::now();
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
            order.cancelled_at = Some(now);
            order.cancelled_by = Some(requesting_user_id.to_string());
            info!(order_id, cancelled_by = requesting_user_id, "order cancelled");
            Ok(())
        })
    }

    /// Snapshot of the customer's orders, newest first.
    pub fn history_for_customer(&self, customer_id: &str) -> Vec<Order> {
        let mut orders = self
            .store
            .orders
            .filter(|order| order.customer_id == customer_id);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}
