use serde::{Deserialize, Serialize};

use crate::models::courier::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// Restaurant document, read-only for this subsystem. Listing CRUD lives
/// elsewhere; order creation only needs the menu (authoritative prices)
/// and the location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub menu: Vec<MenuItem>,
}

impl Restaurant {
    pub fn menu_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.menu.iter().find(|item| item.id == item_id)
    }
}
