//! Database models for the restaurant catalog.

use crate::types::{MenuCategoryId, MenuItemId, RestaurantId, TableId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RestaurantDBResponse {
    pub id: RestaurantId,
    pub owner_id: UserId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub time_slot_interval_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DiningTableDBResponse {
    pub id: TableId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct MenuItemDBResponse {
    pub id: MenuItemId,
    pub category_id: MenuCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
    pub is_available: bool,
}

/// A menu category and the items loaded for it
#[derive(Debug, Clone)]
pub struct MenuCategoryDBResponse {
    pub id: MenuCategoryId,
    pub name: String,
    pub sort: i32,
    pub items: Vec<MenuItemDBResponse>,
}

/// A restaurant together with its tables and available menu
#[derive(Debug, Clone)]
pub struct CatalogDBResponse {
    pub restaurant: RestaurantDBResponse,
    pub tables: Vec<DiningTableDBResponse>,
    pub categories: Vec<MenuCategoryDBResponse>,
}
