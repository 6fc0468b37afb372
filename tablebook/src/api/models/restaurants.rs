//! API response models for the restaurant catalog.

use crate::db::models::restaurants::{
    CatalogDBResponse, DiningTableDBResponse, MenuCategoryDBResponse, MenuItemDBResponse, RestaurantDBResponse,
};
use crate::types::{MenuCategoryId, MenuItemId, RestaurantId, TableId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A restaurant as shown in the public listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: RestaurantId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TableId,
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MenuItemId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
}

/// A menu category with its currently available items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuCategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MenuCategoryId,
    pub name: String,
    pub sort: i32,
    pub items: Vec<MenuItemResponse>,
}

/// A restaurant with its tables and available menu, categories ordered by `sort`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantDetail {
    #[schema(value_type = String, format = "uuid")]
    pub id: RestaurantId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub time_slot_interval_minutes: i32,
    pub tables: Vec<TableResponse>,
    pub menu: Vec<MenuCategoryResponse>,
}

impl From<RestaurantDBResponse> for RestaurantSummary {
    fn from(db: RestaurantDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            image_url: db.image_url,
        }
    }
}

impl From<DiningTableDBResponse> for TableResponse {
    fn from(db: DiningTableDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            capacity: db.capacity,
        }
    }
}

impl From<MenuItemDBResponse> for MenuItemResponse {
    fn from(db: MenuItemDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            price_cents: db.price_cents,
        }
    }
}

impl From<MenuCategoryDBResponse> for MenuCategoryResponse {
    fn from(db: MenuCategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            sort: db.sort,
            items: db.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CatalogDBResponse> for RestaurantDetail {
    fn from(db: CatalogDBResponse) -> Self {
        let CatalogDBResponse {
            restaurant,
            tables,
            categories,
        } = db;
        Self {
            id: restaurant.id,
            name: restaurant.name,
            slug: restaurant.slug,
            description: restaurant.description,
            image_url: restaurant.image_url,
            address: restaurant.address,
            phone: restaurant.phone,
            time_slot_interval_minutes: restaurant.time_slot_interval_minutes,
            tables: tables.into_iter().map(Into::into).collect(),
            menu: categories.into_iter().map(Into::into).collect(),
        }
    }
}
