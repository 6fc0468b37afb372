//! Read-only repository for the restaurant catalog.

use crate::db::{
    errors::Result,
    models::restaurants::{CatalogDBResponse, DiningTableDBResponse, MenuCategoryDBResponse, MenuItemDBResponse, RestaurantDBResponse},
};
use crate::types::{MenuCategoryId, RestaurantId, UserId, abbrev_uuid};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, FromRow)]
struct MenuCategoryRow {
    id: MenuCategoryId,
    name: String,
    sort: i32,
}

pub struct Restaurants<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Restaurants<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// All restaurants, ordered by name
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<RestaurantDBResponse>> {
        let restaurants = sqlx::query_as::<_, RestaurantDBResponse>("SELECT * FROM restaurants ORDER BY name ASC, id ASC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(restaurants)
    }

    #[instrument(skip(self), fields(restaurant_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: RestaurantId) -> Result<Option<RestaurantDBResponse>> {
        let restaurant = sqlx::query_as::<_, RestaurantDBResponse>("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(restaurant)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<RestaurantDBResponse>> {
        let restaurant = sqlx::query_as::<_, RestaurantDBResponse>("SELECT * FROM restaurants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(restaurant)
    }

    /// Look up a restaurant by slug, but only if `owner_id` owns it
    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn get_owned_by_slug(&mut self, slug: &str, owner_id: UserId) -> Result<Option<RestaurantDBResponse>> {
        let restaurant = sqlx::query_as::<_, RestaurantDBResponse>("SELECT * FROM restaurants WHERE slug = $1 AND owner_id = $2")
            .bind(slug)
            .bind(owner_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(restaurant)
    }

    #[instrument(skip(self), fields(restaurant_id = %abbrev_uuid(&restaurant_id)), err)]
    pub async fn get_tables(&mut self, restaurant_id: RestaurantId) -> Result<Vec<DiningTableDBResponse>> {
        let tables = sqlx::query_as::<_, DiningTableDBResponse>(
            "SELECT id, restaurant_id, name, capacity FROM dining_tables WHERE restaurant_id = $1 ORDER BY name ASC",
        )
        .bind(restaurant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(tables)
    }

    /// Menu categories ordered by `sort`, each with its available items
    #[instrument(skip(self), fields(restaurant_id = %abbrev_uuid(&restaurant_id)), err)]
    pub async fn get_menu(&mut self, restaurant_id: RestaurantId) -> Result<Vec<MenuCategoryDBResponse>> {
        let categories = sqlx::query_as::<_, MenuCategoryRow>(
            "SELECT id, name, sort FROM menu_categories WHERE restaurant_id = $1 ORDER BY sort ASC, name ASC",
        )
        .bind(restaurant_id)
        .fetch_all(&mut *self.db)
        .await?;

        let items = sqlx::query_as::<_, MenuItemDBResponse>(
            r#"
            SELECT mi.id, mi.category_id, mi.name, mi.description, mi.price_cents, mi.is_available
            FROM menu_items mi
            JOIN menu_categories mc ON mc.id = mi.category_id
            WHERE mc.restaurant_id = $1 AND mi.is_available
            ORDER BY mi.name ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&mut *self.db)
        .await?;

        let menu = categories
            .into_iter()
            .map(|category| MenuCategoryDBResponse {
                items: items.iter().filter(|item| item.category_id == category.id).cloned().collect(),
                id: category.id,
                name: category.name,
                sort: category.sort,
            })
            .collect();

        Ok(menu)
    }

    /// The restaurant with its tables and available menu
    #[instrument(skip(self), fields(restaurant_id = %abbrev_uuid(&restaurant.id)), err)]
    pub async fn get_catalog(&mut self, restaurant: RestaurantDBResponse) -> Result<CatalogDBResponse> {
        let tables = self.get_tables(restaurant.id).await?;
        let categories = self.get_menu(restaurant.id).await?;

        Ok(CatalogDBResponse {
            restaurant,
            tables,
            categories,
        })
    }
}
