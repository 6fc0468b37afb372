//! Shared fixtures for tests.

use crate::{
    api::models::users::{CurrentUser, Role},
    auth::session::create_session_token,
    config::{Config, PoolSettings},
    db::{handlers::Users, models::users::{UserCreateDBRequest, UserDBResponse}},
    types::{MenuItemId, RestaurantId, TableId, UserId},
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Default::default()
    };
    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    config.auth.proxy_header.enabled = true;
    config.auth.proxy_header.auto_create_users = false;
    config
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let app = crate::Application::new_with_pool(config, pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let email = format!("user_{}@example.com", Uuid::new_v4().simple());

    let user_create = UserCreateDBRequest {
        email,
        display_name: Some("Test User".to_string()),
        role,
        auth_source: "test".to_string(),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// Header authenticating `user` through the trusted proxy
pub fn add_auth_headers(user: &UserDBResponse) -> (String, String) {
    let config = create_test_config();
    (config.auth.proxy_header.header_name, user.email.clone())
}

/// Cookie header carrying a session token for `user`
pub fn session_cookie(user: &UserDBResponse) -> (String, String) {
    let config = create_test_config();
    let token = create_session_token(&CurrentUser::from(user.clone()), &config).expect("Failed to create session token");
    ("cookie".to_string(), format!("{}={token}", config.auth.session.cookie_name))
}

/// A seeded restaurant: four tables, a Starters category (sort 0) and a Mains category
/// (sort 1) holding two available items and one unavailable item.
#[derive(Debug, Clone)]
pub struct TestRestaurant {
    pub id: RestaurantId,
    pub owner_id: UserId,
    pub slug: String,
    pub tables: Vec<TableId>,
    pub menu_items: Vec<MenuItemId>,
    pub unavailable_item: MenuItemId,
}

pub async fn create_test_restaurant(pool: &PgPool, owner_id: UserId, slug: &str) -> TestRestaurant {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    let id: RestaurantId = sqlx::query_scalar(
        "INSERT INTO restaurants (owner_id, name, slug, description) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(owner_id)
    .bind(slug)
    .bind(slug)
    .bind("A test restaurant")
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to create restaurant");

    let mut tables = Vec::new();
    for (name, capacity) in [("T1", 2), ("T2", 2), ("T3", 4), ("T4", 6)] {
        let table_id: TableId =
            sqlx::query_scalar("INSERT INTO dining_tables (restaurant_id, name, capacity) VALUES ($1, $2, $3) RETURNING id")
                .bind(id)
                .bind(name)
                .bind(capacity)
                .fetch_one(&mut *tx)
                .await
                .expect("Failed to create table");
        tables.push(table_id);
    }

    // Inserted out of sort order on purpose
    let mains: Uuid = sqlx::query_scalar("INSERT INTO menu_categories (restaurant_id, name, sort) VALUES ($1, 'Mains', 1) RETURNING id")
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .expect("Failed to create category");
    let starters: Uuid =
        sqlx::query_scalar("INSERT INTO menu_categories (restaurant_id, name, sort) VALUES ($1, 'Starters', 0) RETURNING id")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .expect("Failed to create category");

    let mut menu_items = Vec::new();
    for (category, name, price_cents) in [(starters, "Bruschetta", 850), (mains, "Risotto", 1900)] {
        let item_id: MenuItemId =
            sqlx::query_scalar("INSERT INTO menu_items (category_id, name, price_cents) VALUES ($1, $2, $3) RETURNING id")
                .bind(category)
                .bind(name)
                .bind(price_cents)
                .fetch_one(&mut *tx)
                .await
                .expect("Failed to create menu item");
        menu_items.push(item_id);
    }

    let unavailable_item: MenuItemId = sqlx::query_scalar(
        "INSERT INTO menu_items (category_id, name, price_cents, is_available) VALUES ($1, 'Truffle special', 4200, FALSE) RETURNING id",
    )
    .bind(mains)
    .fetch_one(&mut *tx)
    .await
    .expect("Failed to create menu item");

    tx.commit().await.expect("Failed to commit restaurant fixture");

    TestRestaurant {
        id,
        owner_id,
        slug: slug.to_string(),
        tables,
        menu_items,
        unavailable_item,
    }
}
