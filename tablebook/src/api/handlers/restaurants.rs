use crate::AppState;
use crate::api::models::restaurants::{RestaurantDetail, RestaurantSummary};
use crate::db::handlers::Restaurants;
use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/restaurants",
    tag = "restaurants",
    summary = "List restaurants",
    description = "Public restaurant directory, ordered by name.",
    responses(
        (status = 200, description = "Restaurants", body = Vec<RestaurantSummary>),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_restaurants(State(state): State<AppState>) -> Result<Json<Vec<RestaurantSummary>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let restaurants = Restaurants::new(&mut conn).list().await?;

    Ok(Json(restaurants.into_iter().map(RestaurantSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/restaurants/{slug}",
    tag = "restaurants",
    summary = "Get restaurant",
    description = "Restaurant with its tables and available menu, categories in display order.",
    params(
        ("slug" = String, Path, description = "Restaurant slug"),
    ),
    responses(
        (status = 200, description = "Restaurant detail", body = RestaurantDetail),
        (status = 404, description = "Restaurant not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_restaurant(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<RestaurantDetail>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Restaurants::new(&mut conn);

    let restaurant = repo.get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Restaurant".to_string(),
        id: slug.clone(),
    })?;
    let catalog = repo.get_catalog(restaurant).await?;

    Ok(Json(catalog.into()))
}
