//! OpenAPI document for the `/api/v1` surface, served at `/api-docs/openapi.json` and
//! rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::config::{DEFAULT_PROXY_HEADER, DEFAULT_SESSION_COOKIE};

/// Session cookie and trusted proxy header schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    DEFAULT_SESSION_COOKIE,
                    "Signed session token issued by the login service",
                ))),
            );
            components.security_schemes.insert(
                "ProxyHeader".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    DEFAULT_PROXY_HEADER,
                    "Caller email, set by a trusted authenticating proxy",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Reservation API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::restaurants::list_restaurants,
        api::handlers::restaurants::get_restaurant,
        api::handlers::reservations::create_reservation,
        api::handlers::reservations::get_reservation,
        api::handlers::reservations::update_reservation,
        api::handlers::reservations::change_reservation_status,
        api::handlers::reservations::list_my_reservations,
        api::handlers::reservations::list_restaurant_reservations,
    ),
    components(
        schemas(
            api::models::users::Role,
            api::models::restaurants::RestaurantSummary,
            api::models::restaurants::RestaurantDetail,
            api::models::restaurants::TableResponse,
            api::models::restaurants::MenuCategoryResponse,
            api::models::restaurants::MenuItemResponse,
            api::models::reservations::ReservationStatus,
            api::models::reservations::PreorderItemInput,
            api::models::reservations::ReservationCreate,
            api::models::reservations::ReservationUpdate,
            api::models::reservations::StatusChangeForm,
            api::models::reservations::ReservationCreated,
            api::models::reservations::ReservationResponse,
            api::models::reservations::PreorderItemResponse,
            api::models::reservations::ReservationDetail,
            api::models::reservations::RestaurantRef,
            api::models::reservations::MyReservation,
            api::models::reservations::OwnerReservation,
            api::models::reservations::OwnerReservationsResponse,
        )
    ),
    tags(
        (name = "restaurants", description = "Public restaurant directory: tables and menus."),
        (name = "reservations", description = "Booking, editing and reviewing reservations. Diners create and edit \
their own bookings; restaurant owners confirm or cancel bookings at their restaurants."),
    ),
    info(
        title = "Tablebook API",
        version = "1.0.0",
        description = "Restaurant reservations with optional table assignment and menu pre-orders.

## Authentication

Requests are authenticated with a session cookie or, behind a trusted proxy, an email header. \
The restaurant directory is public.

## Errors

Errors return a plain-text message with the matching status code. Table conflicts return `409` \
with a JSON body of the form `{\"message\": \"...\"}`.",
    )
)]
pub struct ApiDoc;
