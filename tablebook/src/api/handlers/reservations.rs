use crate::api::models::reservations::{
    ListReservationsQuery, MyReservation, OwnerReservation, OwnerReservationsResponse, PreorderItemResponse, ReservationCreate,
    ReservationCreated, ReservationDetail, ReservationResponse, ReservationStatus, ReservationUpdate, StatusChangeForm,
};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{can_change_status, can_edit_reservation, can_read_reservation, require_owner};
use crate::db::handlers::{Repository, Reservations, Restaurants, reservations::ReservationFilter};
use crate::db::models::reservations::{ConflictWindow, ReservationCreateDBRequest, ReservationUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{Operation, Permission, ReservationId, Resource, abbrev_uuid};
use crate::{AppState, config::ReservationsConfig};
use axum::{
    Form, Json,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode, header::REFERER},
    response::Redirect,
};
use sqlx::PgConnection;
use tracing::{debug, info};

fn not_found(id: ReservationId) -> Error {
    Error::NotFound {
        resource: "Reservation".to_string(),
        id: id.to_string(),
    }
}

fn check_party_size(party_size: i32, rules: &ReservationsConfig) -> Result<()> {
    if party_size <= 0 {
        return Err(Error::BadRequest {
            message: "party_size must be a positive integer".to_string(),
        });
    }
    if party_size > rules.max_party_size {
        return Err(Error::BadRequest {
            message: format!("party_size cannot exceed {}", rules.max_party_size),
        });
    }
    Ok(())
}

fn check_duration(duration_minutes: i32, rules: &ReservationsConfig) -> Result<()> {
    if duration_minutes <= 0 {
        return Err(Error::BadRequest {
            message: "duration_minutes must be a positive integer".to_string(),
        });
    }
    if duration_minutes > rules.max_duration_minutes {
        return Err(Error::BadRequest {
            message: format!("duration_minutes cannot exceed {}", rules.max_duration_minutes),
        });
    }
    Ok(())
}

/// Assemble the reservation with its restaurant catalog and resolved pre-order
async fn load_detail(conn: &mut PgConnection, id: ReservationId) -> Result<ReservationDetail> {
    let reservation = Reservations::new(&mut *conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;
    let items = Reservations::new(&mut *conn).get_preorder_items(id).await?;

    let mut restaurants = Restaurants::new(&mut *conn);
    let restaurant = restaurants
        .get_by_id(reservation.restaurant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Restaurant".to_string(),
            id: reservation.restaurant_id.to_string(),
        })?;
    let catalog = restaurants.get_catalog(restaurant).await?;

    Ok(ReservationDetail {
        reservation: ReservationResponse::from(&reservation),
        restaurant: catalog.into(),
        preorder_items: items.into_iter().map(PreorderItemResponse::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    summary = "Create reservation",
    description = "Book a table (or a table-less slot). New reservations start PENDING. When a table is given, \
                   the booking is rejected if an active reservation on that table starts within one duration of \
                   the requested start.",
    request_body = ReservationCreate,
    responses(
        (status = 201, description = "Reservation created", body = ReservationCreated),
        (status = 400, description = "Missing or invalid fields, or table belongs to another restaurant"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Restaurant not found"),
        (status = 409, description = "Table already booked for that time"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_reservation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    body: std::result::Result<Json<ReservationCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationCreated>)> {
    let Json(create) = body?;
    let rules = &state.config.reservations;

    check_party_size(create.party_size, rules)?;
    if let Some(duration_minutes) = create.duration_minutes {
        check_duration(duration_minutes, rules)?;
    }

    let request = ReservationCreateDBRequest::new(current_user.id, &create, rules.default_duration_minutes);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    if Restaurants::new(&mut tx).get_by_id(request.restaurant_id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Restaurant".to_string(),
            id: request.restaurant_id.to_string(),
        });
    }

    let mut repo = Reservations::new(&mut tx);

    if let Some(table_id) = request.table_id {
        // Held until commit, so concurrent bookings of this table run the check one at a time
        let table_restaurant = repo.lock_table(table_id).await?;
        if table_restaurant != Some(request.restaurant_id) {
            return Err(Error::BadRequest {
                message: format!("Table {table_id} does not belong to this restaurant"),
            });
        }

        let window = ConflictWindow {
            table_id,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            mode: rules.conflict_check,
        };
        if window.bounds().is_none() {
            return Err(Error::BadRequest {
                message: "start_time and duration_minutes fall outside the supported date range".to_string(),
            });
        }
        if let Some(existing) = repo.find_conflict(&window).await? {
            debug!("Table {} conflicts with reservation {}", abbrev_uuid(&table_id), abbrev_uuid(&existing));
            return Err(Error::Conflict {
                message: "This table is already booked for the requested time".to_string(),
            });
        }
    }

    let reservation = repo.create(&request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(
        "Created reservation {} at restaurant {}",
        abbrev_uuid(&reservation.id),
        abbrev_uuid(&reservation.restaurant_id)
    );

    Ok((
        StatusCode::CREATED,
        Json(ReservationCreated {
            id: reservation.id,
            status: reservation.status,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Get reservation",
    description = "Visible to the diner who made it and to the owner of its restaurant.",
    params(
        ("id" = uuid::Uuid, Path, description = "Reservation ID"),
    ),
    responses(
        (status = 200, description = "Reservation with restaurant and pre-order", body = ReservationDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - not the diner or the restaurant owner"),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_reservation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ReservationId>,
) -> Result<Json<ReservationDetail>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let access = Reservations::new(&mut conn).get_access(id).await?.ok_or_else(|| not_found(id))?;
    if !can_read_reservation(&current_user, &access) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Reservations, Operation::ReadOwn),
                Permission::Allow(Resource::Reservations, Operation::ReadAll),
            ]),
            action: Operation::ReadOwn,
            resource: format!("reservation {id}"),
        });
    }

    Ok(Json(load_detail(&mut conn, id).await?))
}

#[utoipa::path(
    patch,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Edit reservation",
    description = "Diner-only. Supplied fields replace the stored ones and the status becomes EDITED. The pre-order \
                   is replaced by `preorder_items`; omitting it removes all items. Cancelled reservations cannot be \
                   edited. No table conflict check is made.",
    params(
        ("id" = uuid::Uuid, Path, description = "Reservation ID"),
    ),
    request_body = ReservationUpdate,
    responses(
        (status = 200, description = "Updated reservation", body = ReservationDetail),
        (status = 400, description = "Reservation is cancelled, or invalid fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - only the diner can edit"),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_reservation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ReservationId>,
    body: std::result::Result<Json<ReservationUpdate>, JsonRejection>,
) -> Result<Json<ReservationDetail>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Reservations::new(&mut tx);

    let access = repo.lock_access(id).await?.ok_or_else(|| not_found(id))?;
    if !can_edit_reservation(&current_user, &access) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Reservations, Operation::UpdateOwn),
            action: Operation::UpdateOwn,
            resource: format!("reservation {id}"),
        });
    }
    if access.status == ReservationStatus::Cancelled {
        return Err(Error::BadRequest {
            message: "Cancelled reservations cannot be edited".to_string(),
        });
    }

    let Json(update) = body?;
    if let Some(party_size) = update.party_size {
        check_party_size(party_size, &state.config.reservations)?;
    }
    if let Some(Some(table_id)) = update.table_id {
        if repo.table_restaurant(table_id).await? != Some(access.restaurant_id) {
            return Err(Error::BadRequest {
                message: format!("Table {table_id} does not belong to this restaurant"),
            });
        }
    }

    repo.update(id, &ReservationUpdateDBRequest::from(&update)).await?;
    let detail = load_detail(&mut tx, id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!("Reservation {} edited by diner", abbrev_uuid(&id));
    Ok(Json(detail))
}

/// Apply an owner status change, or say why it was ignored
async fn apply_status_change(
    state: &AppState,
    user: Result<CurrentUser>,
    id: std::result::Result<Path<ReservationId>, PathRejection>,
    form: std::result::Result<Form<StatusChangeForm>, FormRejection>,
) -> std::result::Result<(ReservationId, ReservationStatus), String> {
    let user = user.map_err(|e| format!("not authenticated: {e}"))?;
    let Path(id) = id.map_err(|e| format!("bad reservation id: {e}"))?;
    let Form(form) = form.map_err(|e| format!("bad form: {e}"))?;

    let status = form
        .status
        .as_deref()
        .and_then(ReservationStatus::owner_settable)
        .ok_or_else(|| format!("status {:?} cannot be set by an owner", form.status))?;

    if !user.is_owner() {
        return Err(format!("user {} is not an owner", abbrev_uuid(&user.id)));
    }

    let mut conn = state.db.acquire().await.map_err(|e| format!("database unavailable: {e}"))?;
    let mut repo = Reservations::new(&mut conn);

    let access = repo
        .get_access(id)
        .await
        .map_err(|e| format!("lookup failed: {e}"))?
        .ok_or_else(|| format!("reservation {} not found", abbrev_uuid(&id)))?;
    if !can_change_status(&user, &access) {
        return Err(format!("user {} does not own the restaurant", abbrev_uuid(&user.id)));
    }

    repo.set_status(id, status).await.map_err(|e| format!("update failed: {e}"))?;
    Ok((id, status))
}

#[utoipa::path(
    post,
    path = "/reservations/{id}/status",
    tag = "reservations",
    summary = "Change reservation status",
    description = "Owner action submitted as a form (`status=CONFIRMED|CANCELLED|EDITED`). The change is applied \
                   only when the caller owns the reservation's restaurant. The response is always a redirect back \
                   to the referring page; invalid or unauthorized submissions are ignored.",
    params(
        ("id" = uuid::Uuid, Path, description = "Reservation ID"),
    ),
    request_body(content = StatusChangeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the Referer header, or /"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_reservation_status(
    State(state): State<AppState>,
    user: Result<CurrentUser>,
    headers: HeaderMap,
    id: std::result::Result<Path<ReservationId>, PathRejection>,
    form: std::result::Result<Form<StatusChangeForm>, FormRejection>,
) -> Redirect {
    match apply_status_change(&state, user, id, form).await {
        Ok((id, status)) => info!("Reservation {} set to {:?} by owner", abbrev_uuid(&id), status),
        Err(reason) => debug!("Ignoring status change: {reason}"),
    }

    let target = headers.get(REFERER).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty()).unwrap_or("/");
    Redirect::to(target)
}

#[utoipa::path(
    get,
    path = "/me/reservations",
    tag = "reservations",
    summary = "List my reservations",
    description = "The caller's own reservations, latest start time first.",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Reservations", body = Vec<MyReservation>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_reservations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<Vec<MyReservation>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let filter = ReservationFilter::new(query.pagination.skip(), query.pagination.limit())
        .for_user(current_user.id)
        .with_status(query.status);
    let reservations = Reservations::new(&mut conn).list(&filter).await?;

    Ok(Json(reservations.into_iter().map(MyReservation::from).collect()))
}

#[utoipa::path(
    get,
    path = "/owner/restaurants/{slug}/reservations",
    tag = "reservations",
    summary = "List a restaurant's reservations",
    description = "Owner-only. Newest bookings first, each with the diner's email.",
    params(
        ("slug" = String, Path, description = "Restaurant slug"),
        ListReservationsQuery,
    ),
    responses(
        (status = 200, description = "Restaurant and its reservations", body = OwnerReservationsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - caller is not an owner"),
        (status = 404, description = "No such restaurant owned by the caller"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("CookieAuth" = []),
        ("ProxyHeader" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_restaurant_reservations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<OwnerReservationsResponse>> {
    require_owner(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let restaurant = Restaurants::new(&mut conn)
        .get_owned_by_slug(&slug, current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Restaurant".to_string(),
            id: slug.clone(),
        })?;

    let filter = ReservationFilter::new(query.pagination.skip(), query.pagination.limit())
        .for_restaurant(restaurant.id)
        .with_status(query.status);
    let reservations = Reservations::new(&mut conn).list(&filter).await?;

    Ok(Json(OwnerReservationsResponse {
        id: restaurant.id,
        name: restaurant.name,
        reservations: reservations.into_iter().map(OwnerReservation::from).collect(),
    }))
}
