//! Database repository for reservations and their pre-order lines.

use crate::api::models::reservations::ReservationStatus;
use crate::config::ConflictCheck;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::reservations::{
        ConflictWindow, PreorderItemDBRequest, PreorderItemDBResponse, ReservationAccess, ReservationCreateDBRequest,
        ReservationDBResponse, ReservationUpdateDBRequest,
    },
};
use crate::types::{ReservationId, RestaurantId, TableId, UserId, abbrev_uuid};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

const SELECT_RESERVATION: &str = r#"
    SELECT r.id, r.restaurant_id, r.user_id, r.table_id, r.start_time, r.duration_minutes,
           r.party_size, r.special_requests, r.status, r.created_at, r.updated_at,
           rs.name AS restaurant_name, rs.slug AS restaurant_slug, u.email AS user_email
    FROM reservations r
    JOIN restaurants rs ON rs.id = r.restaurant_id
    JOIN users u ON u.id = r.user_id
"#;

const SELECT_ACCESS: &str = r#"
    SELECT r.id AS reservation_id, r.user_id AS diner_id, r.restaurant_id, rs.owner_id, r.status
    FROM reservations r
    JOIN restaurants rs ON rs.id = r.restaurant_id
    WHERE r.id = $1
"#;

/// Sort order for reservation listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReservationOrder {
    /// Soonest-last, used for a diner's own bookings
    #[default]
    StartTimeDesc,
    /// Newest-first, used for an owner's inbox
    CreatedAtDesc,
}

impl ReservationOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            ReservationOrder::StartTimeDesc => "r.start_time DESC, r.id",
            ReservationOrder::CreatedAtDesc => "r.created_at DESC, r.id",
        }
    }
}

/// Filter for listing reservations
#[derive(Debug, Clone)]
pub struct ReservationFilter {
    pub user_id: Option<UserId>,
    pub restaurant_id: Option<RestaurantId>,
    pub status: Option<ReservationStatus>,
    pub order: ReservationOrder,
    pub skip: i64,
    pub limit: i64,
}

impl ReservationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            user_id: None,
            restaurant_id: None,
            status: None,
            order: ReservationOrder::default(),
            skip,
            limit,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self.order = ReservationOrder::StartTimeDesc;
        self
    }

    pub fn for_restaurant(mut self, restaurant_id: RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self.order = ReservationOrder::CreatedAtDesc;
        self
    }

    pub fn with_status(mut self, status: Option<ReservationStatus>) -> Self {
        self.status = status;
        self
    }
}

pub struct Reservations<'c> {
    db: &'c mut PgConnection,
}

async fn fetch_reservation(conn: &mut PgConnection, id: ReservationId) -> Result<Option<ReservationDBResponse>> {
    let query = format!("{SELECT_RESERVATION} WHERE r.id = $1");
    let reservation = sqlx::query_as::<_, ReservationDBResponse>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(reservation)
}

async fn insert_preorder_items(conn: &mut PgConnection, reservation_id: ReservationId, items: &[PreorderItemDBRequest]) -> Result<()> {
    for item in items {
        sqlx::query("INSERT INTO preorder_items (reservation_id, menu_item_id, quantity, note) VALUES ($1, $2, $3, $4)")
            .bind(reservation_id)
            .bind(item.menu_item_id)
            .bind(item.quantity.max(1))
            .bind(&item.note)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl<'c> Repository for Reservations<'c> {
    type CreateRequest = ReservationCreateDBRequest;
    type UpdateRequest = ReservationUpdateDBRequest;
    type Response = ReservationDBResponse;
    type Id = ReservationId;
    type Filter = ReservationFilter;

    /// Insert a PENDING reservation and its pre-order lines atomically. Does not check for
    /// table conflicts; see [`Reservations::lock_table`] and [`Reservations::find_conflict`].
    #[instrument(skip(self, request), fields(restaurant_id = %abbrev_uuid(&request.restaurant_id), items = request.preorder_items.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let id: ReservationId = sqlx::query_scalar(
            r#"
            INSERT INTO reservations
                (restaurant_id, user_id, table_id, start_time, duration_minutes, party_size, special_requests, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(request.restaurant_id)
        .bind(request.user_id)
        .bind(request.table_id)
        .bind(request.start_time)
        .bind(request.duration_minutes)
        .bind(request.party_size)
        .bind(&request.special_requests)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        insert_preorder_items(&mut tx, id, &request.preorder_items).await?;

        let reservation = fetch_reservation(&mut tx, id).await?.ok_or(DbError::NotFound)?;
        tx.commit().await?;

        Ok(reservation)
    }

    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        fetch_reservation(&mut *self.db, id).await
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"{SELECT_RESERVATION}
            WHERE ($1::uuid IS NULL OR r.user_id = $1)
              AND ($2::uuid IS NULL OR r.restaurant_id = $2)
              AND ($3::reservation_status IS NULL OR r.status = $3)
            ORDER BY {}
            LIMIT $4 OFFSET $5"#,
            filter.order.as_sql()
        );

        let reservations = sqlx::query_as::<_, ReservationDBResponse>(&query)
            .bind(filter.user_id)
            .bind(filter.restaurant_id)
            .bind(filter.status)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(reservations)
    }

    /// Apply a diner edit: supplied fields overwrite, status becomes EDITED, and the
    /// pre-order is replaced wholesale.
    #[instrument(skip(self, request), fields(reservation_id = %abbrev_uuid(&id), items = request.preorder_items.len()), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, ReservationId>(
            r#"
            UPDATE reservations SET
                start_time = COALESCE($2, start_time),
                party_size = COALESCE($3, party_size),
                table_id = CASE WHEN $4 THEN $5 ELSE table_id END,
                special_requests = CASE WHEN $6 THEN $7 ELSE special_requests END,
                status = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(request.start_time)
        .bind(request.party_size)
        .bind(request.table_id.is_some())
        .bind(request.table_id.flatten())
        .bind(request.special_requests.is_some())
        .bind(request.special_requests.clone().flatten())
        .bind(ReservationStatus::Edited)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        sqlx::query("DELETE FROM preorder_items WHERE reservation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_preorder_items(&mut tx, id, &request.preorder_items).await?;

        let reservation = fetch_reservation(&mut tx, id).await?.ok_or(DbError::NotFound)?;
        tx.commit().await?;

        Ok(reservation)
    }
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Lock a dining table row for the rest of the enclosing transaction and return the
    /// restaurant it belongs to. Concurrent bookings of the same table queue here.
    #[instrument(skip(self), fields(table_id = %abbrev_uuid(&table_id)), err)]
    pub async fn lock_table(&mut self, table_id: TableId) -> Result<Option<RestaurantId>> {
        let restaurant_id = sqlx::query_scalar::<_, RestaurantId>("SELECT restaurant_id FROM dining_tables WHERE id = $1 FOR UPDATE")
            .bind(table_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(restaurant_id)
    }

    /// The restaurant a dining table belongs to, without locking
    #[instrument(skip(self), fields(table_id = %abbrev_uuid(&table_id)), err)]
    pub async fn table_restaurant(&mut self, table_id: TableId) -> Result<Option<RestaurantId>> {
        let restaurant_id = sqlx::query_scalar::<_, RestaurantId>("SELECT restaurant_id FROM dining_tables WHERE id = $1")
            .bind(table_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(restaurant_id)
    }

    /// Find an active reservation on the window's table that collides with it.
    ///
    /// Fails if the window's bounds fall outside the representable date range; callers
    /// should reject such windows before reaching the database.
    #[instrument(skip(self, window), fields(table_id = %abbrev_uuid(&window.table_id), mode = ?window.mode), err)]
    pub async fn find_conflict(&mut self, window: &ConflictWindow) -> Result<Option<ReservationId>> {
        let (lower, upper) = window
            .bounds()
            .ok_or_else(|| DbError::Other(anyhow::anyhow!("Conflict window out of range")))?;
        let active = ReservationStatus::ACTIVE;

        let conflict = match window.mode {
            ConflictCheck::Approximate => {
                sqlx::query_scalar::<_, ReservationId>(
                    r#"
                    SELECT id FROM reservations
                    WHERE table_id = $1
                      AND status = ANY($4)
                      AND start_time > $2
                      AND start_time < $3
                    LIMIT 1
                    "#,
                )
                .bind(window.table_id)
                .bind(lower)
                .bind(upper)
                .bind(&active[..])
                .fetch_optional(&mut *self.db)
                .await?
            }
            ConflictCheck::Interval => {
                sqlx::query_scalar::<_, ReservationId>(
                    r#"
                    SELECT id FROM reservations
                    WHERE table_id = $1
                      AND status = ANY($4)
                      AND start_time < $3
                      AND start_time + make_interval(mins => duration_minutes) > $2
                    LIMIT 1
                    "#,
                )
                .bind(window.table_id)
                .bind(lower)
                .bind(upper)
                .bind(&active[..])
                .fetch_optional(&mut *self.db)
                .await?
            }
        };

        Ok(conflict)
    }

    /// Resolve who booked a reservation and who owns its restaurant
    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    pub async fn get_access(&mut self, id: ReservationId) -> Result<Option<ReservationAccess>> {
        let access = sqlx::query_as::<_, ReservationAccess>(SELECT_ACCESS)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(access)
    }

    /// As [`Reservations::get_access`], additionally locking the reservation row until the
    /// enclosing transaction ends
    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_access(&mut self, id: ReservationId) -> Result<Option<ReservationAccess>> {
        let query = format!("{SELECT_ACCESS} FOR UPDATE OF r");
        let access = sqlx::query_as::<_, ReservationAccess>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(access)
    }

    /// Pre-order lines with their menu items
    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    pub async fn get_preorder_items(&mut self, id: ReservationId) -> Result<Vec<PreorderItemDBResponse>> {
        let items = sqlx::query_as::<_, PreorderItemDBResponse>(
            r#"
            SELECT p.id, p.reservation_id, p.menu_item_id, p.quantity, p.note,
                   mi.name AS menu_item_name, mi.description AS menu_item_description,
                   mi.price_cents AS menu_item_price_cents
            FROM preorder_items p
            JOIN menu_items mi ON mi.id = p.menu_item_id
            WHERE p.reservation_id = $1
            ORDER BY mi.name ASC, p.id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items)
    }

    /// Overwrite the status. Returns false if the reservation does not exist.
    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id), status = ?status), err)]
    pub async fn set_status(&mut self, id: ReservationId, status: ReservationStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE reservations SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{TestRestaurant, create_test_restaurant, create_test_user};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    fn seven_pm() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 19, 0, 0).unwrap()
    }

    fn booking(user_id: UserId, restaurant: &TestRestaurant, table_id: Option<TableId>, start_time: DateTime<Utc>) -> ReservationCreateDBRequest {
        ReservationCreateDBRequest {
            user_id,
            restaurant_id: restaurant.id,
            table_id,
            start_time,
            duration_minutes: 90,
            party_size: 2,
            special_requests: None,
            preorder_items: vec![],
        }
    }

    fn window(table_id: TableId, start_time: DateTime<Utc>, mode: ConflictCheck) -> ConflictWindow {
        ConflictWindow {
            table_id,
            start_time,
            duration_minutes: 90,
            mode,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_stores_pending_with_preorder(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let mut request = booking(diner.id, &restaurant, Some(restaurant.tables[0]), seven_pm());
        request.preorder_items = vec![
            PreorderItemDBRequest {
                menu_item_id: restaurant.menu_items[0],
                quantity: 2,
                note: Some("no garlic".to_string()),
            },
            PreorderItemDBRequest {
                menu_item_id: restaurant.menu_items[1],
                quantity: 1,
                note: None,
            },
        ];

        let created = repo.create(&request).await.unwrap();
        assert_eq!(created.status, ReservationStatus::Pending);
        assert_eq!(created.table_id, Some(restaurant.tables[0]));
        assert_eq!(created.user_email, diner.email);
        assert_eq!(created.restaurant_slug, "osteria");

        let items = repo.get_preorder_items(created.id).await.unwrap();
        assert_eq!(items.len(), 2);
        let noted = items.iter().find(|i| i.menu_item_id == restaurant.menu_items[0]).unwrap();
        assert_eq!(noted.quantity, 2);
        assert_eq!(noted.note.as_deref(), Some("no garlic"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_menu_item_rolls_back(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let mut request = booking(diner.id, &restaurant, None, seven_pm());
        request.preorder_items = vec![PreorderItemDBRequest {
            menu_item_id: Uuid::new_v4(),
            quantity: 1,
            note: None,
        }];

        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let remaining = repo.list(&ReservationFilter::new(0, 10).for_user(diner.id)).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_approximate_conflict_window(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;
        let table = restaurant.tables[0];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        let existing = repo.create(&booking(diner.id, &restaurant, Some(table), seven_pm())).await.unwrap();

        // 19:30 lies inside (17:30, 20:30)
        let clash = repo
            .find_conflict(&window(table, seven_pm() + Duration::minutes(30), ConflictCheck::Approximate))
            .await
            .unwrap();
        assert_eq!(clash, Some(existing.id));

        // Exactly one duration later is on the open boundary
        let boundary = repo
            .find_conflict(&window(table, seven_pm() + Duration::minutes(90), ConflictCheck::Approximate))
            .await
            .unwrap();
        assert_eq!(boundary, None);

        // Other tables are unaffected
        let other_table = repo
            .find_conflict(&window(restaurant.tables[1], seven_pm(), ConflictCheck::Approximate))
            .await
            .unwrap();
        assert_eq!(other_table, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_reservations_do_not_conflict(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;
        let table = restaurant.tables[0];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let cancelled = repo.create(&booking(diner.id, &restaurant, Some(table), seven_pm())).await.unwrap();
        assert!(repo.set_status(cancelled.id, ReservationStatus::Cancelled).await.unwrap());

        let edited = repo
            .create(&booking(diner.id, &restaurant, Some(table), seven_pm() + Duration::minutes(15)))
            .await
            .unwrap();
        assert!(repo.set_status(edited.id, ReservationStatus::Edited).await.unwrap());

        let conflict = repo
            .find_conflict(&window(table, seven_pm(), ConflictCheck::Approximate))
            .await
            .unwrap();
        assert_eq!(conflict, None);

        // Confirmed bookings still hold the table
        let confirmed = repo
            .create(&booking(diner.id, &restaurant, Some(table), seven_pm() + Duration::minutes(60)))
            .await
            .unwrap();
        assert!(repo.set_status(confirmed.id, ReservationStatus::Confirmed).await.unwrap());
        let conflict = repo
            .find_conflict(&window(table, seven_pm(), ConflictCheck::Approximate))
            .await
            .unwrap();
        assert_eq!(conflict, Some(confirmed.id));
        let conflict = repo
            .find_conflict(&window(table, seven_pm(), ConflictCheck::Interval))
            .await
            .unwrap();
        assert_eq!(conflict, Some(confirmed.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_conflict_rejects_unrepresentable_window(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let far_future = ConflictWindow {
            duration_minutes: i32::MAX,
            ..window(restaurant.tables[0], "+262000-01-01T00:00:00Z".parse().unwrap(), ConflictCheck::Approximate)
        };
        assert!(matches!(repo.find_conflict(&far_future).await, Err(DbError::Other(_))));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_interval_conflict_accepts_back_to_back(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;
        let table = restaurant.tables[0];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        let existing = repo.create(&booking(diner.id, &restaurant, Some(table), seven_pm())).await.unwrap();

        let overlapping = repo
            .find_conflict(&window(table, seven_pm() + Duration::minutes(45), ConflictCheck::Interval))
            .await
            .unwrap();
        assert_eq!(overlapping, Some(existing.id));

        let before = repo
            .find_conflict(&window(table, seven_pm() - Duration::minutes(90), ConflictCheck::Interval))
            .await
            .unwrap();
        assert_eq!(before, None);

        let after = repo
            .find_conflict(&window(table, seven_pm() + Duration::minutes(90), ConflictCheck::Interval))
            .await
            .unwrap();
        assert_eq!(after, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_marks_edited_and_replaces_preorder(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let mut request = booking(diner.id, &restaurant, Some(restaurant.tables[0]), seven_pm());
        request.special_requests = Some("window seat".to_string());
        request.preorder_items = vec![PreorderItemDBRequest {
            menu_item_id: restaurant.menu_items[0],
            quantity: 1,
            note: None,
        }];
        let created = repo.create(&request).await.unwrap();

        let update = ReservationUpdateDBRequest {
            party_size: Some(4),
            table_id: Some(None),
            preorder_items: vec![PreorderItemDBRequest {
                menu_item_id: restaurant.menu_items[1],
                quantity: 3,
                note: None,
            }],
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.status, ReservationStatus::Edited);
        assert_eq!(updated.party_size, 4);
        assert_eq!(updated.table_id, None);
        assert_eq!(updated.start_time, created.start_time);
        assert_eq!(updated.special_requests.as_deref(), Some("window seat"));

        let items = repo.get_preorder_items(created.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].menu_item_id, restaurant.menu_items[1]);
        assert_eq!(items[0].quantity, 3);

        // An edit with no items clears the pre-order
        let cleared = repo.update(created.id, &ReservationUpdateDBRequest::default()).await.unwrap();
        assert_eq!(cleared.party_size, 4);
        assert!(repo.get_preorder_items(created.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_reservation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let err = repo.update(Uuid::new_v4(), &ReservationUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
        assert!(!repo.set_status(Uuid::new_v4(), ReservationStatus::Confirmed).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_access_and_table_lookups(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut tx = pool.begin().await.unwrap();
        let mut repo = Reservations::new(&mut tx);

        let created = repo.create(&booking(diner.id, &restaurant, None, seven_pm())).await.unwrap();

        let access = repo.lock_access(created.id).await.unwrap().unwrap();
        assert_eq!(access.diner_id, diner.id);
        assert_eq!(access.owner_id, owner.id);
        assert_eq!(access.restaurant_id, restaurant.id);
        assert_eq!(access.status, ReservationStatus::Pending);
        assert!(repo.get_access(Uuid::new_v4()).await.unwrap().is_none());

        assert_eq!(repo.lock_table(restaurant.tables[0]).await.unwrap(), Some(restaurant.id));
        assert_eq!(repo.table_restaurant(restaurant.tables[1]).await.unwrap(), Some(restaurant.id));
        assert_eq!(repo.lock_table(Uuid::new_v4()).await.unwrap(), None);

        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_orders(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Owner).await;
        let diner = create_test_user(&pool, Role::Client).await;
        let other_diner = create_test_user(&pool, Role::Client).await;
        let restaurant = create_test_restaurant(&pool, owner.id, "osteria").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let early = repo.create(&booking(diner.id, &restaurant, None, seven_pm())).await.unwrap();
        let late = repo
            .create(&booking(diner.id, &restaurant, None, seven_pm() + Duration::days(1)))
            .await
            .unwrap();
        let others = repo.create(&booking(other_diner.id, &restaurant, None, seven_pm())).await.unwrap();
        repo.set_status(others.id, ReservationStatus::Confirmed).await.unwrap();

        let mine = repo.list(&ReservationFilter::new(0, 50).for_user(diner.id)).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);

        let inbox = repo
            .list(&ReservationFilter::new(0, 50).for_restaurant(restaurant.id))
            .await
            .unwrap();
        assert_eq!(inbox.len(), 3);
        assert!(inbox.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let confirmed = repo
            .list(
                &ReservationFilter::new(0, 50)
                    .for_restaurant(restaurant.id)
                    .with_status(Some(ReservationStatus::Confirmed)),
            )
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].user_email, other_diner.email);

        let paged = repo.list(&ReservationFilter::new(1, 1).for_user(diner.id)).await.unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, early.id);
    }
}
