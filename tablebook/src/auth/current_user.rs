use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::session,
    config::Config,
    db::{errors::DbError, handlers::Users, models::users::UserCreateDBRequest},
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Session cookie present but invalid, forged or expired
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    let mut last_error = None;
    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name != cookie_name {
                continue;
            }
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                Err(e) => last_error = Some(e),
            }
        }
    }
    last_error.map(Err)
}

/// Extract user from proxy header if present and valid
/// Returns:
/// - None: No proxy header present, or the user is unknown and auto-creation is off
/// - Some(Ok(user)): Known (or newly created) user
/// - Some(Err(error)): Lookup or creation failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(parts: &Parts, config: &Config, db: &PgPool) -> Option<Result<CurrentUser>> {
    let user_email = parts
        .headers
        .get(&config.auth.proxy_header.header_name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())?;

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };
    let mut user_repo = Users::new(&mut conn);

    match user_repo.get_user_by_email(user_email).await {
        Ok(Some(user)) => Some(Ok(CurrentUser::from(user))),
        Ok(None) if config.auth.proxy_header.auto_create_users => {
            let create_request = UserCreateDBRequest {
                email: user_email.to_string(),
                display_name: None,
                role: Role::Client,
                auth_source: "proxy-header".to_string(),
            };
            Some(user_repo.create(&create_request).await.map(CurrentUser::from).map_err(Error::Database))
        }
        Ok(None) => None,
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Each method returns Option<Result<CurrentUser>>:
        // - None means the method is not applicable (no credentials present)
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means credentials were present but invalid
        // The first successful method wins.

        let mut auth_errors = Vec::new();

        if state.config.auth.session.enabled {
            match try_jwt_session_auth(parts, &state.config) {
                Some(Ok(user)) => {
                    debug!("Found JWT session authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("JWT session authentication failed: {:?}", e);
                    auth_errors.push(("JWT session", e));
                }
                None => trace!("No JWT session authentication attempted"),
            }
        }

        if state.config.auth.proxy_header.enabled {
            match try_proxy_header_auth(parts, &state.config, &state.db).await {
                Some(Ok(user)) => {
                    debug!("Found proxy header authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("Proxy header authentication failed: {:?}", e);
                    auth_errors.push(("Proxy header", e));
                }
                None => trace!("No proxy header authentication attempted"),
            }
        }

        // Database failures during lookup are not the caller's fault
        if let Some(pos) = auth_errors.iter().position(|(_, e)| matches!(e, Error::Database(_))) {
            return Err(auth_errors.swap_remove(pos).1);
        }

        trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState,
        api::models::users::{CurrentUser, Role},
        auth::session::create_session_token,
        db::handlers::Users,
        test_utils::{create_test_config, create_test_user},
    };
    use axum::{
        extract::FromRequestParts as _,
        http::{StatusCode, request::Parts},
    };
    use sqlx::PgPool;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    fn proxy_state(pool: &PgPool) -> AppState {
        let mut config = create_test_config();
        config.auth.proxy_header.enabled = true;
        AppState::builder().db(pool.clone()).config(config).build()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_cookie_extraction(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();
        let owner: CurrentUser = create_test_user(&pool, Role::Owner).await.into();
        let token = create_session_token(&owner, &state.config).unwrap();

        let cookie = format!("theme=dark; {}={token}", state.config.auth.session.cookie_name);
        let mut parts = parts_with_header("cookie", &cookie);

        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, owner.id);
        assert_eq!(user.role, Role::Owner);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_session_cookie_is_unauthorized(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();

        let cookie = format!("{}=garbage", state.config.auth.session.cookie_name);
        let mut parts = parts_with_header("cookie", &cookie);

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_existing_user_via_proxy_header(pool: PgPool) {
        let state = proxy_state(&pool);
        let owner = create_test_user(&pool, Role::Owner).await;

        let mut parts = parts_with_header(&state.config.auth.proxy_header.header_name, &owner.email);

        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, owner.id);
        assert_eq!(user.role, Role::Owner);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_auto_create_diner_via_proxy_header(pool: PgPool) {
        let state = proxy_state(&pool);
        let new_email = "walkin@example.com";

        let mut parts = parts_with_header(&state.config.auth.proxy_header.header_name, new_email);
        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.email, new_email);
        assert_eq!(user.role, Role::Client);

        let mut conn = pool.acquire().await.unwrap();
        let db_user = Users::new(&mut conn).get_user_by_email(new_email).await.unwrap().unwrap();
        assert_eq!(db_user.auth_source, "proxy-header");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_proxy_user_without_auto_create(pool: PgPool) {
        let mut state = proxy_state(&pool);
        state.config.auth.proxy_header.auto_create_users = false;

        let mut parts = parts_with_header(&state.config.auth.proxy_header.header_name, "stranger@example.com");
        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_credentials_returns_unauthorized(pool: PgPool) {
        let state = proxy_state(&pool);

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }
}
