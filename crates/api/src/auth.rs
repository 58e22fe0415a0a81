//! Session cookie handling and request extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use db::models::UserRow;

use crate::error::ApiError;
use crate::state::{AppState, WebConfig};

/// Name of the one-shot cookie carrying a login failure notice.
pub const FLASH_COOKIE: &str = "choreboard_flash";

/// The logged-in user, if any.
pub struct MaybeUser(pub Option<UserRow>);

/// A logged-in staff member. Rejects with a redirect to `/login` when there
/// is no session and with 403 for non-staff.
pub struct StaffUser(pub UserRow);

pub fn session_token<'a>(jar: &'a CookieJar, web: &WebConfig) -> Option<&'a str> {
    jar.get(&web.cookie_name).map(Cookie::value)
}

pub fn session_cookie(web: &WebConfig, token: String) -> Cookie<'static> {
    Cookie::build((web.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(web.secure_cookies)
        .build()
}

pub fn expired_session_cookie(web: &WebConfig) -> Cookie<'static> {
    Cookie::build(web.cookie_name.clone()).path("/").build()
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = session_token(&jar, &state.web) else {
            return Ok(Self(None));
        };
        Ok(Self(state.users.resolve_session(token, Utc::now()).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await?.0 {
            None => Err(ApiError::Unauthenticated),
            Some(user) if !user.is_staff => Err(ApiError::Forbidden),
            Some(user) => Ok(Self(user)),
        }
    }
}
