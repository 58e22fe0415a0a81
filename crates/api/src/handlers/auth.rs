//! Staff login and logout.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use engine::EngineError;

use crate::auth::{expired_session_cookie, session_cookie, session_token, MaybeUser, FLASH_COOKIE};
use crate::error::ApiError;
use crate::handlers::{found, render};
use crate::state::AppState;
use crate::templates::LoginTemplate;

const BAD_LOGIN: &str = "bad_login";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login page. Shows, then clears, the flash left by a failed attempt.
pub async fn login_page(jar: CookieJar) -> Result<(CookieJar, Response), ApiError> {
    let error = match jar.get(FLASH_COOKIE).map(Cookie::value) {
        Some(BAD_LOGIN) => "Invalid username or password.".to_owned(),
        _ => String::new(),
    };
    let page = render(LoginTemplate { error })?;
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    Ok((jar, page.into_response()))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Response), ApiError> {
    let ttl = state.web.session_ttl();
    match state.users.login(&form.username, &form.password, ttl, Utc::now()).await {
        Ok((user, session)) => {
            let jar = jar
                .add(session_cookie(&state.web, session.token))
                .remove(Cookie::build(FLASH_COOKIE).path("/"));
            let target = if user.is_staff { "/admin" } else { "/" };
            Ok((jar, found(target)))
        }
        Err(EngineError::InvalidCredentials) => {
            let flash = Cookie::build((FLASH_COOKIE, BAD_LOGIN)).path("/").http_only(true);
            Ok((jar.add(flash), found("/login")))
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Response), ApiError> {
    if let (Some(token), Some(user)) = (session_token(&jar, &state.web), user.as_ref()) {
        state.users.logout(token, user).await?;
        info!(user = %user.username, "logged out");
    }
    let jar = jar.remove(expired_session_cookie(&state.web));
    Ok((jar, found("/")))
}
