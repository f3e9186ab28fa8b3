use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::{info, warn};

use crate::error::RecordsError;
use crate::middleware::AUTH_COOKIE;
use crate::router::AppState;

const LOGIN_COOKIE_DAYS: i64 = 365;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// POST /login -> stores the password in an encrypted cookie when it matches.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, RecordsError> {
    let expected = state.secrets.app.password.as_bytes();
    if !bool::from(req.password.as_bytes().ct_eq(expected)) {
        warn!("login rejected");
        return Err(RecordsError::InvalidPassword);
    }

    info!("login accepted");
    let jar = jar.add(build_cookie(
        AUTH_COOKIE,
        req.password,
        !state.insecure_cookie,
    ));
    Ok((jar, Json(json!({ "status": "ok" }))))
}

/// POST /logout -> drops the login cookie.
pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = jar.remove(clear_cookie(AUTH_COOKIE, !state.insecure_cookie));
    (jar, Json(json!({ "status": "ok" })))
}

fn build_cookie(name: &str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(LOGIN_COOKIE_DAYS))
        .build()
}

fn clear_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}
