use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::RecordsError;
use crate::router::AppState;

/// Name of the encrypted cookie holding the login password.
pub const AUTH_COOKIE: &str = "auth_password";

/// Accept the request only when the session cookie decrypts to the current
/// password. Cookies sealed under another key never decrypt and count as absent.
pub fn ensure_logged_in(jar: &PrivateCookieJar, password: &str) -> Result<(), RecordsError> {
    let Some(cookie) = jar.get(AUTH_COOKIE) else {
        debug!("request without login cookie");
        return Err(RecordsError::Unauthorized);
    };
    if bool::from(cookie.value().as_bytes().ct_eq(password.as_bytes())) {
        Ok(())
    } else {
        debug!("login cookie does not match the current password");
        Err(RecordsError::Unauthorized)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireLogin;

impl FromRequestParts<AppState> for RequireLogin {
    type Rejection = RecordsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        ensure_logged_in(&jar, &state.secrets.app.password)?;
        Ok(Self)
    }
}
