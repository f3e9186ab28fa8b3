//! HTTP handlers. Every data route takes `RequireLogin` first so an
//! unauthenticated request never reaches the Sheets API.

pub mod players;
pub mod session;
pub mod war_records;

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::error::RecordsError;
use crate::google_oauth::AuthorizedSession;
use crate::router::AppState;
use crate::secrets::SheetKey;
use crate::types::SheetRow;

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let configured: Vec<&str> = state
        .secrets
        .spreadsheets
        .configured()
        .into_iter()
        .map(SheetKey::as_str)
        .collect();
    Json(json!({ "status": "ok", "spreadsheets": configured }))
}

/// Resolve the spreadsheet id, then authenticate. An unset id fails before
/// any call to Google.
async fn open_spreadsheet(
    state: &AppState,
    key: SheetKey,
) -> Result<(String, AuthorizedSession), RecordsError> {
    let id = state
        .secrets
        .spreadsheets
        .get(key)
        .inspect_err(|e| warn!(sheet_key = %key, error = %e, "spreadsheet id unset"))?
        .to_string();
    let session = state.sessions.session().await?;
    Ok((id, session))
}

async fn load_rows<T: SheetRow>(state: &AppState, key: SheetKey) -> Result<Vec<T>, RecordsError> {
    let (id, session) = open_spreadsheet(state, key).await?;
    state.reader.fetch_rows::<T>(&session, &id, T::SHEET_NAME).await
}

/// Raw query string into ordered pairs; repeated keys are kept.
fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|qs| {
        url::form_urlencoded::parse(qs.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

/// Last non-blank value of `key`.
fn single(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}

/// Every non-blank value of `key`, in order.
fn multi(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .collect()
}

fn wants_csv(pairs: &[(String, String)]) -> bool {
    single(pairs, "format").is_some_and(|f| f.eq_ignore_ascii_case("csv"))
}

fn csv_response(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
