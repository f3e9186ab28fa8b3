use axum::{
    Json,
    extract::{RawQuery, State},
    response::Response,
};
use serde::Serialize;

use super::{csv_response, load_rows, multi, query_pairs, single};
use crate::error::RecordsError;
use crate::middleware::RequireLogin;
use crate::router::AppState;
use crate::secrets::SheetKey;
use crate::service::csv_export::{WAR_RECORDS_FILENAME, to_csv};
use crate::service::records::{self, Analysis, RecordFilter};
use crate::types::WarRecordRow;

#[derive(Serialize)]
pub struct WarRecordList {
    pub count: usize,
    pub records: Vec<WarRecordRow>,
}

#[derive(Serialize)]
pub struct DeckCatalog {
    pub seasons: Vec<String>,
    pub environments: Vec<String>,
    pub decks: Vec<String>,
    /// Types seen for `?deck=`, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_types: Option<Vec<String>>,
}

fn record_filter(pairs: &[(String, String)]) -> RecordFilter {
    RecordFilter {
        season: single(pairs, "season"),
        environments: multi(pairs, "environment"),
    }
}

/// GET /war-records -> every record, newest first.
pub async fn list(
    _: RequireLogin,
    State(state): State<AppState>,
) -> Result<Json<WarRecordList>, RecordsError> {
    let rows = load_rows::<WarRecordRow>(&state, SheetKey::WarRecord).await?;
    let records = records::sort_for_display(rows);
    Ok(Json(WarRecordList {
        count: records.len(),
        records,
    }))
}

/// GET /war-records.csv -> the sheet as stored, BOM-prefixed.
pub async fn export_csv(
    _: RequireLogin,
    State(state): State<AppState>,
) -> Result<Response, RecordsError> {
    let rows = load_rows::<WarRecordRow>(&state, SheetKey::WarRecord).await?;
    Ok(csv_response(WAR_RECORDS_FILENAME, to_csv(&rows)?))
}

/// GET /war-records/decks -> filter options and deck names under the filter.
pub async fn decks(
    _: RequireLogin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<DeckCatalog>, RecordsError> {
    let pairs = query_pairs(raw.as_deref());
    let rows = load_rows::<WarRecordRow>(&state, SheetKey::WarRecord).await?;
    let filtered = record_filter(&pairs).apply(&rows);
    Ok(Json(DeckCatalog {
        seasons: records::seasons(&rows),
        environments: records::environments(&rows),
        decks: records::deck_names(&filtered),
        deck_types: single(&pairs, "deck").map(|deck| records::deck_types(&filtered, &deck)),
    }))
}

/// GET /war-records/analysis?season=&environment=&deck=&deck_type=
pub async fn analysis(
    _: RequireLogin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Analysis>, RecordsError> {
    let pairs = query_pairs(raw.as_deref());
    let rows = load_rows::<WarRecordRow>(&state, SheetKey::WarRecord).await?;
    let deck = single(&pairs, "deck");
    let deck_type = single(&pairs, "deck_type");
    Ok(Json(records::analyze(
        &rows,
        &record_filter(&pairs),
        deck.as_deref(),
        deck_type.as_deref(),
    )))
}
