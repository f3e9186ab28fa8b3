use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use super::{csv_response, load_rows, multi, open_spreadsheet, query_pairs, single, wants_csv};
use crate::error::RecordsError;
use crate::middleware::RequireLogin;
use crate::router::AppState;
use crate::secrets::SheetKey;
use crate::service::csv_export::{timestamped_filename, to_csv};
use crate::service::players::{
    ColumnSummary, column_filter, column_summary, keyword_search, merge_results,
    roster_as_merged, twitter_link,
};
use crate::types::{MergedRow, PlayerKeyed, PlayerResultRow, PlayerRow, SheetRow, Tabular};

pub const NO_DATA_NOTICE: &str = "データがありません。スプレッドシートを確認してください。";
pub const NO_PLAYERS_NOTICE: &str = "選手一覧データがありません";
pub const NO_RESULTS_NOTICE: &str = "戦績データがありません";

/// A row plus the profile link built from its TwitterID.
#[derive(Serialize)]
pub struct WithLink<T> {
    #[serde(flatten)]
    pub row: T,
    pub twitter_url: String,
}

#[derive(Serialize)]
pub struct RowList<T> {
    pub count: usize,
    pub rows: Vec<T>,
    pub summary: Vec<ColumnSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

/// Keyword search and per-column filters, from the query string.
///
/// Column filters come as `filter=<column>:<value>` pairs, or as one
/// `column=` with any number of `value=`.
struct ListQuery {
    keyword: Option<String>,
    filters: Vec<(String, String)>,
    csv: bool,
}

impl ListQuery {
    fn parse(raw: Option<&str>) -> Self {
        let pairs = query_pairs(raw);
        let mut filters: Vec<(String, String)> = multi(&pairs, "filter")
            .into_iter()
            .filter_map(|f| {
                let (column, value) = f.split_once(':')?;
                Some((column.trim().to_string(), value.trim().to_string()))
            })
            .collect();
        if let Some(column) = single(&pairs, "column") {
            filters.extend(multi(&pairs, "value").into_iter().map(|v| (column.clone(), v)));
        }
        Self {
            keyword: single(&pairs, "q"),
            filters,
            csv: wants_csv(&pairs),
        }
    }

    fn apply<T>(&self, rows: &[T], players: &[PlayerRow]) -> Vec<T>
    where
        T: Tabular + PlayerKeyed + Clone,
    {
        let rows = match &self.keyword {
            Some(term) => keyword_search(rows, players, term),
            None => rows.to_vec(),
        };
        let pairs: Vec<(&str, &str)> = self
            .filters
            .iter()
            .map(|(c, v)| (c.as_str(), v.as_str()))
            .collect();
        column_filter(&rows, &pairs)
    }
}

/// Both worksheets of the player spreadsheet. A worksheet that cannot be
/// read is `None` as long as the other one loaded.
struct PlayerData {
    roster: Option<Vec<PlayerRow>>,
    results: Option<Vec<PlayerResultRow>>,
}

fn readable<T>(
    sheet: &str,
    fetched: Result<Vec<T>, RecordsError>,
) -> Result<Option<Vec<T>>, RecordsError> {
    match fetched {
        Ok(rows) => Ok(Some(rows)),
        Err(e) if e.is_sheet_unreadable() => {
            warn!(sheet, error = %e, "continuing without worksheet");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Roster and results come from the same spreadsheet; one session serves both.
async fn load_player_data(state: &AppState) -> Result<PlayerData, RecordsError> {
    let (id, session) = open_spreadsheet(state, SheetKey::PlayerData).await?;
    let (roster, results) = futures::join!(
        state
            .reader
            .fetch_rows::<PlayerRow>(&session, &id, PlayerRow::SHEET_NAME),
        state
            .reader
            .fetch_rows::<PlayerResultRow>(&session, &id, PlayerResultRow::SHEET_NAME),
    );
    match (roster, results) {
        (Err(e), Err(_)) => Err(e),
        (roster, results) => Ok(PlayerData {
            roster: readable(PlayerRow::SHEET_NAME, roster)?,
            results: readable(PlayerResultRow::SHEET_NAME, results)?,
        }),
    }
}

fn respond<T, V>(
    query: &ListQuery,
    kind: &str,
    rows: Vec<T>,
    notice: Option<&'static str>,
    view: impl Fn(T) -> V,
) -> Result<Response, RecordsError>
where
    T: Tabular,
    V: Serialize,
{
    if query.csv {
        return Ok(csv_response(&timestamped_filename(kind), to_csv(&rows)?));
    }
    let summary = column_summary(&rows);
    let rows: Vec<V> = rows.into_iter().map(view).collect();
    Ok(Json(RowList {
        count: rows.len(),
        rows,
        summary,
        notice,
    })
    .into_response())
}

fn linked(row: MergedRow) -> WithLink<MergedRow> {
    WithLink {
        twitter_url: twitter_link(&row.twitter_id),
        row,
    }
}

/// GET /players
pub async fn players(
    _: RequireLogin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, RecordsError> {
    let query = ListQuery::parse(raw.as_deref());
    let roster = load_rows::<PlayerRow>(&state, SheetKey::PlayerData).await?;
    let rows = query.apply(&roster, &roster);
    let notice = roster.is_empty().then_some(NO_PLAYERS_NOTICE);
    respond(&query, "player", rows, notice, |row: PlayerRow| WithLink {
        twitter_url: twitter_link(&row.twitter_id),
        row,
    })
}

/// GET /players/results -> results, joined with the roster when there is one.
pub async fn results(
    _: RequireLogin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, RecordsError> {
    let query = ListQuery::parse(raw.as_deref());
    let data = load_player_data(&state).await?;
    let roster = data.roster.unwrap_or_default();
    let results = data.results.unwrap_or_default();
    let notice = results.is_empty().then_some(NO_RESULTS_NOTICE);
    let merged = merge_results(&results, &roster);
    let rows = query.apply(&merged, &roster);
    respond(&query, "record", rows, notice, linked)
}

/// GET /players/merged -> results joined with the roster, or whichever of
/// the two is available.
pub async fn merged(
    _: RequireLogin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, RecordsError> {
    let query = ListQuery::parse(raw.as_deref());
    let data = load_player_data(&state).await?;
    let roster = data.roster.unwrap_or_default();
    let results = data.results.unwrap_or_default();
    let (merged, notice) = match (roster.is_empty(), results.is_empty()) {
        (true, true) => (Vec::new(), Some(NO_DATA_NOTICE)),
        (false, true) => (roster_as_merged(&roster), Some(NO_RESULTS_NOTICE)),
        (true, false) => (merge_results(&results, &roster), Some(NO_PLAYERS_NOTICE)),
        (false, false) => (merge_results(&results, &roster), None),
    };
    let rows = query.apply(&merged, &roster);
    respond(&query, "merged", rows, notice, linked)
}
