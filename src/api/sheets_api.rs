use crate::error::{RecordsError, SheetAccessKind, SheetsApiError};
use crate::google_oauth::AuthorizedSession;
use crate::types::sheets::ValueRange;
use axum::http::StatusCode;
use tracing::{debug, warn};
use url::Url;

/// Stateless wrapper over `spreadsheets.values.get`.
#[derive(Debug, Clone)]
pub struct SheetsApi {
    base: Url,
}

impl SheetsApi {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// `{base}/spreadsheets/{id}/values/'{sheet}'`
    pub fn values_url(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Url, RecordsError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithoutBase)?
            .pop_if_empty()
            .push("spreadsheets")
            .push(spreadsheet_id)
            .push("values")
            .push(&format!("'{}'", sheet_name.replace('\'', "''")));
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        Ok(url)
    }

    pub async fn get_values(
        &self,
        session: &AuthorizedSession,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<ValueRange, RecordsError> {
        let url = self.values_url(spreadsheet_id, sheet_name)?;
        debug!(spreadsheet_id, sheet = sheet_name, "fetching sheet values");

        let resp = session
            .client
            .get(url)
            .bearer_auth(&session.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<ValueRange>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<SheetsApiError>(&body)
            .map(|e| e.error)
            .unwrap_or_default();
        warn!(
            spreadsheet_id,
            sheet = sheet_name,
            status = %status,
            google_status = %detail.status,
            message = %detail.message,
            "Sheets API rejected values request"
        );
        Err(classify_failure(
            status,
            spreadsheet_id,
            sheet_name,
            &session.client_email,
        ))
    }
}

fn classify_failure(
    status: StatusCode,
    spreadsheet_id: &str,
    sheet_name: &str,
    client_email: &str,
) -> RecordsError {
    let access = |kind| RecordsError::SheetAccess {
        spreadsheet_id: spreadsheet_id.to_string(),
        sheet: sheet_name.to_string(),
        kind,
        client_email: client_email.to_string(),
    };
    match status {
        StatusCode::NOT_FOUND => access(SheetAccessKind::SpreadsheetNotFound),
        StatusCode::FORBIDDEN => access(SheetAccessKind::PermissionDenied),
        // "Unable to parse range" is what an unknown worksheet name produces.
        StatusCode::BAD_REQUEST => access(SheetAccessKind::WorksheetNotFound),
        StatusCode::UNAUTHORIZED => {
            RecordsError::Authentication("Sheets API rejected the access token".to_string())
        }
        other => RecordsError::UpstreamStatus(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_quotes_and_encodes_the_sheet() {
        let api = SheetsApi::new(Url::parse("https://sheets.googleapis.com/v4/").unwrap());
        let url = api.values_url("abc_123", "シート1").unwrap();
        assert!(url.as_str().starts_with(
            "https://sheets.googleapis.com/v4/spreadsheets/abc_123/values/'%E3%82%B7%E3%83%BC%E3%83%881'"
        ));
        assert!(
            url.as_str()
                .ends_with("majorDimension=ROWS&valueRenderOption=FORMATTED_VALUE")
        );
    }

    #[test]
    fn status_codes_map_to_access_kinds() {
        let err = classify_failure(StatusCode::FORBIDDEN, "id", "選手一覧", "reader@x");
        assert!(matches!(
            err,
            RecordsError::SheetAccess {
                kind: SheetAccessKind::PermissionDenied,
                ref client_email,
                ..
            } if client_email == "reader@x"
        ));
        let err = classify_failure(StatusCode::BAD_REQUEST, "id", "nope", "reader@x");
        assert!(matches!(
            err,
            RecordsError::SheetAccess {
                kind: SheetAccessKind::WorksheetNotFound,
                ..
            }
        ));
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, "id", "x", "reader@x"),
            RecordsError::Authentication(_)
        ));
    }
}
