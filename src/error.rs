use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

pub const SPREADSHEET_ID_UNSET_MESSAGE: &str = "スプレッドシートIDがSecretsに設定されていません";
pub const SHEETS_CONNECTION_MESSAGE: &str = "Google Sheetsへの接続に失敗しました";

#[derive(Debug, ThisError)]
pub enum RecordsError {
    #[error("missing secret `{}`", dotted(.section, .key.as_deref()))]
    MissingSecret {
        section: String,
        key: Option<String>,
    },

    #[error("malformed secret `{key}`: {reason}")]
    MalformedSecret { key: String, reason: String },

    #[error("service account authentication failed: {0}")]
    Authentication(String),

    #[error("cannot read sheet '{sheet}' of spreadsheet {spreadsheet_id}: {kind}")]
    SheetAccess {
        spreadsheet_id: String,
        sheet: String,
        kind: SheetAccessKind,
        /// The account the spreadsheet must be shared with.
        client_email: String,
    },

    #[error("header mismatch in sheet '{sheet}': expected {expected:?}, found {actual:?}")]
    SchemaMismatch {
        sheet: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("login required")]
    Unauthorized,

    #[error("wrong password")]
    InvalidPassword,

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),
}

/// Why a worksheet could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetAccessKind {
    SpreadsheetNotFound,
    PermissionDenied,
    WorksheetNotFound,
}

impl fmt::Display for SheetAccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SpreadsheetNotFound => "spreadsheet not found",
            Self::PermissionDenied => "permission denied",
            Self::WorksheetNotFound => "worksheet not found",
        };
        f.write_str(s)
    }
}

fn dotted(section: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{section}.{key}"),
        None => section.to_string(),
    }
}

impl RecordsError {
    pub fn missing(section: &str, key: Option<&str>) -> Self {
        Self::MissingSecret {
            section: section.to_string(),
            key: key.map(str::to_string),
        }
    }

    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSecret {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// A worksheet that is absent, unshared or has the wrong header. The
    /// other worksheets of the same spreadsheet may still be readable.
    pub fn is_sheet_unreadable(&self) -> bool {
        matches!(self, Self::SheetAccess { .. } | Self::SchemaMismatch { .. })
    }

    /// True for the spreadsheet-id class of missing secrets.
    pub fn is_spreadsheet_id_unset(&self) -> bool {
        matches!(self, Self::MissingSecret { section, .. } if section == "spreadsheet_ids")
    }
}

impl IntoResponse for RecordsError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            e if e.is_spreadsheet_id_unset() => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SPREADSHEET_ID_UNSET",
                SPREADSHEET_ID_UNSET_MESSAGE.to_string(),
            ),
            RecordsError::Authentication(_)
            | RecordsError::Reqwest(_)
            | RecordsError::UrlParse(_)
            | RecordsError::UpstreamStatus(_) => (
                StatusCode::BAD_GATEWAY,
                "SHEETS_CONNECTION_FAILED",
                SHEETS_CONNECTION_MESSAGE.to_string(),
            ),
            RecordsError::SheetAccess {
                spreadsheet_id,
                sheet,
                kind,
                client_email,
            } => match kind {
                SheetAccessKind::SpreadsheetNotFound => (
                    StatusCode::NOT_FOUND,
                    "SPREADSHEET_NOT_FOUND",
                    format!(
                        "スプレッドシート (ID: {spreadsheet_id}) が見つからないか、アクセス権がありません。共有設定を確認してください。"
                    ),
                ),
                SheetAccessKind::PermissionDenied => (
                    StatusCode::FORBIDDEN,
                    "SHEET_PERMISSION_DENIED",
                    format!(
                        "シート「{sheet}」へのアクセス権限がありません。サービスアカウント ({client_email}) を共有設定に追加してください。"
                    ),
                ),
                SheetAccessKind::WorksheetNotFound => (
                    StatusCode::NOT_FOUND,
                    "WORKSHEET_NOT_FOUND",
                    format!(
                        "ワークシート '{sheet}' がスプレッドシート (ID: {spreadsheet_id}) 内に見つかりません。"
                    ),
                ),
            },
            RecordsError::SchemaMismatch {
                expected, actual, ..
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SCHEMA_MISMATCH",
                format!(
                    "スプレッドシートのヘッダーが期待と異なります。期待: {expected:?} 実際: {actual:?}"
                ),
            ),
            RecordsError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "ログインが必要です。".to_string(),
            ),
            RecordsError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                "INVALID_PASSWORD",
                "パスワードが正しくありません。".to_string(),
            ),
            RecordsError::MissingSecret { .. }
            | RecordsError::MalformedSecret { .. }
            | RecordsError::Config(_)
            | RecordsError::Io(_)
            | RecordsError::Json(_)
            | RecordsError::Csv(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Sheets API error response structure
#[derive(Deserialize, Debug)]
pub struct SheetsApiError {
    pub error: SheetsApiErrorBody,
}

#[derive(Deserialize, Debug, Default)]
pub struct SheetsApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_names_the_dotted_key() {
        let err = RecordsError::missing("gcp_service_account", Some("client_email"));
        assert_eq!(
            err.to_string(),
            "missing secret `gcp_service_account.client_email`"
        );
        assert!(!err.is_spreadsheet_id_unset());
    }

    #[test]
    fn spreadsheet_ids_map_to_unset_warning() {
        let err = RecordsError::missing("spreadsheet_ids", Some("player_data"));
        assert!(err.is_spreadsheet_id_unset());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn permission_denied_is_forbidden() {
        let resp = RecordsError::SheetAccess {
            spreadsheet_id: "id".into(),
            sheet: "選手一覧".into(),
            kind: SheetAccessKind::PermissionDenied,
            client_email: "reader@waic-records.iam.gserviceaccount.com".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn authentication_failure_is_bad_gateway() {
        let resp = RecordsError::Authentication("invalid_grant".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
