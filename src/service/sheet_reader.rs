use crate::api::SheetsApi;
use crate::error::RecordsError;
use crate::google_oauth::AuthorizedSession;
use crate::types::SheetRow;
use tracing::{info, warn};

/// Reads whole worksheets into typed rows.
#[derive(Debug, Clone)]
pub struct SheetReader {
    api: SheetsApi,
}

impl SheetReader {
    pub fn new(api: SheetsApi) -> Self {
        Self { api }
    }

    /// Fetch every data row of `sheet_name`, in sheet order.
    pub async fn fetch_rows<T: SheetRow>(
        &self,
        session: &AuthorizedSession,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<T>, RecordsError> {
        let values = self.api.get_values(session, spreadsheet_id, sheet_name).await?;
        let rows = grid_to_rows::<T>(sheet_name, values.into_grid()).inspect_err(|e| {
            warn!(spreadsheet_id, sheet = sheet_name, error = %e, "sheet rejected")
        })?;
        info!(
            spreadsheet_id,
            sheet = sheet_name,
            count = rows.len(),
            "sheet rows loaded"
        );
        Ok(rows)
    }
}

/// First grid row is the header; it must equal `T`'s column labels once
/// trailing blank cells are dropped.
pub fn grid_to_rows<T: SheetRow>(
    sheet_name: &str,
    grid: Vec<Vec<String>>,
) -> Result<Vec<T>, RecordsError> {
    let mut grid = grid.into_iter();
    let Some(mut header) = grid.next() else {
        return Ok(Vec::new());
    };
    while header.last().is_some_and(|c| c.is_empty()) {
        header.pop();
    }

    let expected = T::headers();
    if header.iter().map(String::as_str).ne(expected.iter().copied()) {
        return Err(RecordsError::SchemaMismatch {
            sheet: sheet_name.to_string(),
            expected: expected.into_iter().map(str::to_string).collect(),
            actual: header,
        });
    }

    let width = expected.len();
    Ok(grid
        .filter(|row| row.iter().take(width).any(|c| !c.is_empty()))
        .map(|mut row| {
            row.resize(width, String::new());
            T::from_cells(row)
        })
        .collect())
}
