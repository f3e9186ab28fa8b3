use serde::Deserialize;
use serde_json::Value;

/// `spreadsheets.values.get` response; only the cells are kept.
#[derive(Debug, Deserialize)]
pub struct ValueRange {
    /// Absent when the range holds no data at all.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// Every cell rendered as a trimmed string.
    pub fn into_grid(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
