use crate::error::RecordsError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

pub(super) const SECTION: &str = "spreadsheet_ids";

/// Logical spreadsheet names under `[spreadsheet_ids]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKey {
    WarRecord,
    PlayerData,
}

impl SheetKey {
    pub const ALL: [SheetKey; 2] = [SheetKey::WarRecord, SheetKey::PlayerData];

    pub fn as_str(self) -> &'static str {
        match self {
            SheetKey::WarRecord => "war_record",
            SheetKey::PlayerData => "player_data",
        }
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spreadsheet document ids keyed by logical name.
///
/// An unset key does not fail the whole load; lookups for it fail closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetRegistry {
    ids: BTreeMap<SheetKey, String>,
}

impl SpreadsheetRegistry {
    /// Build from the raw `[spreadsheet_ids]` table. Values may be bare ids
    /// or full Sheets URLs.
    pub fn from_table(table: BTreeMap<String, String>) -> Result<Self, RecordsError> {
        let mut ids = BTreeMap::new();
        for key in SheetKey::ALL {
            let Some(raw) = table.get(key.as_str()).filter(|v| !v.trim().is_empty()) else {
                warn!(key = %key, "spreadsheet id not configured; dependent pages are disabled");
                continue;
            };
            let id = extract_spreadsheet_id(raw).ok_or_else(|| {
                RecordsError::malformed(
                    format!("{SECTION}.{key}"),
                    "expected a spreadsheet id or a docs.google.com/spreadsheets URL",
                )
            })?;
            ids.insert(key, id);
        }
        for unknown in table
            .keys()
            .filter(|k| !SheetKey::ALL.iter().any(|s| s.as_str() == k.as_str()))
        {
            debug!(key = %unknown, "ignoring unknown spreadsheet_ids entry");
        }
        Ok(Self { ids })
    }

    pub fn get(&self, key: SheetKey) -> Result<&str, RecordsError> {
        self.ids
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| RecordsError::missing(SECTION, Some(key.as_str())))
    }

    /// Keys that resolved to an id, in declaration order.
    pub fn configured(&self) -> Vec<SheetKey> {
        self.ids.keys().copied().collect()
    }
}

/// Pull the document id out of a Sheets URL, or accept a bare id.
///
/// `https://docs.google.com/spreadsheets/d/<ID>/edit#gid=0` yields `<ID>`.
pub fn extract_spreadsheet_id(input: &str) -> Option<String> {
    let input = input.trim();
    let candidate = match Url::parse(input) {
        Ok(url) => {
            let segments: Vec<&str> = url.path_segments()?.collect();
            let at = segments.iter().position(|s| *s == "spreadsheets")?;
            let d = segments[at..].iter().position(|s| *s == "d")? + at;
            segments.get(d + 1)?.to_string()
        }
        Err(_) => input.to_string(),
    };
    is_spreadsheet_id(&candidate).then_some(candidate)
}

fn is_spreadsheet_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAR_ID: &str = "1V9guZQbpV8UDU_W2pC1WBsE1hOHqIO4yTsG8oGzaPQU";

    #[test]
    fn extracts_id_from_edit_url() {
        let url = format!("https://docs.google.com/spreadsheets/d/{WAR_ID}/edit");
        let id = extract_spreadsheet_id(&url).expect("id in url");
        assert_eq!(id, WAR_ID);
        assert_eq!(id.len(), 44);
    }

    #[test]
    fn extracts_id_with_fragment_and_user_prefix() {
        let url = format!("https://docs.google.com/spreadsheets/u/0/d/{WAR_ID}/edit#gid=0");
        assert_eq!(extract_spreadsheet_id(&url).as_deref(), Some(WAR_ID));
    }

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(
            extract_spreadsheet_id(&format!("  {WAR_ID}  ")).as_deref(),
            Some(WAR_ID)
        );
        assert_eq!(extract_spreadsheet_id("not an id!"), None);
        assert_eq!(extract_spreadsheet_id("https://example.com/other"), None);
    }

    #[test]
    fn missing_key_fails_closed_on_lookup() {
        let table = BTreeMap::from([("war_record".to_string(), WAR_ID.to_string())]);
        let registry = SpreadsheetRegistry::from_table(table).expect("registry");
        assert_eq!(registry.get(SheetKey::WarRecord).ok(), Some(WAR_ID));
        let err = registry.get(SheetKey::PlayerData).unwrap_err();
        assert!(err.is_spreadsheet_id_unset());
        assert_eq!(registry.configured(), vec![SheetKey::WarRecord]);
    }

    #[test]
    fn blank_value_counts_as_unset() {
        let table = BTreeMap::from([
            ("war_record".to_string(), WAR_ID.to_string()),
            ("player_data".to_string(), "   ".to_string()),
        ]);
        let registry = SpreadsheetRegistry::from_table(table).expect("registry");
        assert!(registry.get(SheetKey::PlayerData).is_err());
    }
}
