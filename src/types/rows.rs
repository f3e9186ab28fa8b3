use serde::{Deserialize, Serialize};

/// One display column: serialized key and the header label used in the sheet
/// and in CSV exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn col(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// Flat row of string cells in a fixed column order.
pub trait Tabular {
    const COLUMNS: &'static [Column];

    fn cell(&self, index: usize) -> &str;

    fn cells(&self) -> impl Iterator<Item = &str> {
        (0..Self::COLUMNS.len()).map(|i| self.cell(i))
    }

    /// Column index by key or label.
    fn column_index(name: &str) -> Option<usize> {
        Self::COLUMNS
            .iter()
            .position(|c| c.key == name || c.label == name)
    }
}

/// A row type read straight from one worksheet.
pub trait SheetRow: Tabular + Sized {
    const SHEET_NAME: &'static str;

    /// `cells` has exactly `COLUMNS.len()` entries.
    fn from_cells(cells: Vec<String>) -> Self;

    fn headers() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.label).collect()
    }
}

/// Rows that name a player, for name/nickname aware search.
pub trait PlayerKeyed {
    fn player_name(&self) -> &str;
}

macro_rules! string_row {
    (
        $(#[$meta:meta])*
        $name:ident, sheet = $sheet:expr, { $($field:ident => $label:expr),+ $(,)? }
    ) => {
        string_row! {
            $(#[$meta])*
            $name, { $($field => $label),+ }
        }

        impl SheetRow for $name {
            const SHEET_NAME: &'static str = $sheet;

            fn from_cells(cells: Vec<String>) -> Self {
                let mut cells = cells.into_iter();
                Self {
                    $($field: cells.next().unwrap_or_default(),)+
                }
            }
        }
    };
    (
        $(#[$meta:meta])*
        $name:ident, { $($field:ident => $label:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl Tabular for $name {
            const COLUMNS: &'static [Column] = &[$(col(stringify!($field), $label)),+];

            fn cell(&self, index: usize) -> &str {
                let fields: &[&String] = &[$(&self.$field),+];
                fields.get(index).copied().map(String::as_str).unwrap_or("")
            }
        }
    };
}

string_row! {
    /// One game from the war-record sheet, from the recorder's side.
    WarRecordRow, sheet = "シート1", {
        season => "season",
        date => "date",
        environment => "environment",
        my_deck => "my_deck",
        my_deck_type => "my_deck_type",
        opponent_deck => "opponent_deck",
        opponent_deck_type => "opponent_deck_type",
        first_second => "first_second",
        result => "result",
        finish_turn => "finish_turn",
        memo => "memo",
    }
}

string_row! {
    /// Roster entry.
    PlayerRow, sheet = "選手一覧", {
        player_name => "選手名",
        twitter_id => "TwitterID",
        team => "所属チーム",
        nickname => "通称",
    }
}

string_row! {
    /// One tournament result for a player.
    PlayerResultRow, sheet = "戦績一覧", {
        player_name => "選手名",
        tournament_name => "大会名",
        deck_used => "使用デッキ",
        result => "戦績",
        memo => "メモ",
    }
}

string_row! {
    /// A tournament result joined with the roster entry of its player.
    MergedRow, {
        player_name => "選手名",
        tournament_name => "大会名",
        deck_used => "使用デッキ",
        result => "戦績",
        memo => "メモ",
        twitter_id => "TwitterID",
        team => "所属チーム",
        nickname => "通称",
    }
}

impl PlayerKeyed for PlayerRow {
    fn player_name(&self) -> &str {
        &self.player_name
    }
}

impl PlayerKeyed for PlayerResultRow {
    fn player_name(&self) -> &str {
        &self.player_name
    }
}

impl PlayerKeyed for MergedRow {
    fn player_name(&self) -> &str {
        &self.player_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn war_record_headers_match_sheet_layout() {
        assert_eq!(
            WarRecordRow::headers(),
            vec![
                "season",
                "date",
                "environment",
                "my_deck",
                "my_deck_type",
                "opponent_deck",
                "opponent_deck_type",
                "first_second",
                "result",
                "finish_turn",
                "memo"
            ]
        );
        assert_eq!(WarRecordRow::SHEET_NAME, "シート1");
    }

    #[test]
    fn player_columns_resolve_by_key_or_label() {
        assert_eq!(PlayerRow::column_index("team"), Some(2));
        assert_eq!(PlayerRow::column_index("所属チーム"), Some(2));
        assert_eq!(PlayerRow::column_index("nope"), None);
    }

    #[test]
    fn from_cells_fills_in_column_order() {
        let row = PlayerResultRow::from_cells(
            ["たろう", "春季大会", "ドラゴン", "優勝", ""]
                .map(String::from)
                .to_vec(),
        );
        assert_eq!(row.tournament_name, "春季大会");
        assert_eq!(row.cell(3), "優勝");
        assert_eq!(row.cells().count(), 5);
    }
}
