use crate::error::RecordsError;
use crate::types::Tabular;
use chrono::Local;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const WAR_RECORDS_FILENAME: &str = "game_records_download.csv";

/// UTF-8 CSV with a BOM so spreadsheet apps pick the right encoding. The
/// header row carries the column labels.
pub fn to_csv<T: Tabular>(rows: &[T]) -> Result<Vec<u8>, RecordsError> {
    let mut out = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new().from_writer(&mut out);
        writer.write_record(T::COLUMNS.iter().map(|c| c.label))?;
        for row in rows {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;
    }
    Ok(out)
}

/// `{kind}_data_YYYYmmdd_HHMMSS.csv`, local time.
pub fn timestamped_filename(kind: &str) -> String {
    format!("{kind}_data_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerRow;

    #[test]
    fn export_starts_with_bom_and_labels() {
        let rows = vec![PlayerRow {
            player_name: "山田, 太郎".into(),
            twitter_id: "@taro".into(),
            team: String::new(),
            nickname: "タロウ".into(),
        }];
        let bytes = to_csv(&rows).expect("csv");
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).expect("utf8");
        assert_eq!(
            text,
            "選手名,TwitterID,所属チーム,通称\n\"山田, 太郎\",@taro,,タロウ\n"
        );
    }

    #[test]
    fn filenames_carry_the_kind_and_timestamp() {
        let name = timestamped_filename("merged");
        assert!(name.starts_with("merged_data_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "merged_data_20240101_000000.csv".len());
    }
}
