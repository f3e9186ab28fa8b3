use crate::types::{MergedRow, PlayerKeyed, PlayerResultRow, PlayerRow, Tabular};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Left join of results onto the roster. A result whose name matches no
/// player is retried against nicknames; the first matching player wins.
pub fn merge_results(results: &[PlayerResultRow], players: &[PlayerRow]) -> Vec<MergedRow> {
    results
        .iter()
        .map(|r| {
            let player = players
                .iter()
                .find(|p| p.player_name == r.player_name)
                .or_else(|| {
                    players
                        .iter()
                        .find(|p| !p.nickname.is_empty() && p.nickname == r.player_name)
                });
            let (twitter_id, team, nickname) = player
                .map(|p| (p.twitter_id.clone(), p.team.clone(), p.nickname.clone()))
                .unwrap_or_default();
            MergedRow {
                player_name: r.player_name.clone(),
                tournament_name: r.tournament_name.clone(),
                deck_used: r.deck_used.clone(),
                result: r.result.clone(),
                memo: r.memo.clone(),
                twitter_id,
                team,
                nickname,
            }
        })
        .collect()
}

/// Roster rows in the merged shape, for when no results could be read.
pub fn roster_as_merged(players: &[PlayerRow]) -> Vec<MergedRow> {
    players
        .iter()
        .map(|p| MergedRow {
            player_name: p.player_name.clone(),
            twitter_id: p.twitter_id.clone(),
            team: p.team.clone(),
            nickname: p.nickname.clone(),
            ..MergedRow::default()
        })
        .collect()
}

/// Names and nicknames of every player whose name or nickname contains `needle`.
fn expanded_names<'a>(players: &'a [PlayerRow], needle: &str) -> HashSet<&'a str> {
    players
        .iter()
        .filter(|p| {
            p.player_name.to_lowercase().contains(needle)
                || (!p.nickname.is_empty() && p.nickname.to_lowercase().contains(needle))
        })
        .flat_map(|p| [p.player_name.as_str(), p.nickname.as_str()])
        .filter(|n| !n.is_empty())
        .collect()
}

/// Case-insensitive substring search over every cell. Rows filed under a
/// matching player's name or nickname are included as well.
pub fn keyword_search<T>(rows: &[T], players: &[PlayerRow], term: &str) -> Vec<T>
where
    T: Tabular + PlayerKeyed + Clone,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    let names = expanded_names(players, &needle);
    rows.iter()
        .filter(|row| {
            names.contains(row.player_name())
                || row.cells().any(|c| c.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Exact-value filter. `(column, value)` pairs are grouped per column (key
/// or label): a row must match every column, and any one value within it.
/// Unknown columns are ignored; no pairs keeps everything.
pub fn column_filter<T: Tabular + Clone>(rows: &[T], pairs: &[(&str, &str)]) -> Vec<T> {
    let mut wanted: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for &(column, value) in pairs {
        if let Some(index) = T::column_index(column) {
            wanted.entry(index).or_default().push(value);
        }
    }
    rows.iter()
        .filter(|r| {
            wanted
                .iter()
                .all(|(&index, values)| values.contains(&r.cell(index)))
        })
        .cloned()
        .collect()
}

pub fn twitter_link(twitter_id: &str) -> String {
    let id = twitter_id.trim().trim_start_matches('@');
    if id.is_empty() {
        return String::new();
    }
    format!("https://twitter.com/{id}")
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub label: &'static str,
    pub non_empty: usize,
    pub unique: usize,
}

/// Filled and distinct value counts per column.
pub fn column_summary<T: Tabular>(rows: &[T]) -> Vec<ColumnSummary> {
    T::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let values: Vec<&str> = rows
                .iter()
                .map(|r| r.cell(i))
                .filter(|v| !v.is_empty())
                .collect();
            ColumnSummary {
                column: c.key,
                label: c.label,
                non_empty: values.len(),
                unique: values.iter().collect::<BTreeSet<_>>().len(),
            }
        })
        .collect()
}
