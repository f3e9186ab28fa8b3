use crate::types::WarRecordRow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;

pub const WIN: &str = "勝ち";
pub const LOSS: &str = "負け";
pub const FIRST: &str = "先攻";
pub const SECOND: &str = "後攻";
/// Opponent type label of the per-deck aggregate matchup row.
pub const ALL_TYPES: &str = "全タイプ";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt);
    }
    let day = raw.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(day, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Newest first; rows whose date does not parse keep their order at the end.
pub fn sort_for_display(rows: Vec<WarRecordRow>) -> Vec<WarRecordRow> {
    let (mut dated, undated): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .map(|row| (parse_date(&row.date), row))
        .partition(|(date, _)| date.is_some());
    dated.sort_by(|(a, _), (b, _)| b.cmp(a));
    dated
        .into_iter()
        .chain(undated)
        .map(|(_, row)| row)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub season: Option<String>,
    pub environments: Vec<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.season.is_none() && self.environments.is_empty()
    }

    pub fn matches(&self, row: &WarRecordRow) -> bool {
        self.season.as_ref().is_none_or(|s| &row.season == s)
            && (self.environments.is_empty() || self.environments.contains(&row.environment))
    }

    pub fn apply(&self, rows: &[WarRecordRow]) -> Vec<WarRecordRow> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn seasons(rows: &[WarRecordRow]) -> Vec<String> {
    distinct(rows.iter().map(|r| r.season.as_str()))
}

pub fn environments(rows: &[WarRecordRow]) -> Vec<String> {
    distinct(rows.iter().map(|r| r.environment.as_str()))
}

/// Every archetype that appears on either side.
pub fn deck_names(rows: &[WarRecordRow]) -> Vec<String> {
    distinct(
        rows.iter()
            .flat_map(|r| [r.my_deck.as_str(), r.opponent_deck.as_str()]),
    )
}

pub fn deck_types(rows: &[WarRecordRow], deck: &str) -> Vec<String> {
    distinct(
        Side::BOTH
            .iter()
            .flat_map(|&side| rows.iter().map(move |r| Appearance { row: r, side }))
            .filter(|a| a.deck() == deck)
            .map(|a| a.deck_type()),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Mine,
    Opponent,
}

impl Side {
    const BOTH: [Side; 2] = [Side::Mine, Side::Opponent];
}

/// One game seen from one deck's seat.
#[derive(Debug, Clone, Copy)]
struct Appearance<'a> {
    row: &'a WarRecordRow,
    side: Side,
}

impl<'a> Appearance<'a> {
    fn deck(&self) -> &'a str {
        match self.side {
            Side::Mine => &self.row.my_deck,
            Side::Opponent => &self.row.opponent_deck,
        }
    }

    fn deck_type(&self) -> &'a str {
        match self.side {
            Side::Mine => &self.row.my_deck_type,
            Side::Opponent => &self.row.opponent_deck_type,
        }
    }

    fn opponent_deck(&self) -> &'a str {
        match self.side {
            Side::Mine => &self.row.opponent_deck,
            Side::Opponent => &self.row.my_deck,
        }
    }

    fn opponent_type(&self) -> &'a str {
        match self.side {
            Side::Mine => &self.row.opponent_deck_type,
            Side::Opponent => &self.row.my_deck_type,
        }
    }

    fn seat_result(&self, mine: &str, theirs: &str) -> bool {
        match self.side {
            Side::Mine => self.row.result == mine,
            Side::Opponent => self.row.result == theirs,
        }
    }

    fn won(&self) -> bool {
        self.seat_result(WIN, LOSS)
    }

    /// Explicit loss; blank or other results are neither.
    fn lost(&self) -> bool {
        self.seat_result(LOSS, WIN)
    }

    fn went_first(&self) -> bool {
        match self.side {
            Side::Mine => self.row.first_second == FIRST,
            Side::Opponent => self.row.first_second == SECOND,
        }
    }

    fn went_second(&self) -> bool {
        match self.side {
            Side::Mine => self.row.first_second == SECOND,
            Side::Opponent => self.row.first_second == FIRST,
        }
    }

    fn finish_turn(&self) -> Option<f64> {
        self.row
            .finish_turn
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
    }
}

/// Appearances of `deck` (optionally of one type), my-side games first.
fn appearances<'a>(
    rows: &'a [WarRecordRow],
    deck: &str,
    deck_type: Option<&str>,
) -> Vec<Appearance<'a>> {
    Side::BOTH
        .iter()
        .flat_map(|&side| rows.iter().map(move |row| Appearance { row, side }))
        .filter(|a| a.deck() == deck && deck_type.is_none_or(|t| a.deck_type() == t))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    games: usize,
    wins: usize,
}

impl Tally {
    fn add(&mut self, won: bool) {
        self.games += 1;
        self.wins += usize::from(won);
    }

    fn rate(&self) -> Option<f64> {
        (self.games > 0).then(|| self.wins as f64 / self.games as f64 * 100.0)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Overall, first-seat and second-seat tallies over a set of appearances.
#[derive(Debug, Default)]
struct SeatTallies {
    all: Tally,
    first: Tally,
    second: Tally,
}

impl SeatTallies {
    fn of<'a, 'r: 'a>(apps: impl IntoIterator<Item = &'a Appearance<'r>>) -> Self {
        let mut t = Self::default();
        for a in apps {
            let won = a.won();
            t.all.add(won);
            if a.went_first() {
                t.first.add(won);
            }
            if a.went_second() {
                t.second.add(won);
            }
        }
        t
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeckOverview {
    pub deck: String,
    pub appearances: usize,
    pub appearances_first: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub average_matchup_win_rate: Option<f64>,
    pub first_win_rate: Option<f64>,
    pub second_win_rate: Option<f64>,
}

/// Per-archetype summary, best average matchup first.
pub fn deck_overview(rows: &[WarRecordRow]) -> Vec<DeckOverview> {
    let mut out: Vec<DeckOverview> = deck_names(rows)
        .into_iter()
        .filter_map(|deck| {
            let apps = appearances(rows, &deck, None);
            if apps.is_empty() {
                return None;
            }
            let seats = SeatTallies::of(&apps);

            let opponents: BTreeSet<&str> = apps
                .iter()
                .map(|a| a.opponent_deck())
                .filter(|o| !o.is_empty() && *o != deck)
                .collect();
            let matchup_rates: Vec<f64> = opponents
                .iter()
                .filter_map(|opp| {
                    let mut t = Tally::default();
                    apps.iter()
                        .filter(|a| a.opponent_deck() == *opp)
                        .for_each(|a| t.add(a.won()));
                    t.rate()
                })
                .collect();

            Some(DeckOverview {
                appearances: seats.all.games,
                appearances_first: seats.first.games,
                wins: seats.all.wins,
                losses: seats.all.games - seats.all.wins,
                win_rate: seats.all.rate().unwrap_or(0.0),
                average_matchup_win_rate: mean(&matchup_rates),
                first_win_rate: seats.first.rate(),
                second_win_rate: seats.second.rate(),
                deck,
            })
        })
        .collect();

    out.sort_by(|a, b| match (a.average_matchup_win_rate, b.average_matchup_win_rate) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    out
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchupStats {
    pub opponent_deck: String,
    /// The opponent's type, or [`ALL_TYPES`] for the per-deck aggregate.
    pub opponent_type: String,
    pub games: usize,
    pub games_first: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub average_win_turn: Option<f64>,
    pub average_loss_turn: Option<f64>,
    pub first_win_rate: Option<f64>,
    pub second_win_rate: Option<f64>,
}

impl MatchupStats {
    fn of(opponent_deck: &str, opponent_type: &str, apps: &[&Appearance<'_>]) -> Self {
        let seats = SeatTallies::of(apps.iter().copied());
        let win_turns: Vec<f64> = apps
            .iter()
            .filter(|a| a.won())
            .filter_map(|a| a.finish_turn())
            .collect();
        let loss_turns: Vec<f64> = apps
            .iter()
            .filter(|a| a.lost())
            .filter_map(|a| a.finish_turn())
            .collect();
        Self {
            opponent_deck: opponent_deck.to_string(),
            opponent_type: opponent_type.to_string(),
            games: seats.all.games,
            games_first: seats.first.games,
            wins: seats.all.wins,
            win_rate: seats.all.rate().unwrap_or(0.0),
            average_win_turn: mean(&win_turns),
            average_loss_turn: mean(&loss_turns),
            first_win_rate: seats.first.rate(),
            second_win_rate: seats.second.rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FocusAnalysis {
    pub deck: String,
    pub deck_type: Option<String>,
    pub appearances: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub games_first: usize,
    pub wins_first: usize,
    pub first_win_rate: Option<f64>,
    pub games_second: usize,
    pub wins_second: usize,
    pub second_win_rate: Option<f64>,
    pub average_win_turn: Option<f64>,
    pub matchups: Vec<MatchupStats>,
    pub memo_records: Vec<WarRecordRow>,
}

/// `None` when the deck (of that type) never appears in `rows`.
pub fn focus_analysis(
    rows: &[WarRecordRow],
    deck: &str,
    deck_type: Option<&str>,
) -> Option<FocusAnalysis> {
    let deck_type = deck_type.filter(|t| !t.is_empty() && *t != ALL_TYPES);
    let apps = appearances(rows, deck, deck_type);
    if apps.is_empty() {
        return None;
    }
    let seats = SeatTallies::of(&apps);
    let win_turns: Vec<f64> = apps
        .iter()
        .filter(|a| a.won())
        .filter_map(|a| a.finish_turn())
        .collect();

    let pairs: BTreeSet<(&str, &str)> = apps
        .iter()
        .map(|a| (a.opponent_deck(), a.opponent_type()))
        .filter(|(d, _)| !d.is_empty())
        .collect();
    let opponent_decks: BTreeSet<&str> = pairs.iter().map(|(d, _)| *d).collect();

    let mut matchups = Vec::with_capacity(pairs.len() + opponent_decks.len());
    for opp in &opponent_decks {
        let vs_deck: Vec<&Appearance<'_>> =
            apps.iter().filter(|a| a.opponent_deck() == *opp).collect();
        matchups.push(MatchupStats::of(opp, ALL_TYPES, &vs_deck));
        for (_, opp_type) in pairs.range((*opp, "")..).take_while(|(d, _)| d == opp) {
            let vs_type: Vec<&Appearance<'_>> = vs_deck
                .iter()
                .copied()
                .filter(|a| a.opponent_type() == *opp_type)
                .collect();
            matchups.push(MatchupStats::of(opp, opp_type, &vs_type));
        }
    }

    let mut memo_records: Vec<WarRecordRow> = Vec::new();
    for a in apps.iter().filter(|a| !a.row.memo.trim().is_empty()) {
        if !memo_records.contains(a.row) {
            memo_records.push(a.row.clone());
        }
    }

    Some(FocusAnalysis {
        deck: deck.to_string(),
        deck_type: deck_type.map(str::to_string),
        appearances: seats.all.games,
        wins: seats.all.wins,
        losses: seats.all.games - seats.all.wins,
        win_rate: seats.all.rate().unwrap_or(0.0),
        games_first: seats.first.games,
        wins_first: seats.first.wins,
        first_win_rate: seats.first.rate(),
        games_second: seats.second.games,
        wins_second: seats.second.wins,
        second_win_rate: seats.second.rate(),
        average_win_turn: mean(&win_turns),
        matchups,
        memo_records: sort_for_display(memo_records),
    })
}

/// What the analysis route shows for a filter and optional focus deck.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Analysis {
    Overview { decks: Vec<DeckOverview> },
    Focus(FocusAnalysis),
    NoRecords { message: String },
}

pub fn analyze(
    rows: &[WarRecordRow],
    filter: &RecordFilter,
    deck: Option<&str>,
    deck_type: Option<&str>,
) -> Analysis {
    let no_records = |message: String| Analysis::NoRecords { message };
    if rows.is_empty() {
        return no_records("まだ分析できる戦績データがありません。".to_string());
    }
    let filtered = filter.apply(rows);
    if filtered.is_empty() {
        let message = if filter.is_empty() {
            "分析対象のデータがありません。"
        } else {
            "選択された絞り込み条件に合致するデータがありません。"
        };
        return no_records(message.to_string());
    }

    match deck.filter(|d| !d.is_empty()) {
        None => Analysis::Overview {
            decks: deck_overview(&filtered),
        },
        Some(deck) => match focus_analysis(&filtered, deck, deck_type) {
            Some(focus) => Analysis::Focus(focus),
            None => {
                let label = match deck_type.filter(|t| !t.is_empty() && *t != ALL_TYPES) {
                    Some(t) => format!("{deck} ({t})"),
                    None => deck.to_string(),
                };
                no_records(format!(
                    "「{label}」の対戦記録が現在の絞り込み条件で見つかりません。"
                ))
            }
        },
    }
}
