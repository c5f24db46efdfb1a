// Cleaning: typed season records from raw CSV text.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::MinGames;
use crate::loader::{RawRecord, RawTable};
use crate::schema::{normalize_column, Stat, StatLine, DID_NOT_PLAY, SEASON_COLUMN};

/// One player-season after cleaning.
///
/// `games_played` and the `pts` entry of `stats` are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRecord {
    pub player: String,
    pub season: String,
    pub source: String,
    pub line: u64,
    pub games_played: f64,
    pub stats: StatLine,
}

/// Row counts from one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_below_threshold: usize,
    pub kept: usize,
}

/// Returns true for the "Did not play" placeholder, ignoring case and padding.
pub fn is_did_not_play(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case(DID_NOT_PLAY)
}

/// Coerce a cell to a number. Anything unusable becomes `None`.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || is_did_not_play(cell) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Column positions for one source, resolved from normalized headers.
struct ColumnIndex {
    season: Option<usize>,
    stats: [Option<usize>; Stat::COUNT],
}

impl ColumnIndex {
    fn new(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column(h)).collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);
        let mut stats = [None; Stat::COUNT];
        for stat in Stat::ALL {
            stats[stat.index()] = find(stat.column());
        }
        ColumnIndex {
            season: find(SEASON_COLUMN),
            stats,
        }
    }
}

fn cell<'a>(record: &RawRecord<'a>, index: Option<usize>) -> Option<&'a str> {
    index.and_then(|i| record.cells.get(i)).map(String::as_str)
}

fn season_record(record: &RawRecord<'_>, index: &ColumnIndex) -> SeasonRecord {
    let mut stats = StatLine::default();
    for stat in Stat::ALL {
        stats.set(stat, cell(record, index.stats[stat.index()]).and_then(coerce_numeric));
    }

    let season = cell(record, index.season)
        .filter(|s| !is_did_not_play(s))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    SeasonRecord {
        player: record.player.to_string(),
        season,
        source: record.label.to_string(),
        line: record.line,
        games_played: stats.get(Stat::G).unwrap_or_default(),
        stats,
    }
}

/// Clean every row of `table`, dropping rows without games or points and
/// rows below the games threshold.
pub fn clean(table: &RawTable, min_games: MinGames) -> (Vec<SeasonRecord>, CleanSummary) {
    let threshold = f64::from(min_games.get());
    let mut summary = CleanSummary::default();
    let mut records = Vec::new();

    // Rows arrive grouped by source, so the index is rebuilt only when the
    // header row changes.
    let mut columns: Option<(&[String], ColumnIndex)> = None;
    for raw in table.records() {
        summary.input_rows += 1;
        if columns.as_ref().is_none_or(|(headers, _)| *headers != raw.headers) {
            columns = Some((raw.headers, ColumnIndex::new(raw.headers)));
        }
        let Some((_, index)) = &columns else {
            continue;
        };
        let record = season_record(&raw, index);

        if record.stats.get(Stat::G).is_none() || record.stats.get(Stat::Pts).is_none() {
            debug!(
                "dropping {} line {} ({}): missing games or points",
                record.source, record.line, record.player
            );
            summary.dropped_incomplete += 1;
            continue;
        }

        if record.games_played < threshold {
            debug!(
                "dropping {} {} ({}): {} games below threshold {}",
                record.player, record.season, record.source, record.games_played, threshold
            );
            summary.dropped_below_threshold += 1;
            continue;
        }

        records.push(record);
    }

    summary.kept = records.len();
    info!(
        "Cleaned {} rows: kept {}, {} incomplete, {} below {} games",
        summary.input_rows,
        summary.kept,
        summary.dropped_incomplete,
        summary.dropped_below_threshold,
        threshold
    );

    (records, summary)
}
