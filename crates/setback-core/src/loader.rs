// Season CSV loading.
//
// Each source is one player's season-by-season table. Sources that cannot be
// opened, parsed, or that lack a required column are reported and skipped so
// the remaining players can still be analyzed. Short rows (a season that
// reads "Did not play" and stops) load as-is; absent trailing cells are
// treated as missing values downstream.

use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::{normalize_column, required_columns};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A player's season file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub player: String,
    pub path: PathBuf,
}

impl SourceSpec {
    pub fn new(player: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SourceSpec {
            player: player.into(),
            path: path.into(),
        }
    }
}

/// One data row kept as text, with its line number in the source.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: u64,
    pub cells: Vec<String>,
}

/// Everything read from one source. Headers are kept exactly as written.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub player: String,
    /// Path or other label identifying where the rows came from.
    pub label: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// The union of all loaded sources.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub sources: Vec<RawSource>,
}

/// Borrowed view of one row, tagged with its player.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub player: &'a str,
    pub label: &'a str,
    pub line: u64,
    pub headers: &'a [String],
    pub cells: &'a [String],
}

impl RawTable {
    /// Total number of data rows across sources.
    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rows of all sources, each tagged with its player.
    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.sources.iter().flat_map(|src| {
            src.rows.iter().map(move |row| RawRecord {
                player: &src.player,
                label: &src.label,
                line: row.line,
                headers: &src.headers,
                cells: &row.cells,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source not found {path}: {source}")]
    NotFound {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Unparseable { path: String, source: csv::Error },

    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: String, column: String },
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Read one source from any reader. `label` names it in errors.
pub fn load_reader<R: Read>(
    player: &str,
    label: &str,
    rdr: R,
) -> Result<RawSource, SourceError> {
    let unparseable = |e: csv::Error| SourceError::Unparseable {
        path: label.to_string(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()
        .map_err(unparseable)?
        .iter()
        .map(str::to_string)
        .collect();

    let normalized: Vec<String> = headers.iter().map(|h| normalize_column(h)).collect();
    if let Some(column) = required_columns().find(|c| !normalized.iter().any(|h| h == c)) {
        return Err(SourceError::MissingColumn {
            path: label.to_string(),
            column: column.to_string(),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(unparseable)?;
        let line = record.position().map_or(0, |p| p.line());
        rows.push(RawRow {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(RawSource {
        player: player.trim().to_string(),
        label: label.to_string(),
        headers,
        rows,
    })
}

/// Open and read one source file.
pub fn load_source(spec: &SourceSpec) -> Result<RawSource, SourceError> {
    let label = spec.path.display().to_string();
    let file = std::fs::File::open(&spec.path).map_err(|e| SourceError::NotFound {
        path: label.clone(),
        source: e,
    })?;
    load_reader(&spec.player, &label, file)
}

/// Load every source, keeping the ones that succeed.
///
/// Failures are logged and returned alongside the table; they never abort
/// the remaining sources.
pub fn load_all(specs: &[SourceSpec]) -> (RawTable, Vec<SourceError>) {
    let mut table = RawTable::default();
    let mut errors = Vec::new();

    for spec in specs {
        match load_source(spec) {
            Ok(source) => {
                info!(
                    "Loaded {} season rows for {} from {}",
                    source.rows.len(),
                    source.player,
                    source.label
                );
                table.sources.push(source);
            }
            Err(e) => {
                warn!("skipping source for '{}': {}", spec.player, e);
                errors.push(e);
            }
        }
    }

    (table, errors)
}

/// Display name from a file stem: `Derrick_Rose_Stats.csv` -> `Derrick Rose`.
pub fn player_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut words: Vec<&str> = stem
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() > 1 && words.last().is_some_and(|w| w.eq_ignore_ascii_case("stats")) {
        words.pop();
    }
    words.join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Season,Age,Tm,G,GS,MP,FG,FGA,FG%,3P,3PA,3P%,2P,2PA,2P%,eFG%,FT,FTA,FT%,ORB,DRB,TRB,AST,STL,BLK,TOV,PF,PTS";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn loads_rows_and_tags_player() {
        let text = csv_with(&[
            "2010-11,22,CHI,81,81,37.4,8.8,19.7,.445,1.6,4.8,.332,7.2,14.9,.481,.485,6.1,7.4,.858,1.0,3.1,4.1,7.7,1.0,0.6,3.4,1.7,25.0",
            "2011-12,23,CHI,39,39,35.3,8.3,19.7,.435,1.4,4.4,.312,7.0,15.3,.459,.469,5.5,6.4,.812,0.7,2.7,3.4,7.9,0.9,0.7,3.1,1.3,21.8",
        ]);
        let source = load_reader("  Derrick Rose ", "rose.csv", text.as_bytes()).unwrap();

        assert_eq!(source.player, "Derrick Rose");
        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.headers[0], "Season");
        assert_eq!(source.rows[0].cells[0], "2010-11");
        assert_eq!(source.rows[1].line, 3);
    }

    #[test]
    fn header_whitespace_and_case_still_validate() {
        let header = HEADER
            .split(',')
            .map(|h| format!("  {} ", h.to_uppercase()))
            .collect::<Vec<_>>()
            .join(",");
        let text = format!("{header}\n");
        let source = load_reader("P", "padded.csv", text.as_bytes()).unwrap();
        assert!(source.rows.is_empty());
    }

    #[test]
    fn missing_column_is_named() {
        let text = HEADER.replace(",TOV", "");
        let err = load_reader("P", "no_tov.csv", text.as_bytes()).unwrap_err();
        match err {
            SourceError::MissingColumn { path, column } => {
                assert_eq!(path, "no_tov.csv");
                assert_eq!(column, "tov");
            }
            other => panic!("expected MissingColumn, got: {other}"),
        }
    }

    #[test]
    fn missing_season_reported_first() {
        let text = HEADER.replace("Season,", "Year,");
        let err = load_reader("P", "x.csv", text.as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "season"));
    }

    #[test]
    fn empty_input_is_missing_season() {
        let err = load_reader("P", "empty.csv", "".as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "season"));
    }

    #[test]
    fn short_row_loads_alongside_full_rows() {
        let text = csv_with(&[
            "2010-11,22,CHI,81,81,37.4,8.8,19.7,.445,1.6,4.8,.332,7.2,14.9,.481,.485,6.1,7.4,.858,1.0,3.1,4.1,7.7,1.0,0.6,3.4,1.7,25.0",
            "2012-13,24,CHI,Did not play",
        ]);
        let source = load_reader("Derrick Rose", "rose.csv", text.as_bytes()).unwrap();

        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.rows[0].cells.len(), source.headers.len());
        assert_eq!(source.rows[1].cells, vec!["2012-13", "24", "CHI", "Did not play"]);
        assert_eq!(source.rows[1].line, 3);
    }

    #[test]
    fn invalid_utf8_is_unparseable() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"\n2010-11,\xff\xfe,CHI");
        let err = load_reader("P", "binary.csv", bytes.as_slice()).unwrap_err();
        match err {
            SourceError::Unparseable { path, .. } => assert_eq!(path, "binary.csv"),
            other => panic!("expected Unparseable, got: {other}"),
        }
    }

    #[test]
    fn missing_file_is_not_found_and_others_still_load() {
        let good = std::env::temp_dir().join("setback_loader_good.csv");
        std::fs::write(&good, csv_with(&["2015-16,27,MIN,76,76,30.5,3.1,8.0,.374,0.9,2.8,.326,2.1,5.3,.398,.431,2.6,3.1,.840,0.5,3.8,4.3,8.7,2.1,0.1,2.6,2.3,10.1"])).unwrap();
        let specs = vec![
            SourceSpec::new("Ghost", std::env::temp_dir().join("setback_does_not_exist.csv")),
            SourceSpec::new("Ricky Rubio", &good),
        ];

        let (table, errors) = load_all(&specs);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SourceError::NotFound { .. }));
        assert_eq!(table.sources.len(), 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records().next().map(|r| r.player), Some("Ricky Rubio"));

        let _ = std::fs::remove_file(&good);
    }

    #[test]
    fn player_name_from_file_stem() {
        assert_eq!(player_name_from_path(Path::new("data/Derrick_Rose_Stats.csv")), "Derrick Rose");
        assert_eq!(player_name_from_path(Path::new("Klay Thompson.csv")), "Klay Thompson");
        assert_eq!(player_name_from_path(Path::new("stats.csv")), "stats");
    }
}
