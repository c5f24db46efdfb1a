// Plain-text tables, CSV export and JSON output for an analysis.

use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

use crate::aggregate::{ChangeReport, CohortStats};
use crate::clean::CleanSummary;
use crate::label::{Cohort, LabeledRecord};
use crate::pipeline::Analysis;
use crate::schema::Stat;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

const STAT_WIDTH: usize = 6;
const VALUE_WIDTH: usize = 18;

fn fmt_value(value: Option<f64>, signed: bool) -> String {
    match value {
        Some(v) if signed => format!("{v:+.3}"),
        Some(v) => format!("{v:.3}"),
        None => "-".to_string(),
    }
}

/// Stats as rows, cohorts as columns.
pub fn cohort_table(stats: &CohortStats) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<STAT_WIDTH$}", "stat");
    for cohort in Cohort::ALL {
        let header = format!("{} (n={})", cohort, stats.get(cohort).records);
        let _ = write!(out, "{header:>VALUE_WIDTH$}");
    }
    out.push('\n');

    for stat in stats.stats() {
        let _ = write!(out, "{:<STAT_WIDTH$}", stat.column());
        for cohort in Cohort::ALL {
            let cell = fmt_value(stats.get(cohort).mean(stat), false);
            let _ = write!(out, "{cell:>VALUE_WIDTH$}");
        }
        out.push('\n');
    }
    out
}

/// Signed post-minus-pre change per stat.
pub fn change_table(report: &ChangeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<STAT_WIDTH$}{:>VALUE_WIDTH$}", "stat", "change");
    for entry in &report.deltas {
        let cell = fmt_value(entry.value, true);
        let _ = writeln!(out, "{:<STAT_WIDTH$}{cell:>VALUE_WIDTH$}", entry.stat.column());
    }
    out
}

pub fn highlight(report: &ChangeReport) -> String {
    let top = &report.most_changed;
    format!(
        "Statistic with the most total change: {}\nTotal Change Value: {:.2} ({})",
        top.stat, top.delta, top.direction
    )
}

/// Full text report: both tables and the highlighted change.
pub fn render_text(analysis: &Analysis) -> String {
    let mut out = String::new();
    out.push_str("Combined Pre/Post-Injury On-Court Averages:\n");
    out.push_str(&cohort_table(&analysis.cohorts));
    out.push_str("\nTotal Changes (Post-Injury - Pre-Injury):\n");
    out.push_str(&change_table(&analysis.changes));
    out.push('\n');
    out.push_str(&highlight(&analysis.changes));
    out.push('\n');
    out
}

/// Write the cleaned, labeled seasons as CSV. Missing values are empty cells.
pub fn write_cleaned_csv<W: Write>(records: &[LabeledRecord], writer: W) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["player", "season", "injury_status"];
    header.extend(Stat::ALL.iter().map(|s| s.column()));
    wtr.write_record(&header)?;

    for labeled in records {
        let r = &labeled.record;
        let mut row = vec![
            r.player.clone(),
            r.season.clone(),
            labeled.cohort.label().to_string(),
        ];
        row.extend(
            r.stats
                .iter()
                .map(|(_, v)| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a CleanSummary,
    cohorts: &'a CohortStats,
    changes: &'a ChangeReport,
    skipped: Vec<String>,
}

/// Pretty JSON of the cleaning summary, cohort stats and changes.
pub fn to_json(analysis: &Analysis) -> Result<String, ReportError> {
    let report = JsonReport {
        summary: &analysis.summary,
        cohorts: &analysis.cohorts,
        changes: &analysis.changes,
        skipped: analysis.skipped.iter().map(|e| e.to_string()).collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::clean::SeasonRecord;
    use crate::schema::StatLine;

    fn labeled(season: &str, cohort: Cohort, pts: f64, ast: Option<f64>) -> LabeledRecord {
        let mut stats = StatLine::default();
        stats.set(Stat::G, Some(70.0));
        stats.set(Stat::Pts, Some(pts));
        stats.set(Stat::Ast, ast);
        LabeledRecord {
            record: SeasonRecord {
                player: "Rajon Rondo".into(),
                season: season.into(),
                source: "rondo.csv".into(),
                line: 2,
                games_played: 70.0,
                stats,
            },
            season_year: 2000,
            cohort,
        }
    }

    fn analysis() -> Analysis {
        let records = vec![
            labeled("2011-12", Cohort::Pre, 11.9, Some(11.7)),
            labeled("2014-15", Cohort::Post, 8.1, Some(10.8)),
        ];
        let (cohorts, changes) = aggregate(&records, &[Stat::Ast, Stat::Pts]).unwrap();
        Analysis {
            records,
            summary: CleanSummary::default(),
            cohorts,
            changes,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn cohort_table_lists_each_stat() {
        let text = cohort_table(&analysis().cohorts);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Pre-Injury (n=1)"));
        assert!(lines[0].contains("Post-Injury (n=1)"));
        assert!(lines[1].starts_with("ast"));
        assert!(lines[1].contains("11.700"));
        assert!(lines[2].contains("8.100"));
    }

    #[test]
    fn change_table_is_signed() {
        let text = change_table(&analysis().changes);
        assert!(text.contains("-0.900"));
        assert!(text.contains("-3.800"));
    }

    #[test]
    fn highlight_names_stat_and_direction() {
        let text = highlight(&analysis().changes);
        assert_eq!(
            text,
            "Statistic with the most total change: pts\nTotal Change Value: -3.80 (decreased)"
        );
    }

    #[test]
    fn render_text_has_all_sections() {
        let text = render_text(&analysis());
        assert!(text.starts_with("Combined Pre/Post-Injury On-Court Averages:"));
        assert!(text.contains("Total Changes (Post-Injury - Pre-Injury):"));
        assert!(text.contains("Statistic with the most total change: pts"));
    }

    #[test]
    fn cleaned_csv_has_labels_and_empty_missing_cells() {
        let mut records = analysis().records;
        records.push(labeled("2015-16", Cohort::Post, 11.9, None));

        let mut buf = Vec::new();
        write_cleaned_csv(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("player,season,injury_status,g,gs,mp,fg"));
        assert!(lines[0].ends_with(",pf,pts"));
        assert!(lines[1].starts_with("Rajon Rondo,2011-12,Pre-Injury,70,"));
        assert!(lines[1].ends_with(",11.9"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let ast_col = 3 + Stat::Ast.index();
        assert_eq!(&rows[0][ast_col], "11.7");
        assert_eq!(&rows[2][ast_col], "");
        assert_eq!(&rows[2][2], "Post-Injury");
    }

    #[test]
    fn json_uses_column_names_and_labels() {
        let json = to_json(&analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["changes"]["most_changed"]["stat"], "pts");
        assert_eq!(value["changes"]["most_changed"]["direction"], "decreased");
        assert_eq!(value["cohorts"]["post"]["cohort"], "Post-Injury");
        assert_eq!(value["cohorts"]["pre"]["means"][0]["stat"], "ast");
        assert!(value["skipped"].as_array().unwrap().is_empty());
    }

    #[test]
    fn json_lists_each_skipped_source_once() {
        let mut a = analysis();
        a.skipped.push(crate::loader::SourceError::MissingColumn {
            path: "data/no_tov.csv".into(),
            column: "tov".into(),
        });
        let value: serde_json::Value = serde_json::from_str(&to_json(&a).unwrap()).unwrap();
        let skipped = value["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0], "data/no_tov.csv is missing required column `tov`");
        assert!(!render_text(&a).contains("no_tov"));
    }
}
