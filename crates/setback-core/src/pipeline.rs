// The full load -> clean -> label -> aggregate pass.
//
// `analyze` is pure over an already-loaded table; `run` adds the file reads.
// Nothing is cached between calls.

use tracing::info;

use crate::aggregate::{aggregate, AggregateError, ChangeReport, CohortStats};
use crate::clean::{clean, CleanSummary};
use crate::config::MinGames;
use crate::label::{label, InjuryMap, LabelError, LabeledRecord};
use crate::loader::{load_all, RawTable, SourceError, SourceSpec};
use crate::schema::Stat;

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub min_games: MinGames,
}

/// Result of one run.
#[derive(Debug)]
pub struct Analysis {
    pub records: Vec<LabeledRecord>,
    pub summary: CleanSummary,
    pub cohorts: CohortStats,
    pub changes: ChangeReport,
    /// Sources that failed to load and were left out.
    pub skipped: Vec<SourceError>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no player sources were selected")]
    NoSourcesProvided,

    #[error("no data available: none of the {attempted} sources could be loaded")]
    NoData { attempted: usize },

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Clean, label and aggregate a loaded table over the on-court stats.
pub fn analyze(
    table: &RawTable,
    injuries: &InjuryMap,
    options: &PipelineOptions,
) -> Result<Analysis, PipelineError> {
    if table.sources.is_empty() {
        return Err(PipelineError::NoData { attempted: 0 });
    }

    let (cleaned, summary) = clean(table, options.min_games);
    let records = label(cleaned, injuries)?;
    let years = records.iter().map(|r| r.season_year);
    if let (Some(first), Some(last)) = (years.clone().min(), years.max()) {
        info!("Labeled {} seasons from {} to {}", records.len(), first, last);
    }
    let (cohorts, changes) = aggregate(&records, &Stat::ON_COURT)?;

    info!(
        "Compared {} pre-injury and {} post-injury seasons; most changed: {} ({:+.2})",
        cohorts.pre.records,
        cohorts.post.records,
        changes.most_changed.stat,
        changes.most_changed.delta
    );

    Ok(Analysis {
        records,
        summary,
        cohorts,
        changes,
        skipped: Vec::new(),
    })
}

/// Load every source and analyze whatever loaded.
pub fn run(
    sources: &[SourceSpec],
    injuries: &InjuryMap,
    options: &PipelineOptions,
) -> Result<Analysis, PipelineError> {
    if sources.is_empty() {
        return Err(PipelineError::NoSourcesProvided);
    }

    let (table, skipped) = load_all(sources);
    if table.sources.is_empty() {
        return Err(PipelineError::NoData {
            attempted: sources.len(),
        });
    }

    let mut analysis = analyze(&table, injuries, options)?;
    analysis.skipped = skipped;
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Cohort;
    use crate::loader::load_reader;

    const HEADER: &str = "Season,G,GS,MP,FG,FGA,FG%,3P,3PA,3P%,2P,2PA,2P%,eFG%,FT,FTA,FT%,ORB,DRB,TRB,AST,STL,BLK,TOV,PF,PTS";

    fn row(season: &str, g: u32, pts: f64) -> String {
        let mut cells = vec![season.to_string(), g.to_string()];
        cells.extend(std::iter::repeat("2".to_string()).take(23));
        cells.push(pts.to_string());
        cells.join(",")
    }

    fn table(player: &str, rows: &[String]) -> RawTable {
        let text = format!("{HEADER}\n{}", rows.join("\n"));
        RawTable {
            sources: vec![load_reader(player, "mem.csv", text.as_bytes()).unwrap()],
        }
    }

    #[test]
    fn analyze_splits_on_injury_year() {
        let t = table(
            "Rose",
            &[row("2010-11", 81, 25.0), row("2012-13", 70, 15.0), row("2013-14", 10, 99.0)],
        );
        let injuries: InjuryMap = [("rose", 2012)].into_iter().collect();
        let analysis = analyze(&t, &injuries, &PipelineOptions::default()).unwrap();

        assert_eq!(analysis.summary.dropped_below_threshold, 1);
        assert_eq!(analysis.records.len(), 2);
        assert_eq!(analysis.records[1].cohort, Cohort::Post);
        assert_eq!(analysis.cohorts.pre.mean(Stat::Pts), Some(25.0));
        assert_eq!(analysis.cohorts.post.mean(Stat::Pts), Some(15.0));
        assert_eq!(analysis.changes.most_changed.stat, Stat::Pts);
        assert_eq!(analysis.changes.most_changed.delta, -10.0);
    }

    #[test]
    fn unmapped_player_yields_empty_post_cohort() {
        let t = table("Nobody", &[row("2010-11", 81, 25.0), row("2015-16", 70, 15.0)]);
        let err = analyze(&t, &InjuryMap::new(), &PipelineOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Aggregate(AggregateError::EmptyCohort(Cohort::Post))
        ));
    }

    #[test]
    fn empty_table_is_no_data() {
        let err = analyze(&RawTable::default(), &InjuryMap::new(), &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoData { attempted: 0 }));
    }

    #[test]
    fn run_without_sources_halts() {
        let err = run(&[], &InjuryMap::new(), &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NoSourcesProvided));
    }

    #[test]
    fn run_with_only_missing_files_is_no_data() {
        let sources = vec![SourceSpec::new("Ghost", "/definitely/not/here.csv")];
        let err = run(&sources, &InjuryMap::new(), &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NoData { attempted: 1 }));
    }
}
