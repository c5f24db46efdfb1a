// Cohort averages and post-minus-pre changes.

use serde::Serialize;
use std::fmt;

use crate::label::{Cohort, LabeledRecord};
use crate::schema::Stat;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A value for one stat. `None` when no record carried the stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatValue {
    pub stat: Stat,
    pub value: Option<f64>,
}

/// Averages for one cohort, in the order of the requested stat list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMeans {
    pub cohort: Cohort,
    pub records: usize,
    pub means: Vec<StatValue>,
}

impl CohortMeans {
    pub fn mean(&self, stat: Stat) -> Option<f64> {
        self.means.iter().find(|m| m.stat == stat).and_then(|m| m.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortStats {
    pub pre: CohortMeans,
    pub post: CohortMeans,
}

impl CohortStats {
    pub fn get(&self, cohort: Cohort) -> &CohortMeans {
        match cohort {
            Cohort::Pre => &self.pre,
            Cohort::Post => &self.post,
        }
    }

    /// The stats averaged, in order.
    pub fn stats(&self) -> impl Iterator<Item = Stat> + '_ {
        self.pre.means.iter().map(|m| m.stat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increased,
    Decreased,
    NoChange,
}

impl Direction {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Increased
        } else if delta < 0.0 {
            Direction::Decreased
        } else {
            Direction::NoChange
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Increased => "increased",
            Direction::Decreased => "decreased",
            Direction::NoChange => "no change",
        })
    }
}

/// The stat whose average moved the most.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MostChanged {
    pub stat: Stat,
    pub delta: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    /// Post-injury mean minus pre-injury mean, per stat.
    pub deltas: Vec<StatValue>,
    pub most_changed: MostChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("no {0} seasons to average; cannot compare cohorts")]
    EmptyCohort(Cohort),

    #[error("no stat has values in both cohorts")]
    NoComparableStats,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Arithmetic mean, summed in sorted order so the result does not depend on
/// input order. A sum that overflows yields `None`.
fn mean(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n).filter(|m| m.is_finite())
}

fn cohort_means(records: &[LabeledRecord], cohort: Cohort, stats: &[Stat]) -> CohortMeans {
    let members: Vec<&LabeledRecord> = records.iter().filter(|r| r.cohort == cohort).collect();
    let means = stats
        .iter()
        .map(|&stat| StatValue {
            stat,
            value: mean(members.iter().filter_map(|r| r.record.stats.get(stat)).collect()),
        })
        .collect();
    CohortMeans {
        cohort,
        records: members.len(),
        means,
    }
}

/// Average each stat within each cohort. Both cohorts must be non-empty.
pub fn cohort_stats(records: &[LabeledRecord], stats: &[Stat]) -> Result<CohortStats, AggregateError> {
    let pre = cohort_means(records, Cohort::Pre, stats);
    let post = cohort_means(records, Cohort::Post, stats);
    for side in [&pre, &post] {
        if side.records == 0 {
            return Err(AggregateError::EmptyCohort(side.cohort));
        }
    }
    Ok(CohortStats { pre, post })
}

/// Per-stat change and the largest absolute change. Ties keep the earlier stat.
pub fn change_report(stats: &CohortStats) -> Result<ChangeReport, AggregateError> {
    let deltas: Vec<StatValue> = stats
        .pre
        .means
        .iter()
        .zip(&stats.post.means)
        .map(|(pre, post)| StatValue {
            stat: pre.stat,
            value: match (pre.value, post.value) {
                (Some(a), Some(b)) => Some(b - a).filter(|d| d.is_finite()),
                _ => None,
            },
        })
        .collect();

    let mut best: Option<(Stat, f64)> = None;
    for entry in &deltas {
        let Some(delta) = entry.value else {
            continue;
        };
        if best.is_none_or(|(_, b)| delta.abs() > b.abs()) {
            best = Some((entry.stat, delta));
        }
    }
    let (stat, delta) = best.ok_or(AggregateError::NoComparableStats)?;

    Ok(ChangeReport {
        deltas,
        most_changed: MostChanged {
            stat,
            delta,
            direction: Direction::of(delta),
        },
    })
}

/// Cohort averages and their change report in one step.
pub fn aggregate(
    records: &[LabeledRecord],
    stats: &[Stat],
) -> Result<(CohortStats, ChangeReport), AggregateError> {
    let cohorts = cohort_stats(records, stats)?;
    let changes = change_report(&cohorts)?;
    Ok((cohorts, changes))
}
