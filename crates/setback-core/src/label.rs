// Pre/post-injury cohort labeling.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::clean::SeasonRecord;

/// Which side of the injury a season falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Cohort {
    #[serde(rename = "Pre-Injury")]
    Pre,
    #[serde(rename = "Post-Injury")]
    Post,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::Pre, Cohort::Post];

    pub fn label(self) -> &'static str {
        match self {
            Cohort::Pre => "Pre-Injury",
            Cohort::Post => "Post-Injury",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Injury year per player. Keys are trimmed and lowercased.
#[derive(Debug, Clone, Default)]
pub struct InjuryMap {
    years: HashMap<String, i32>,
}

fn key(player: &str) -> String {
    player.trim().to_lowercase()
}

impl InjuryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: &str, year: i32) {
        self.years.insert(key(player), year);
    }

    pub fn year_for(&self, player: &str) -> Option<i32> {
        self.years.get(&key(player)).copied()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Cohort for a season of `player` starting in `season_year`.
    /// Players without an injury year are always pre-injury.
    pub fn cohort(&self, player: &str, season_year: i32) -> Cohort {
        match self.year_for(player) {
            Some(injury_year) if season_year >= injury_year => Cohort::Post,
            _ => Cohort::Pre,
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, i32)> for InjuryMap {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        let mut map = InjuryMap::new();
        for (player, year) in iter {
            map.insert(player.as_ref(), year);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error(
        "season '{season}' for {player} ({source_label} line {line}) does not start with a 4-digit year"
    )]
    MalformedSeason {
        player: String,
        season: String,
        source_label: String,
        line: u64,
    },
}

/// A cleaned season with its cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: SeasonRecord,
    pub season_year: i32,
    pub cohort: Cohort,
}

/// Year from the first four characters of a season such as `2011-12`.
pub fn season_year(season: &str) -> Option<i32> {
    let prefix = season.trim().get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Label every record, failing on the first season without a leading year.
pub fn label(
    records: Vec<SeasonRecord>,
    injuries: &InjuryMap,
) -> Result<Vec<LabeledRecord>, LabelError> {
    records
        .into_iter()
        .map(|record| {
            let Some(year) = season_year(&record.season) else {
                return Err(LabelError::MalformedSeason {
                    player: record.player,
                    season: record.season,
                    source_label: record.source,
                    line: record.line,
                });
            };
            let cohort = injuries.cohort(&record.player, year);
            Ok(LabeledRecord {
                record,
                season_year: year,
                cohort,
            })
        })
        .collect()
}
