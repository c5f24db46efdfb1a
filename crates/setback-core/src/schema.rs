// Column schema for season-by-season box score CSVs.
//
// Column names are normalized once (trim + lowercase) and every lookup after
// that point uses the normalized form.

use serde::Serialize;
use std::fmt;

/// Name of the text column carrying the season identifier (`2011-12`).
pub const SEASON_COLUMN: &str = "season";

/// Placeholder some exports write into stat cells for seasons missed entirely.
pub const DID_NOT_PLAY: &str = "Did not play";

/// Normalize a header name: trim surrounding whitespace and lowercase.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// One of the declared numeric columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stat {
    #[serde(rename = "g")]
    G,
    #[serde(rename = "gs")]
    Gs,
    #[serde(rename = "mp")]
    Mp,
    #[serde(rename = "fg")]
    Fg,
    #[serde(rename = "fga")]
    Fga,
    #[serde(rename = "fg%")]
    FgPct,
    #[serde(rename = "3p")]
    ThreeP,
    #[serde(rename = "3pa")]
    ThreePa,
    #[serde(rename = "3p%")]
    ThreePct,
    #[serde(rename = "2p")]
    TwoP,
    #[serde(rename = "2pa")]
    TwoPa,
    #[serde(rename = "2p%")]
    TwoPct,
    #[serde(rename = "efg%")]
    EfgPct,
    #[serde(rename = "ft")]
    Ft,
    #[serde(rename = "fta")]
    Fta,
    #[serde(rename = "ft%")]
    FtPct,
    #[serde(rename = "orb")]
    Orb,
    #[serde(rename = "drb")]
    Drb,
    #[serde(rename = "trb")]
    Trb,
    #[serde(rename = "ast")]
    Ast,
    #[serde(rename = "stl")]
    Stl,
    #[serde(rename = "blk")]
    Blk,
    #[serde(rename = "tov")]
    Tov,
    #[serde(rename = "pf")]
    Pf,
    #[serde(rename = "pts")]
    Pts,
}

impl Stat {
    pub const COUNT: usize = 25;

    /// Every numeric column, in declared order.
    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::G,
        Stat::Gs,
        Stat::Mp,
        Stat::Fg,
        Stat::Fga,
        Stat::FgPct,
        Stat::ThreeP,
        Stat::ThreePa,
        Stat::ThreePct,
        Stat::TwoP,
        Stat::TwoPa,
        Stat::TwoPct,
        Stat::EfgPct,
        Stat::Ft,
        Stat::Fta,
        Stat::FtPct,
        Stat::Orb,
        Stat::Drb,
        Stat::Trb,
        Stat::Ast,
        Stat::Stl,
        Stat::Blk,
        Stat::Tov,
        Stat::Pf,
        Stat::Pts,
    ];

    /// The on-court comparison set. Excludes games, starts, minutes and fouls.
    /// The order here is the tie-break order for the most-changed stat.
    pub const ON_COURT: [Stat; 21] = [
        Stat::Fg,
        Stat::Fga,
        Stat::FgPct,
        Stat::ThreeP,
        Stat::ThreePa,
        Stat::ThreePct,
        Stat::TwoP,
        Stat::TwoPa,
        Stat::TwoPct,
        Stat::EfgPct,
        Stat::Ft,
        Stat::Fta,
        Stat::FtPct,
        Stat::Orb,
        Stat::Drb,
        Stat::Trb,
        Stat::Ast,
        Stat::Stl,
        Stat::Blk,
        Stat::Tov,
        Stat::Pts,
    ];

    /// Normalized column name as it appears after header cleaning.
    pub fn column(self) -> &'static str {
        match self {
            Stat::G => "g",
            Stat::Gs => "gs",
            Stat::Mp => "mp",
            Stat::Fg => "fg",
            Stat::Fga => "fga",
            Stat::FgPct => "fg%",
            Stat::ThreeP => "3p",
            Stat::ThreePa => "3pa",
            Stat::ThreePct => "3p%",
            Stat::TwoP => "2p",
            Stat::TwoPa => "2pa",
            Stat::TwoPct => "2p%",
            Stat::EfgPct => "efg%",
            Stat::Ft => "ft",
            Stat::Fta => "fta",
            Stat::FtPct => "ft%",
            Stat::Orb => "orb",
            Stat::Drb => "drb",
            Stat::Trb => "trb",
            Stat::Ast => "ast",
            Stat::Stl => "stl",
            Stat::Blk => "blk",
            Stat::Tov => "tov",
            Stat::Pf => "pf",
            Stat::Pts => "pts",
        }
    }

    /// Position of this stat in [`Stat::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a stat by its normalized column name.
    pub fn from_column(name: &str) -> Option<Stat> {
        Stat::ALL.iter().copied().find(|s| s.column() == name)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Columns a source must carry (after normalization) to be usable.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    std::iter::once(SEASON_COLUMN).chain(Stat::ALL.iter().map(|s| s.column()))
}

// ---------------------------------------------------------------------------
// StatLine
// ---------------------------------------------------------------------------

/// Coerced numeric values for one season, indexed by [`Stat`].
/// Every present value is finite.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatLine {
    values: [Option<f64>; Stat::COUNT],
}

impl StatLine {
    pub fn get(&self, stat: Stat) -> Option<f64> {
        self.values[stat.index()]
    }

    /// Store a value. Non-finite values are stored as missing.
    pub fn set(&mut self, stat: Stat, value: Option<f64>) {
        self.values[stat.index()] = value.filter(|v| v.is_finite());
    }

    /// Iterate `(stat, value)` in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, Option<f64>)> + '_ {
        Stat::ALL.iter().map(move |&s| (s, self.get(s)))
    }
}
