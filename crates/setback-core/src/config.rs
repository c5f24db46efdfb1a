// Configuration loading and validation (config/setback.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::label::InjuryMap;
use crate::loader::SourceSpec;

/// File name of the roster/analysis config inside `config/`.
pub const CONFIG_FILE: &str = "setback.toml";

/// Accepted range for the minimum-games threshold (one regular season).
pub const MIN_GAMES_RANGE: std::ops::RangeInclusive<i64> = 1..=82;

/// Accepted range for an injury year.
pub const INJURY_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// MinGames
// ---------------------------------------------------------------------------

/// Minimum games played for a season to count. Always within 1-82.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinGames(u32);

impl MinGames {
    pub const DEFAULT: MinGames = MinGames(65);

    pub fn new(value: i64) -> Result<Self, ConfigError> {
        if !MIN_GAMES_RANGE.contains(&value) {
            return Err(ConfigError::ValidationError {
                field: "analysis.min_games_played".into(),
                message: format!(
                    "must be between {} and {} inclusive, got {value}",
                    MIN_GAMES_RANGE.start(),
                    MIN_GAMES_RANGE.end()
                ),
            });
        }
        Ok(MinGames(value as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for MinGames {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// setback.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    analysis: AnalysisSection,
    #[serde(default)]
    positions: Vec<PositionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalysisSection {
    #[serde(default = "default_min_games_played")]
    min_games_played: i64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        AnalysisSection {
            min_games_played: default_min_games_played(),
        }
    }
}

fn default_min_games_played() -> i64 {
    MinGames::DEFAULT.get() as i64
}

/// A position group and its players, in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionConfig {
    pub name: String,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
}

/// One tracked player: where their seasons live and when they were hurt.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    /// CSV path, relative to the base directory unless absolute.
    pub source: String,
    pub injury_year: i32,
}

/// Assembled, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub min_games: MinGames,
    pub positions: Vec<PositionConfig>,
    /// Directory that relative `source` paths resolve against.
    pub base_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Restricts a run to one position group and/or a set of players.
/// Empty fields mean "no restriction". Names compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub position: Option<String>,
    pub players: Vec<String>,
}

impl Selection {
    pub fn includes_position(&self, position: &str) -> bool {
        self.position
            .as_deref()
            .is_none_or(|p| p.trim().eq_ignore_ascii_case(position.trim()))
    }

    pub fn includes_player(&self, player: &str) -> bool {
        self.players.is_empty()
            || self
                .players
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(player.trim()))
    }
}

impl Config {
    /// Every configured player, in position then file order.
    pub fn players(&self) -> impl Iterator<Item = (&PositionConfig, &PlayerEntry)> {
        self.positions
            .iter()
            .flat_map(|pos| pos.players.iter().map(move |p| (pos, p)))
    }

    /// Injury years for every configured player, regardless of selection.
    pub fn injury_map(&self) -> InjuryMap {
        self.players()
            .map(|(_, p)| (p.name.clone(), p.injury_year))
            .collect()
    }

    /// Sources for the selected players, with paths resolved against `base_dir`.
    pub fn roster(&self, selection: &Selection) -> Vec<SourceSpec> {
        self.players()
            .filter(|(pos, p)| {
                selection.includes_position(&pos.name) && selection.includes_player(&p.name)
            })
            .map(|(_, p)| SourceSpec::new(p.name.clone(), self.resolve(&p.source)))
            .collect()
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/setback.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path, base_dir)
}

/// Copy any missing defaults into `config/`, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    for copied in ensure_config_files(base_dir)? {
        info!("Copied default config to {}", copied.display());
    }
    load_config_from(base_dir)
}

fn parse_config(text: &str, path: &Path, base_dir: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        min_games: MinGames::new(file.analysis.min_games_played)?,
        positions: file.positions,
        base_dir: base_dir.to_path_buf(),
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or pass --base-dir",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.positions.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "positions".into(),
            message: "at least one position is required".into(),
        });
    }

    let mut seen: Vec<String> = Vec::new();
    for (i, pos) in config.positions.iter().enumerate() {
        if pos.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("positions[{i}].name"),
                message: "must not be empty".into(),
            });
        }

        for (j, player) in pos.players.iter().enumerate() {
            let field = |name: &str| format!("positions[{i}].players[{j}].{name}");

            let key = player.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::ValidationError {
                    field: field("name"),
                    message: "must not be empty".into(),
                });
            }
            if seen.contains(&key) {
                return Err(ConfigError::ValidationError {
                    field: field("name"),
                    message: format!("player '{}' is listed more than once", player.name.trim()),
                });
            }
            seen.push(key);

            if player.source.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: field("source"),
                    message: "must not be empty".into(),
                });
            }

            if !INJURY_YEAR_RANGE.contains(&player.injury_year) {
                return Err(ConfigError::ValidationError {
                    field: field("injury_year"),
                    message: format!(
                        "must be between {} and {} inclusive, got {}",
                        INJURY_YEAR_RANGE.start(),
                        INJURY_YEAR_RANGE.end(),
                        player.injury_year
                    ),
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
