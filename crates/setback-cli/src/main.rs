// setback entry point.
//
// 1. Initialize tracing (stderr, so stdout stays clean for reports)
// 2. Load config (copying defaults on first run)
// 3. Build the source list: configured roster, or files given on the command line
// 4. Run the pipeline
// 5. Print text or JSON, optionally export the cleaned table

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use setback_core::config::{self, Config, MinGames, Selection, INJURY_YEAR_RANGE};
use setback_core::label::InjuryMap;
use setback_core::loader::{player_name_from_path, SourceSpec};
use setback_core::pipeline::{self, PipelineOptions};
use setback_core::report;

#[derive(Parser)]
#[command(name = "setback")]
#[command(about = "Compare players' on-court averages before and after an injury", long_about = None)]
struct Cli {
    /// Directory containing config/ and defaults/
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Minimum games played for a season to count (1-82)
    #[arg(long)]
    min_games: Option<i64>,

    /// Only analyze players in this position group
    #[arg(long)]
    position: Option<String>,

    /// Only analyze these players (repeatable)
    #[arg(long = "player")]
    players: Vec<String>,

    /// Injury year for an ad hoc file's player, as NAME=YEAR (repeatable)
    #[arg(long = "injury", value_parser = parse_injury)]
    injuries: Vec<(String, i32)>,

    /// Write the cleaned, labeled seasons to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print JSON instead of text tables
    #[arg(long, default_value = "false")]
    json: bool,

    /// Season CSVs to analyze instead of the configured roster
    files: Vec<PathBuf>,
}

fn parse_injury(arg: &str) -> Result<(String, i32), String> {
    let (name, year) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=YEAR, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing player name in '{arg}'"));
    }
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| format!("invalid year in '{arg}'"))?;
    if !INJURY_YEAR_RANGE.contains(&year) {
        return Err(format!(
            "injury year must be between {} and {}, got {year}",
            INJURY_YEAR_RANGE.start(),
            INJURY_YEAR_RANGE.end()
        ));
    }
    Ok((name.to_string(), year))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let selection = Selection {
        position: cli.position.clone(),
        players: cli.players.clone(),
    };

    let (sources, injuries, configured_min) = if cli.files.is_empty() {
        let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
        info!(
            "Config loaded: {} positions, {} players, min {} games",
            config.positions.len(),
            config.players().count(),
            config.min_games.get()
        );
        let sources = config.roster(&selection);
        (sources, merged_injuries(Some(&config), &cli.injuries), config.min_games)
    } else {
        // Ad hoc files still pick up injury years from the config when it exists.
        let config = match config::load_config_from(&cli.base_dir) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("no usable config for ad hoc files: {}", e);
                None
            }
        };
        let sources: Vec<SourceSpec> = cli
            .files
            .iter()
            .map(|path| SourceSpec::new(player_name_from_path(path), path))
            .filter(|spec| selection.includes_player(&spec.player))
            .collect();
        let min = config.as_ref().map(|c| c.min_games).unwrap_or_default();
        (sources, merged_injuries(config.as_ref(), &cli.injuries), min)
    };

    let min_games = match cli.min_games {
        Some(n) => MinGames::new(n).context("invalid --min-games")?,
        None => configured_min,
    };

    if injuries.is_empty() {
        warn!("no injury years known; every season counts as pre-injury");
    } else {
        info!("Injury years known for {} players", injuries.len());
    }
    for spec in &sources {
        if injuries.year_for(&spec.player).is_none() {
            warn!("no injury year for '{}'; all seasons count as pre-injury", spec.player);
        }
    }

    let options = PipelineOptions { min_games };
    // Skipped sources were already logged by the loader.
    let analysis = pipeline::run(&sources, &injuries, &options).context("analysis failed")?;

    if cli.json {
        println!("{}", report::to_json(&analysis)?);
    } else {
        print!("{}", report::render_text(&analysis));
    }

    if let Some(path) = &cli.export {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report::write_cleaned_csv(&analysis.records, file)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        info!("Exported {} seasons to {}", analysis.records.len(), path.display());
    }

    Ok(())
}

/// Injury years from the config, overridden by `--injury` flags.
fn merged_injuries(config: Option<&Config>, overrides: &[(String, i32)]) -> InjuryMap {
    let mut map = config.map(Config::injury_map).unwrap_or_default();
    for (name, year) in overrides {
        map.insert(name, *year);
    }
    map
}

/// Initialize tracing to stderr, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("setback_cli=info,setback_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
