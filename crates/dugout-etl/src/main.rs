//! `dugout` operator binary.
//!
//! Reads `dugout.toml` (or the path given with `--config`) plus `DUGOUT_*`
//! environment overrides, opens the warehouse, applies pending migrations and
//! runs one pipeline operation. Ctrl-C cancels the running operation; the
//! store rolls back whatever it was writing.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dugout_core::{game::GameType, reference::ConstantsKind};
use dugout_etl::{EtlConfig, Ingestor};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dugout historical baseball loader")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dugout.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Apply pending schema migrations and exit.
  Migrate,
  /// Load a Retrosheet game-log archive (e.g. gl2023.zip).
  GameLog {
    archive:   PathBuf,
    /// Tag written into `games.game_type`.
    #[arg(long, default_value = "regular")]
    game_type: GameType,
  },
  /// Load a Retrosheet plays archive.
  Plays { archive: PathBuf },
  /// Load a Retrosheet ejections archive.
  Ejections { archive: PathBuf },
  /// Load gameinfo.csv and plays.csv from a Negro Leagues data directory.
  NegroLeagues { dir: PathBuf },
  /// Load a published reference-constants CSV.
  Constants {
    path: PathBuf,
    /// `woba` or `park-factors`.
    #[arg(long)]
    kind: ConstantsKind,
  },
  /// Rebuild the win-expectancy table from loaded plays.
  WinExpectancy {
    /// Overrides `min_sample_size` from the configuration.
    #[arg(long)]
    min_sample_size: Option<i64>,
  },
  /// Print the dataset refresh ledger as JSON.
  Refreshes {
    /// Only this dataset.
    dataset: Option<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = EtlConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let ingestor = Ingestor::from_config(&config)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", config.database_path))?;

  let applied = ingestor.migrate().await.context("migration failed")?;

  // Ctrl-C cancels; a second one falls through to the default handler.
  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received; cancelling");
        cancel.cancel();
      }
    }
  });

  match cli.command {
    Command::Migrate => {
      tracing::info!(applied, "schema up to date");
    }
    Command::GameLog { archive, game_type } => {
      print_json(&ingestor.load_game_log(&cancel, &archive, game_type).await?)?;
    }
    Command::Plays { archive } => {
      print_json(&ingestor.load_plays(&cancel, &archive).await?)?;
    }
    Command::Ejections { archive } => {
      print_json(&ingestor.load_ejections(&cancel, &archive).await?)?;
    }
    Command::NegroLeagues { dir } => {
      print_json(&ingestor.load_negro_leagues(&cancel, &dir).await?)?;
    }
    Command::Constants { path, kind } => {
      print_json(&ingestor.load_external_constants(&cancel, &path, kind).await?)?;
    }
    Command::WinExpectancy { min_sample_size } => {
      let min = min_sample_size.unwrap_or(config.min_sample_size);
      let states = ingestor
        .build_win_expectancy(&cancel, min)
        .await
        .context("win expectancy build failed")?;
      tracing::info!(states, "win expectancy rebuilt");
    }
    Command::Refreshes { dataset: Some(dataset) } => {
      print_json(&ingestor.refresh(&dataset).await?)?;
    }
    Command::Refreshes { dataset: None } => {
      print_json(&ingestor.list_refreshes().await?)?;
    }
  }

  Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
