//! Orchestration for the Dugout pipeline.
//!
//! [`Ingestor`] is the one entry point callers use: each `load_*` operation
//! extracts and transforms its source on a blocking thread, spools the
//! canonical CSV to a temporary file, hands that to the store's stage-and-merge
//! loader and finally records the dataset refresh. Loads of the same dataset
//! are serialised; different datasets may proceed concurrently.

pub mod config;
pub mod error;

pub use config::EtlConfig;
pub use error::{Error, Result};

use std::{
  collections::{BTreeMap, HashMap},
  fs::File,
  io::{self, BufReader, BufWriter, Read, Write as _},
  path::Path,
  sync::Arc,
};

use dugout_core::{
  game::GameType,
  migration::MigrationSource,
  reference::{ConstantsKind, ParkLookup, TeamLookup},
  refresh::DatasetRefresh,
  schema::{ConflictPolicy, GAMES, NEGRO_LEAGUES_TAG_COLUMNS, PLAYS},
  win_expectancy::EraRange,
};
use dugout_store_sqlite::{DirMigrations, EmbeddedMigrations, SqliteStore, StageMerge};
use dugout_transform::{
  ArchiveMember, EjectionsTransform, GameLogTransform, NegroLeaguesGamesTransform,
  ParkFactorsTransform, PlaysTransform, RecordTransform, TeamLeagues, TeamParks,
  WobaConstantsTransform,
};
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const GAME_LOG_SUFFIXES: &[&str] = &[".txt"];
const CSV_SUFFIXES: &[&str] = &[".csv"];

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Outcome of one successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  pub dataset: String,
  /// Data rows read from the source file.
  pub rows:    u64,
  /// Rows the merge inserted or updated; conflicts skipped are not counted.
  /// This is the count the refresh ledger records.
  pub merged:  u64,
}

/// The Negro Leagues directory holds two optional files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NegroLeaguesReport {
  pub games: Option<LoadReport>,
  pub plays: Option<LoadReport>,
}

/// How a job's source is read.
#[derive(Debug, Clone, Copy)]
enum Input {
  /// The first archive member ending in one of these suffixes.
  Archive(&'static [&'static str]),
  /// A plain file on disk.
  File,
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

pub struct Ingestor {
  store:      SqliteStore,
  migrations: Arc<dyn MigrationSource>,
  leagues:    Arc<dyn TeamLookup>,
  parks:      Arc<dyn ParkLookup>,
  eras:       Vec<EraRange>,
  locks:      Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Ingestor {
  /// An ingestor over `store` using the compiled-in migrations and a single
  /// all-time win-expectancy era.
  pub fn new(
    store: SqliteStore,
    leagues: Arc<dyn TeamLookup>,
    parks: Arc<dyn ParkLookup>,
  ) -> Self {
    Self {
      store,
      migrations: Arc::new(EmbeddedMigrations),
      leagues,
      parks,
      eras: Vec::new(),
      locks: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_migrations(mut self, source: Arc<dyn MigrationSource>) -> Self {
    self.migrations = source;
    self
  }

  pub fn with_eras(mut self, eras: Vec<EraRange>) -> Self {
    self.eras = eras;
    self
  }

  /// Open the configured database and reference lookups.
  pub async fn from_config(config: &EtlConfig) -> Result<Self> {
    let store = SqliteStore::open(&config.database_path).await?;

    let leagues = match &config.team_leagues_path {
      Some(path) => TeamLeagues::from_path(path)?,
      None => {
        warn!("no team_leagues_path configured; Negro Leagues games load without leagues");
        TeamLeagues::default()
      }
    };
    let parks = match &config.team_parks_path {
      Some(path) => TeamParks::from_path(path)?,
      None => TeamParks::default(),
    };

    let mut ingestor = Self::new(store, Arc::new(leagues), Arc::new(parks))
      .with_eras(config.eras.clone());
    if let Some(dir) = &config.migrations_dir {
      ingestor = ingestor.with_migrations(Arc::new(DirMigrations::new(dir)));
    }
    Ok(ingestor)
  }

  pub fn store(&self) -> &SqliteStore { &self.store }

  // ─── Schema ────────────────────────────────────────────────────────────────

  /// Apply pending migrations; returns how many ran.
  pub async fn migrate(&self) -> Result<usize> {
    Ok(self.store.migrate(self.migrations.as_ref()).await?)
  }

  // ─── Loads ─────────────────────────────────────────────────────────────────

  /// Load a Retrosheet game-log archive, tagging every game with
  /// `game_type`. Reloading only changes `game_type`.
  pub async fn load_game_log(
    &self,
    cancel: &CancellationToken,
    archive: &Path,
    game_type: GameType,
  ) -> Result<LoadReport> {
    self
      .run(
        cancel,
        dataset_name("gamelog", archive),
        archive,
        Input::Archive(GAME_LOG_SUFFIXES),
        Arc::new(GameLogTransform::new(game_type)),
        StageMerge::for_schema(&GAMES),
      )
      .await
  }

  /// Load a Retrosheet plays archive. Existing plays are never changed.
  pub async fn load_plays(
    &self,
    cancel: &CancellationToken,
    archive: &Path,
  ) -> Result<LoadReport> {
    self
      .run(
        cancel,
        dataset_name("plays", archive),
        archive,
        Input::Archive(CSV_SUFFIXES),
        Arc::new(PlaysTransform),
        StageMerge::for_schema(&PLAYS),
      )
      .await
  }

  pub async fn load_ejections(
    &self,
    cancel: &CancellationToken,
    archive: &Path,
  ) -> Result<LoadReport> {
    let transform = Arc::new(EjectionsTransform);
    let loader = StageMerge::for_schema(transform.schema());
    self
      .run(
        cancel,
        dataset_name("ejections", archive),
        archive,
        Input::Archive(CSV_SUFFIXES),
        transform,
        loader,
      )
      .await
  }

  /// Load `gameinfo.csv` and `plays.csv` from `data_dir`, skipping whichever
  /// is absent. Reloaded games also take revised league assignments.
  pub async fn load_negro_leagues(
    &self,
    cancel: &CancellationToken,
    data_dir: &Path,
  ) -> Result<NegroLeaguesReport> {
    if !data_dir.is_dir() {
      return Err(Error::NotADirectory(data_dir.to_path_buf()));
    }

    let mut report = NegroLeaguesReport::default();

    let gameinfo = data_dir.join("gameinfo.csv");
    if gameinfo.is_file() {
      let loader =
        StageMerge::new(&GAMES, ConflictPolicy::Update(NEGRO_LEAGUES_TAG_COLUMNS));
      let transform = Arc::new(NegroLeaguesGamesTransform::new(self.leagues.clone()));
      report.games = Some(
        self
          .run(
            cancel,
            "negro-leagues/gameinfo".to_owned(),
            &gameinfo,
            Input::File,
            transform,
            loader,
          )
          .await?,
      );
    } else {
      warn!(path = %gameinfo.display(), "gameinfo.csv not found; skipping games");
    }

    let plays = data_dir.join("plays.csv");
    if plays.is_file() {
      report.plays = Some(
        self
          .run(
            cancel,
            "negro-leagues/plays".to_owned(),
            &plays,
            Input::File,
            Arc::new(PlaysTransform),
            StageMerge::for_schema(&PLAYS),
          )
          .await?,
      );
    } else {
      warn!(path = %plays.display(), "plays.csv not found; skipping plays");
    }

    Ok(report)
  }

  /// Load a published reference-constants CSV. Reloading a season replaces
  /// its values.
  pub async fn load_external_constants(
    &self,
    cancel: &CancellationToken,
    csv_path: &Path,
    kind: ConstantsKind,
  ) -> Result<LoadReport> {
    let transform: Arc<dyn RecordTransform> = match kind {
      ConstantsKind::Woba => Arc::new(WobaConstantsTransform),
      ConstantsKind::ParkFactors => Arc::new(ParkFactorsTransform::new(self.parks.clone())),
    };
    let loader = StageMerge::for_schema(transform.schema());
    self
      .run(
        cancel,
        format!("constants/{kind}"),
        csv_path,
        Input::File,
        transform,
        loader,
      )
      .await
  }

  // ─── Derived tables ────────────────────────────────────────────────────────

  /// Rebuild the win-expectancy table over the configured eras. Returns the
  /// number of states written.
  pub async fn build_win_expectancy(
    &self,
    cancel: &CancellationToken,
    min_sample_size: i64,
  ) -> Result<u64> {
    Ok(
      self
        .store
        .build_win_expectancy(cancel, min_sample_size, &self.eras)
        .await?,
    )
  }

  // ─── Refresh ledger ────────────────────────────────────────────────────────

  pub async fn record_refresh(&self, dataset: &str, row_count: u64) -> Result<DatasetRefresh> {
    Ok(self.store.record_refresh(dataset, row_count).await?)
  }

  pub async fn list_refreshes(&self) -> Result<BTreeMap<String, DatasetRefresh>> {
    Ok(self.store.list_refreshes().await?)
  }

  pub async fn refresh(&self, dataset: &str) -> Result<Option<DatasetRefresh>> {
    Ok(self.store.refresh(dataset).await?)
  }

  /// Whether `dataset` has a recorded successful load.
  pub async fn is_loaded(&self, dataset: &str) -> Result<bool> {
    Ok(self.refresh(dataset).await?.is_some())
  }

  // ─── Pipeline ──────────────────────────────────────────────────────────────

  async fn dataset_lock(&self, dataset: &str) -> Arc<Mutex<()>> {
    let mut locks = self.locks.lock().await;
    locks.entry(dataset.to_owned()).or_default().clone()
  }

  /// Drop the map's entry for `dataset` unless another load holds or awaits
  /// it. Handles are only cloned under the map lock, so the count is stable.
  async fn release_dataset_lock(&self, dataset: &str, lock: Arc<Mutex<()>>) {
    let mut locks = self.locks.lock().await;
    if Arc::strong_count(&lock) == 2 {
      locks.remove(dataset);
    }
  }

  /// Extract, transform, load and record one dataset while holding its lock.
  /// Failures are wrapped with the dataset and path.
  async fn run(
    &self,
    cancel: &CancellationToken,
    dataset: String,
    path: &Path,
    input: Input,
    transform: Arc<dyn RecordTransform>,
    loader: StageMerge,
  ) -> Result<LoadReport> {
    let lock = self.dataset_lock(&dataset).await;
    let result = {
      let _guard = lock.lock().await;
      self.run_locked(cancel, &dataset, path, input, transform, loader).await
    };
    self.release_dataset_lock(&dataset, lock).await;

    result.map_err(|source| Error::Source {
      dataset,
      path: path.to_path_buf(),
      source: Box::new(source),
    })
  }

  async fn run_locked(
    &self,
    cancel: &CancellationToken,
    dataset: &str,
    path: &Path,
    input: Input,
    transform: Arc<dyn RecordTransform>,
    loader: StageMerge,
  ) -> Result<LoadReport> {
    if cancel.is_cancelled() {
      return Err(Error::Cancelled);
    }

    let source = path.to_path_buf();
    let token = cancel.clone();
    let (spool, rows) = tokio::task::spawn_blocking(move || {
      spool_canonical(&token, &source, input, transform.as_ref())
    })
    .await??;

    if cancel.is_cancelled() {
      return Err(Error::Cancelled);
    }
    let merged = self
      .store
      .load(cancel, BufReader::new(spool.reopen()?), &loader)
      .await?;
    drop(spool);

    self.store.record_refresh(dataset, merged).await?;
    info!(dataset, rows, merged, "dataset loaded");

    Ok(LoadReport { dataset: dataset.to_owned(), rows, merged })
  }
}

/// `<prefix>/<file stem>`, e.g. `gamelog/gl2023` for `data/gl2023.zip`.
pub fn dataset_name(prefix: &str, path: &Path) -> String {
  let stem = path
    .file_stem()
    .map(|s| s.to_string_lossy())
    .unwrap_or_else(|| path.to_string_lossy());
  format!("{prefix}/{stem}")
}

/// Transform `path` into a temporary canonical CSV. Blocking.
///
/// The source is read through [`Cancellable`], so cancelling `cancel` stops
/// the transform at its next read and the result is [`Error::Cancelled`].
fn spool_canonical(
  cancel: &CancellationToken,
  path: &Path,
  input: Input,
  transform: &dyn RecordTransform,
) -> Result<(NamedTempFile, u64)> {
  let spool = || -> Result<(NamedTempFile, u64)> {
    let mut spool = NamedTempFile::new()?;
    let rows = {
      let mut out = BufWriter::new(spool.as_file_mut());
      let rows = match input {
        Input::Archive(suffixes) => {
          let member = ArchiveMember::extract(path, suffixes)?;
          if cancel.is_cancelled() {
            return Err(Error::Cancelled);
          }
          let mut reader = Cancellable::new(member.open()?, cancel.clone());
          transform.transform(&mut reader, &mut out)?
        }
        Input::File => {
          let file = BufReader::new(File::open(path)?);
          transform.transform(&mut Cancellable::new(file, cancel.clone()), &mut out)?
        }
      };
      out.flush()?;
      rows
    };
    Ok((spool, rows))
  };

  spool().map_err(|err| if cancel.is_cancelled() { Error::Cancelled } else { err })
}

// ─── Cancellable reads ───────────────────────────────────────────────────────

/// A reader that fails every read once its token is cancelled.
struct Cancellable<R> {
  inner:  R,
  cancel: CancellationToken,
}

impl<R> Cancellable<R> {
  fn new(inner: R, cancel: CancellationToken) -> Self { Self { inner, cancel } }
}

impl<R: Read> Read for Cancellable<R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    // Not `Interrupted`: readers retry that kind.
    if self.cancel.is_cancelled() {
      return Err(io::Error::other("read cancelled"));
    }
    self.inner.read(buf)
  }
}
