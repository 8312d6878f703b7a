//! Hydration state persistence.
//!
//! The store talks to a [`StateBackend`]. The default backend keeps the state
//! in a single JSON document on disk, written atomically under a file lock.
//! Reads are forgiving: each persisted field is decoded on its own, and a
//! missing or malformed field falls back to its default instead of
//! discarding the whole document.

use crate::{DailyData, Error, Result, WaterEntry, DEFAULT_DAILY_GOAL_ML};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Largest drift tolerated between the stored intake and the entry sum.
const INTAKE_EPSILON: f64 = 1e-6;

/// The persisted form of the store's live state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    /// Day the live counters belong to; `None` means "never active"
    pub last_active_date: Option<NaiveDate>,
    pub current_intake: f64,
    pub daily_goal: f64,
    /// Most recent first
    pub today_entries: Vec<WaterEntry>,
    /// Most recent first
    pub historical_data: Vec<DailyData>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::with_goal(DEFAULT_DAILY_GOAL_ML)
    }
}

impl PersistedState {
    /// Empty state with the given goal
    pub fn with_goal(daily_goal: f64) -> Self {
        Self {
            last_active_date: None,
            current_intake: 0.0,
            daily_goal,
            today_entries: Vec::new(),
            historical_data: Vec::new(),
        }
    }

    /// Decode a JSON document field by field
    ///
    /// Never fails: anything unusable is replaced by its default and logged.
    pub fn from_json_str(contents: &str, default_goal: f64) -> Self {
        let value = match serde_json::from_str::<Value>(contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("State document is not valid JSON: {}. Using defaults.", e);
                return Self::with_goal(default_goal);
            }
        };
        let Value::Object(fields) = value else {
            tracing::warn!("State document is not a JSON object. Using defaults.");
            return Self::with_goal(default_goal);
        };

        let mut state = Self {
            last_active_date: field::<Option<NaiveDate>>(&fields, "last_active_date").flatten(),
            current_intake: field(&fields, "current_intake").unwrap_or(0.0),
            daily_goal: field(&fields, "daily_goal").unwrap_or(default_goal),
            today_entries: list_field(&fields, "today_entries"),
            historical_data: list_field(&fields, "historical_data"),
        };
        state.sanitize(default_goal);
        state
    }

    /// Restore invariants that a hand-edited or stale file may break
    ///
    /// - the goal must be a positive finite number
    /// - the intake must equal the sum of today's entries
    pub fn sanitize(&mut self, default_goal: f64) {
        if !self.daily_goal.is_finite() || self.daily_goal <= 0.0 {
            tracing::warn!(
                "Stored daily goal {} is invalid, using {}",
                self.daily_goal,
                default_goal
            );
            self.daily_goal = default_goal;
        }

        let entry_sum: f64 = self.today_entries.iter().map(|e| e.amount).sum();
        if !self.current_intake.is_finite()
            || (self.current_intake - entry_sum).abs() > INTAKE_EPSILON
        {
            tracing::warn!(
                "Stored intake {} disagrees with entry total {}, using entry total",
                self.current_intake,
                entry_sum
            );
            self.current_intake = entry_sum;
        }
    }
}

fn field<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring malformed state field {:?}: {}", key, e);
            None
        }
    }
}

fn list_field<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Vec<T> {
    let items = match fields.get(key) {
        None => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            tracing::warn!("State field {:?} is not a list, ignoring it", key);
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Skipping malformed {} item {}: {}", key, idx, e);
                None
            }
        })
        .collect()
}

/// Key-value persistence used by the hydration store
pub trait StateBackend {
    /// Load state, falling back to defaults for anything missing or corrupt
    fn load(&self, default_goal: f64) -> Result<PersistedState>;

    /// Persist the full state; failures must be reported, not swallowed
    fn save(&mut self, state: &PersistedState) -> Result<()>;
}

/// JSON file backend with file locking
///
/// Readers and writers coordinate through a sidecar `<state>.lock` file:
/// loads hold it shared, saves hold it exclusively. The state file itself is
/// only ever replaced by rename, so a reader never sees a partial document.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend for `state.json` inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file the locks are taken on
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }
}

impl StateBackend for JsonFileBackend {
    /// Load state from the file under a shared lock
    ///
    /// Returns default state if the file doesn't exist or can't be read.
    fn load(&self, default_goal: f64) -> Result<PersistedState> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No state file found at {:?}, using default state", path);
            return Ok(PersistedState::with_goal(default_goal));
        }

        // A read-only data dir still gets read, just without coordination
        let lock = match self.open_lock_file() {
            Ok(lock) => match lock.lock_shared() {
                Ok(()) => Some(lock),
                Err(e) => {
                    tracing::warn!("Unable to lock {:?}: {}. Reading unlocked.", path, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Unable to open lock for {:?}: {}. Reading unlocked.", path, e);
                None
            }
        };

        let contents = std::fs::read_to_string(path);
        if let Some(lock) = &lock {
            lock.unlock()?;
        }

        let contents = match contents {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(PersistedState::with_goal(default_goal));
            }
        };

        let state = PersistedState::from_json_str(&contents, default_goal);
        tracing::debug!(
            entries = state.today_entries.len(),
            history = state.historical_data.len(),
            "Loaded hydration state from {:?}",
            path
        );
        Ok(state)
    }

    /// Save state under an exclusive lock
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the previous file
    ///
    /// The lock serializes this write against other saves and loads. It does
    /// not span a caller's load-modify-save cycle, so two processes mutating
    /// at once can still have the later save win.
    fn save(&mut self, state: &PersistedState) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Persistence(format!("state path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let lock = self.open_lock_file()?;
        lock.lock_exclusive()?;

        let result = write_atomically(&self.path, parent, state);
        lock.unlock()?;
        result?;

        tracing::debug!("Saved hydration state to {:?}", self.path);
        Ok(())
    }
}

fn write_atomically(path: &Path, dir: &Path, state: &PersistedState) -> Result<()> {
    // Temp file in the same directory so the rename stays on one filesystem
    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, state)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// In-memory backend that still goes through JSON serialization
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    document: Option<String>,
    fail_writes: bool,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with a raw JSON document
    pub fn with_document(json: impl Into<String>) -> Self {
        Self {
            document: Some(json.into()),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, default_goal: f64) -> Result<PersistedState> {
        Ok(match &self.document {
            Some(json) => PersistedState::from_json_str(json, default_goal),
            None => PersistedState::with_goal(default_goal),
        })
    }

    fn save(&mut self, state: &PersistedState) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Persistence("memory backend rejected write".into()));
        }
        self.document = Some(serde_json::to_string(state)?);
        self.saves += 1;
        Ok(())
    }
}
