//! Persistence backends for the statistics ledger

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::achievements::Achievement;
use super::record::SpinRecord;
use super::stats::Statistics;
use crate::error::{SlotError, SlotResult};

/// Storage for history, statistics and achievements
///
/// History is handed over newest first.
pub trait StatisticsStore: Send {
    /// Append one record to the history
    fn append_record(&mut self, record: &SpinRecord) -> SlotResult<()>;

    /// Full stored history, newest first
    fn load_history(&self) -> SlotResult<Vec<SpinRecord>>;

    /// Replace the stored history
    fn persist_history(&mut self, history: &[SpinRecord]) -> SlotResult<()>;

    fn load_statistics(&self) -> SlotResult<Option<Statistics>>;

    fn persist_statistics(&mut self, statistics: &Statistics) -> SlotResult<()>;

    fn load_achievements(&self) -> SlotResult<Vec<Achievement>>;

    fn persist_achievements(&mut self, achievements: &[Achievement]) -> SlotResult<()>;
}

// ============ Memory Store ============

#[derive(Debug, Default)]
struct MemoryInner {
    history: Vec<SpinRecord>,
    statistics: Option<Statistics>,
    achievements: Vec<Achievement>,
    fail_writes: bool,
}

/// In-process store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with a storage error
    pub fn failing() -> Self {
        let store = Self::new();
        store.inner.lock().fail_writes = true;
        store
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    pub fn stored_statistics(&self) -> Option<Statistics> {
        self.inner.lock().statistics.clone()
    }

    fn write<F>(&self, apply: F) -> SlotResult<()>
    where
        F: FnOnce(&mut MemoryInner),
    {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(SlotError::Storage("memory store is read-only".into()));
        }
        apply(&mut inner);
        Ok(())
    }
}

impl StatisticsStore for MemoryStore {
    fn append_record(&mut self, record: &SpinRecord) -> SlotResult<()> {
        self.write(|inner| inner.history.insert(0, record.clone()))
    }

    fn load_history(&self) -> SlotResult<Vec<SpinRecord>> {
        Ok(self.inner.lock().history.clone())
    }

    fn persist_history(&mut self, history: &[SpinRecord]) -> SlotResult<()> {
        self.write(|inner| inner.history = history.to_vec())
    }

    fn load_statistics(&self) -> SlotResult<Option<Statistics>> {
        Ok(self.inner.lock().statistics.clone())
    }

    fn persist_statistics(&mut self, statistics: &Statistics) -> SlotResult<()> {
        self.write(|inner| inner.statistics = Some(statistics.clone()))
    }

    fn load_achievements(&self) -> SlotResult<Vec<Achievement>> {
        Ok(self.inner.lock().achievements.clone())
    }

    fn persist_achievements(&mut self, achievements: &[Achievement]) -> SlotResult<()> {
        self.write(|inner| inner.achievements = achievements.to_vec())
    }
}

// ============ JSON File Store ============

const HISTORY_FILE: &str = "history.jsonl";
const STATISTICS_FILE: &str = "statistics.json";
const ACHIEVEMENTS_FILE: &str = "achievements.json";

/// One file per concern in a directory
///
/// History is JSON lines, oldest first, so a spin costs one appended line.
/// Statistics and achievements are pretty-printed JSON documents.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create) the ledger directory
    pub fn new(dir: impl Into<PathBuf>) -> SlotResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_document<T: DeserializeOwned>(&self, file: &str) -> SlotResult<Option<T>> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_document<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> SlotResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        write_replacing(&self.path(file), json.as_bytes())
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_replacing(path: &Path, contents: &[u8]) -> SlotResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl StatisticsStore for JsonFileStore {
    fn append_record(&mut self, record: &SpinRecord) -> SlotResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(HISTORY_FILE))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn load_history(&self) -> SlotResult<Vec<SpinRecord>> {
        let path = self.path(HISTORY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let mut history = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SpinRecord>(&line) {
                Ok(record) => history.push(record),
                Err(e) => log::warn!(
                    "Skipping malformed history line {} in {}: {}",
                    number + 1,
                    path.display(),
                    e
                ),
            }
        }

        history.reverse();
        Ok(history)
    }

    fn persist_history(&mut self, history: &[SpinRecord]) -> SlotResult<()> {
        let mut contents = String::new();
        for record in history.iter().rev() {
            contents.push_str(&serde_json::to_string(record)?);
            contents.push('\n');
        }
        write_replacing(&self.path(HISTORY_FILE), contents.as_bytes())
    }

    fn load_statistics(&self) -> SlotResult<Option<Statistics>> {
        self.read_document(STATISTICS_FILE)
    }

    fn persist_statistics(&mut self, statistics: &Statistics) -> SlotResult<()> {
        self.write_document(STATISTICS_FILE, statistics)
    }

    fn load_achievements(&self) -> SlotResult<Vec<Achievement>> {
        Ok(self.read_document(ACHIEVEMENTS_FILE)?.unwrap_or_default())
    }

    fn persist_achievements(&mut self, achievements: &[Achievement]) -> SlotResult<()> {
        self.write_document(ACHIEVEMENTS_FILE, achievements)
    }
}
