//! Best-score storage.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameResult;

/// Where the best score lives between runs. The core only loads and saves it.
pub trait BestScoreStore {
    fn load(&self) -> GameResult<u64>;
    fn save(&self, score: u64) -> GameResult<()>;
}

impl<S: BestScoreStore + ?Sized> BestScoreStore for Rc<S> {
    fn load(&self) -> GameResult<u64> {
        (**self).load()
    }

    fn save(&self, score: u64) -> GameResult<()> {
        (**self).save(score)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BestScoreDocument {
    best_score: u64,
}

/// Keeps the best score in a small JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BestScoreStore for JsonFileStore {
    /// A missing file means no score has been recorded yet.
    fn load(&self) -> GameResult<u64> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let document: BestScoreDocument = serde_json::from_str(&contents)?;
                Ok(document.best_score)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, score: u64) -> GameResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&BestScoreDocument { best_score: score })?;
        fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), score, "Best score saved");
        Ok(())
    }
}

/// Holds the best score in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    best: Cell<u64>,
}

impl MemoryStore {
    pub fn new(best: u64) -> Self {
        Self { best: Cell::new(best) }
    }
}

impl BestScoreStore for MemoryStore {
    fn load(&self) -> GameResult<u64> {
        Ok(self.best.get())
    }

    fn save(&self, score: u64) -> GameResult<()> {
        self.best.set(score);
        Ok(())
    }
}
