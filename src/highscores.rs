//! Persist the best score (XDG config or ~/.config/matrixfeed).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILENAME: &str = "highscore";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("no config directory (HOME and XDG_CONFIG_HOME unset)")]
    NoConfigDir,
}

/// Durable home of the single best-score integer.
pub trait ScoreStore {
    /// Stored value; `Ok(0)` when nothing has been stored yet.
    fn load(&self) -> Result<u32, StoreError>;
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Returns the default path (config dir / matrixfeed / highscore).
pub fn default_path() -> Result<PathBuf, StoreError> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .map_err(|_| StoreError::NoConfigDir)?,
    };
    Ok(base.join("matrixfeed").join(FILENAME))
}

/// One decimal integer in a text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileStore {
    fn load(&self) -> Result<u32, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        // Garbage in the file counts as no record.
        Ok(content
            .lines()
            .next()
            .and_then(|l| l.trim().parse::<u32>().ok())
            .unwrap_or(0))
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{score}\n"))?;
        Ok(())
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<u32>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn with_value(value: u32) -> Self {
        Self { value: Some(value) }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<u32, StoreError> {
        Ok(self.value.unwrap_or(0))
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.value = Some(score);
        Ok(())
    }
}

/// In-memory best score backed by a store. Storage failures only cost durability.
pub struct HighScores {
    best: u32,
    store: Box<dyn ScoreStore>,
}

impl std::fmt::Debug for HighScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighScores").field("best", &self.best).finish_non_exhaustive()
    }
}

impl HighScores {
    pub fn load(store: Box<dyn ScoreStore>) -> Self {
        let best = store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "high score unavailable, starting from 0");
            0
        });
        Self { best, store }
    }

    #[inline]
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Record a finished game. Returns true when `score` beats the best.
    pub fn submit(&mut self, score: u32) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = self.store.save(score) {
            tracing::warn!(error = %e, score, "high score not saved");
        }
        true
    }
}
