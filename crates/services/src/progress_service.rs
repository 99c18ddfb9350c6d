use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use quiz_core::model::ProgressSnapshot;
use quiz_core::{Clock, ProgressEngine};
use storage::repository::{ProgressRecord, ProgressRepository};

use crate::error::{ImportError, ProgressServiceError};

/// Loads, saves, resets and moves progress snapshots in and out of storage.
///
/// Everything read back goes through the engine's migration, so the snapshot
/// handed out is always valid for the session's knowledge base.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    engine: ProgressEngine,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, engine: ProgressEngine, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            engine,
            repo,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressEngine {
        &self.engine
    }

    /// Fresh progress, valid for the current knowledge base.
    #[must_use]
    pub fn defaults(&self) -> ProgressSnapshot {
        self.engine.validate(ProgressSnapshot::default())
    }

    /// Load the stored snapshot.
    ///
    /// Missing, unreadable or unparsable data falls back to defaults; loading
    /// never blocks a session.
    pub async fn load(&self) -> ProgressSnapshot {
        let record = match self.repo.load_progress().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("no stored progress; starting fresh");
                return self.defaults();
            }
            Err(err) => {
                warn!(%err, "failed to read stored progress; starting fresh");
                return self.defaults();
            }
        };

        match serde_json::from_str::<Value>(&record.payload) {
            Ok(raw) => self.engine.migrate(&raw),
            Err(err) => {
                warn!(%err, "stored progress is not valid JSON; starting fresh");
                self.defaults()
            }
        }
    }

    /// Persist the snapshot, stamping its last visit with the service clock.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if serialization or the write fails.
    pub async fn save(&self, snapshot: &mut ProgressSnapshot) -> Result<(), ProgressServiceError> {
        let now = self.clock.now();
        snapshot.touch(now);
        let payload = serde_json::to_string(snapshot)
            .map_err(|err| ProgressServiceError::Serialization(err.to_string()))?;
        self.repo
            .save_progress(&ProgressRecord::new(payload, now))
            .await?;
        Ok(())
    }

    /// Drop stored progress and return defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store cannot be cleared.
    pub async fn reset(&self) -> Result<ProgressSnapshot, ProgressServiceError> {
        self.repo.clear_progress().await?;
        info!("progress reset");
        Ok(self.defaults())
    }

    /// Canonical, human-readable serialized form of a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Serialization` if the snapshot cannot be encoded.
    pub fn export(&self, snapshot: &ProgressSnapshot) -> Result<String, ProgressServiceError> {
        serde_json::to_string_pretty(snapshot)
            .map_err(|err| ProgressServiceError::Serialization(err.to_string()))
    }

    /// Parse, migrate and store exported progress text.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Malformed` or `ImportError::NotAnObject` without
    /// touching the store, or `ImportError::Progress` if the write fails.
    pub async fn import(&self, text: &str) -> Result<ProgressSnapshot, ImportError> {
        let raw: Value =
            serde_json::from_str(text).map_err(|err| ImportError::Malformed(err.to_string()))?;
        if !raw.is_object() {
            return Err(ImportError::NotAnObject);
        }

        let mut snapshot = self.engine.migrate(&raw);
        self.save(&mut snapshot).await?;
        info!(
            completed = snapshot.completed_topics.len(),
            "progress imported"
        );
        Ok(snapshot)
    }
}
