use std::sync::Arc;

use quiz_core::ProgressEngine;
use quiz_core::model::KnowledgeBase;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::presenter::Presenter;
use crate::progress_service::ProgressService;
use crate::session::LearningSession;

/// Assembles app-facing services around one knowledge base.
#[derive(Clone)]
pub struct AppServices {
    progress: ProgressService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        knowledge: Arc<KnowledgeBase>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, knowledge))
    }

    /// Build services that keep progress in memory only.
    #[must_use]
    pub fn in_memory(clock: Clock, knowledge: Arc<KnowledgeBase>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, knowledge)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, knowledge: Arc<KnowledgeBase>) -> Self {
        let engine = ProgressEngine::new(knowledge);
        let progress = ProgressService::new(clock, engine, Arc::clone(&storage.progress));
        Self { progress }
    }

    #[must_use]
    pub fn progress(&self) -> ProgressService {
        self.progress.clone()
    }

    /// Load stored progress and open a session drawn through `presenter`.
    pub async fn start_session<P: Presenter>(&self, presenter: P) -> LearningSession<P> {
        LearningSession::start(self.progress(), presenter).await
    }
}
