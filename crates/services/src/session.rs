use std::fmt;

use tracing::{debug, warn};

use quiz_core::engine::{Advance, NextOutcome, ProgressSummary};
use quiz_core::model::{ChapterId, ProgressSnapshot};
use quiz_core::{EngineError, ProgressEngine};

use crate::error::SessionError;
use crate::presenter::{Presenter, TopicView};
use crate::progress_service::ProgressService;
use crate::quiz_state::TopicVisit;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner's sitting: owns the live snapshot and the on-screen quiz state.
///
/// Each intent runs an engine transition, swaps in the new snapshot, saves it
/// and asks the presenter to redraw what changed. Save failures are logged and
/// do not interrupt the session.
pub struct LearningSession<P> {
    progress: ProgressService,
    presenter: P,
    snapshot: ProgressSnapshot,
    visit: TopicVisit,
}

impl<P: Presenter> LearningSession<P> {
    /// Load stored progress (or defaults), persist the validated result and draw everything.
    pub async fn start(progress: ProgressService, presenter: P) -> Self {
        let snapshot = progress.load().await;
        let visit = TopicVisit::new(progress.engine().current_topic_key(&snapshot));
        let mut session = Self {
            progress,
            presenter,
            snapshot,
            visit,
        };
        session.persist().await;
        session.render_all();
        session
    }

    #[must_use]
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn visit(&self) -> &TopicVisit {
        &self.visit
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressEngine {
        self.progress.engine()
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    #[must_use]
    pub fn progress_summary(&self) -> ProgressSummary {
        self.engine().progress(&self.snapshot)
    }

    /// Open an unlocked chapter. Returns `false` if nothing changed.
    pub async fn select_chapter(&mut self, chapter: ChapterId) -> bool {
        let next = self.progress.engine().select_chapter(&self.snapshot, chapter);
        if next == self.snapshot {
            debug!(chapter = %chapter, "chapter selection ignored");
            return false;
        }
        self.snapshot = next;
        self.sync_visit();
        self.persist().await;
        self.render_all();
        true
    }

    /// Go back one topic. Returns `false` at the start of a chapter.
    pub async fn prev_topic(&mut self) -> bool {
        let next = self.progress.engine().prev_topic(&self.snapshot);
        if next == self.snapshot {
            return false;
        }
        self.snapshot = next;
        self.sync_visit();
        self.persist().await;
        self.render_topic();
        true
    }

    /// Pick an option of the current quiz. Returns `false` once the answer was checked.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidOption` if the quiz has no such option.
    pub fn select_option(&mut self, index: usize) -> Result<bool, SessionError> {
        let options = self
            .progress
            .engine()
            .current_topic(&self.snapshot)
            .map_or(0, |topic| topic.quiz().options().len());
        if index >= options {
            return Err(SessionError::InvalidOption { index, options });
        }
        let taken = self.visit.select(index);
        if taken {
            self.render_topic();
        }
        Ok(taken)
    }

    /// Check the picked answer, or move on if it was already checked.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Engine(EngineError::NoSelection)` when the topic
    /// still needs an answer; the presenter is asked to prompt for one and the
    /// snapshot is unchanged.
    pub async fn next_topic(&mut self) -> Result<NextOutcome, SessionError> {
        let result = self.progress.engine().next_topic(
            &self.snapshot,
            self.visit.selected(),
            self.visit.is_checked(),
        );
        let (next, outcome) = match result {
            Ok(transition) => transition,
            Err(err) => {
                if matches!(err, EngineError::NoSelection) {
                    self.presenter.prompt_selection();
                }
                return Err(err.into());
            }
        };

        self.snapshot = next;
        match &outcome {
            NextOutcome::Checked(check) => {
                self.visit.mark_checked(check.selected, check.correct);
                self.persist().await;
                self.presenter.show_feedback(check);
                if let Some(achievement) = &check.achievement {
                    self.presenter.notify_achievement(achievement);
                }
                if check.correct {
                    self.render_chapters();
                    self.render_progress();
                }
            }
            NextOutcome::Advanced(advance) => {
                // Staying on the last topic still opens a fresh attempt.
                self.visit = TopicVisit::new(self.engine().current_topic_key(&self.snapshot));
                self.persist().await;
                if matches!(advance, Advance::NextChapter(_)) {
                    self.render_chapters();
                }
                self.render_topic();
            }
        }
        Ok(outcome)
    }

    /// Wipe stored progress and start over.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` if the store cannot be cleared; the
    /// session keeps its current progress in that case.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        self.snapshot = self.progress.reset().await?;
        self.visit = TopicVisit::new(self.engine().current_topic_key(&self.snapshot));
        self.render_all();
        Ok(())
    }

    /// Serialized form of the live snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` if the snapshot cannot be encoded.
    pub fn export(&self) -> Result<String, SessionError> {
        Ok(self.progress.export(&self.snapshot)?)
    }

    /// Replace progress with imported text.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Import` if the text is malformed or cannot be
    /// stored; the session keeps its current progress in that case.
    pub async fn import(&mut self, text: &str) -> Result<(), SessionError> {
        self.snapshot = self.progress.import(text).await?;
        self.visit = TopicVisit::new(self.engine().current_topic_key(&self.snapshot));
        self.render_all();
        Ok(())
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn sync_visit(&mut self) {
        let key = self.progress.engine().current_topic_key(&self.snapshot);
        if self.visit.follow(key) {
            debug!(topic = ?self.visit.key(), "quiz state reset for new topic");
        }
    }

    async fn persist(&mut self) {
        if let Err(err) = self.progress.save(&mut self.snapshot).await {
            warn!(%err, "failed to save progress");
        }
    }

    fn render_all(&mut self) {
        self.render_chapters();
        self.render_topic();
        self.render_progress();
    }

    fn render_chapters(&mut self) {
        let chapters = self.progress.engine().chapter_overview(&self.snapshot);
        self.presenter.render_chapter_list(&chapters, &self.snapshot);
    }

    fn render_topic(&mut self) {
        let engine = self.progress.engine();
        let Some(chapter) = engine.current_chapter(&self.snapshot) else {
            return;
        };
        let Some(position) = engine.topic_position(&self.snapshot) else {
            return;
        };
        let Some(topic) = chapter.topic(position.index) else {
            return;
        };
        let completed = chapter
            .topic_key(position.index)
            .is_some_and(|key| self.snapshot.is_completed(&key));
        let view = TopicView {
            chapter,
            topic,
            position,
            completed,
            visit: &self.visit,
        };
        self.presenter.render_topic(&view, &self.snapshot);
    }

    fn render_progress(&mut self) {
        let summary = self.progress.engine().progress(&self.snapshot);
        self.presenter.render_progress(summary);
    }
}

impl<P> fmt::Debug for LearningSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningSession")
            .field("current_chapter", &self.snapshot.current_chapter)
            .field("current_topic_index", &self.snapshot.current_topic_index)
            .field("completed", &self.snapshot.completed_topics.len())
            .field("visit", &self.visit)
            .finish_non_exhaustive()
    }
}
