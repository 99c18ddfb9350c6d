//! Pure progress transitions over a [`ProgressSnapshot`] and a [`KnowledgeBase`].
//!
//! Every operation borrows the caller's snapshot and hands back a new one, so a
//! transition that fails leaves the in-use snapshot untouched. The engine never
//! performs I/O; persistence and rendering belong to the session layer.

use std::sync::Arc;

use thiserror::Error;

use crate::model::{Chapter, KnowledgeBase, ProgressSnapshot, Topic, TopicKey};

mod migrate;
mod navigation;
mod overview;
mod quiz;
mod validate;

pub use overview::{ChapterOverview, ChapterStatus, ProgressSummary, TopicPosition};
pub use quiz::{Achievement, Advance, AnswerCheck, NextOutcome};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// Advancing an unanswered topic needs an option to evaluate.
    #[error("select an answer before continuing")]
    NoSelection,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Progress state machine bound to one knowledge base for a session.
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    knowledge: Arc<KnowledgeBase>,
}

impl ProgressEngine {
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Chapter the snapshot points at, if it exists in the knowledge base.
    ///
    /// Always `Some` for a validated snapshot.
    #[must_use]
    pub fn current_chapter(&self, snapshot: &ProgressSnapshot) -> Option<&Chapter> {
        self.knowledge.chapter(snapshot.current_chapter)
    }

    #[must_use]
    pub fn current_topic(&self, snapshot: &ProgressSnapshot) -> Option<&Topic> {
        self.current_chapter(snapshot)?
            .topic(snapshot.current_topic_index)
    }

    #[must_use]
    pub fn current_topic_key(&self, snapshot: &ProgressSnapshot) -> Option<TopicKey> {
        self.current_chapter(snapshot)?
            .topic_key(snapshot.current_topic_index)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use super::ProgressEngine;
    use crate::model::{Chapter, ChapterId, Difficulty, KnowledgeBase, Quiz, Topic};

    fn topic(term: &str, difficulty: Difficulty, answer: usize) -> Topic {
        Topic::new(
            term,
            term,
            format!("{term} definition"),
            format!("{term} tip"),
            difficulty,
            Quiz::new(
                format!("What is {term}?"),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                answer,
            ),
        )
    }

    /// Three chapters: two topics, one topic, two topics.
    ///
    /// Chapter 1 topic 0 is a beginner topic whose answer is option 1.
    pub(crate) fn knowledge() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            Chapter::new(
                ChapterId::new(1),
                "Foundations",
                "📘",
                "Core vocabulary",
                vec![
                    topic("Token", Difficulty::Beginner, 1),
                    topic("Embedding", Difficulty::Intermediate, 2),
                ],
            ),
            Chapter::new(
                ChapterId::new(2),
                "Models",
                "🧠",
                "Architectures",
                vec![topic("Transformer", Difficulty::Expert, 0)],
            ),
            Chapter::new(
                ChapterId::new(3),
                "Multimodal",
                "🖼️",
                "Beyond text",
                vec![
                    topic("Diffusion", Difficulty::Intermediate, 3),
                    topic("CLIP", Difficulty::Expert, 1),
                ],
            ),
        ])
        .expect("fixture knowledge base is valid")
    }

    pub(crate) fn engine() -> ProgressEngine {
        ProgressEngine::new(Arc::new(knowledge()))
    }
}
