use std::collections::HashSet;

use tracing::debug;

use super::ProgressEngine;
use crate::model::{Chapter, ChapterId, ProgressSnapshot};

impl ProgressEngine {
    /// Repair a snapshot so every invariant holds against this knowledge base.
    ///
    /// Never fails: chapter 1 is re-unlocked, unlocked ids that no longer exist
    /// are dropped and duplicates collapse to their first occurrence. A current
    /// chapter that is missing or locked falls back to chapter 1, and an
    /// out-of-range topic index to 0. Completed topics are kept even when the
    /// knowledge base no longer lists them. Applying it twice changes nothing.
    #[must_use]
    pub fn validate(&self, mut snapshot: ProgressSnapshot) -> ProgressSnapshot {
        let knowledge = self.knowledge();

        let mut seen = HashSet::new();
        let before = snapshot.unlocked_chapters.len();
        snapshot
            .unlocked_chapters
            .retain(|id| knowledge.contains_chapter(*id) && seen.insert(*id));
        if snapshot.unlocked_chapters.len() != before {
            debug!(
                dropped = before - snapshot.unlocked_chapters.len(),
                "removed unknown or duplicate unlocked chapters"
            );
        }
        if snapshot.unlock(ChapterId::FIRST) {
            debug!("first chapter was locked; unlocking it");
        }

        if !knowledge.contains_chapter(snapshot.current_chapter)
            || !snapshot.is_unlocked(snapshot.current_chapter)
        {
            debug!(
                chapter = %snapshot.current_chapter,
                "current chapter missing or locked; resetting to first chapter"
            );
            snapshot.current_chapter = ChapterId::FIRST;
        }

        let topic_count = knowledge
            .chapter(snapshot.current_chapter)
            .map_or(0, Chapter::topic_count);
        if snapshot.current_topic_index >= topic_count {
            debug!(
                index = snapshot.current_topic_index,
                topic_count, "current topic index out of range; resetting to 0"
            );
            snapshot.current_topic_index = 0;
        }

        let mut seen = HashSet::new();
        snapshot
            .completed_topics
            .retain(|key| seen.insert(key.clone()));

        snapshot
    }
}
