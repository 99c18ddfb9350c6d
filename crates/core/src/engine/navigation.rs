use tracing::debug;

use super::ProgressEngine;
use super::quiz::Advance;
use crate::model::{ChapterId, ProgressSnapshot};

impl ProgressEngine {
    /// Move to an unlocked chapter, landing on its first incomplete topic.
    ///
    /// Selecting a locked or unknown chapter returns the snapshot unchanged.
    /// When every topic is already completed the chapter opens at its first topic.
    #[must_use]
    pub fn select_chapter(
        &self,
        snapshot: &ProgressSnapshot,
        chapter_id: ChapterId,
    ) -> ProgressSnapshot {
        if !snapshot.is_unlocked(chapter_id) {
            debug!(chapter = %chapter_id, "ignoring selection of locked chapter");
            return snapshot.clone();
        }
        let Some(chapter) = self.knowledge().chapter(chapter_id) else {
            return snapshot.clone();
        };

        let first_open = chapter
            .topic_keys()
            .position(|key| !snapshot.is_completed(&key))
            .unwrap_or(0);

        let mut next = snapshot.clone();
        next.current_chapter = chapter_id;
        next.current_topic_index = first_open;
        self.validate(next)
    }

    /// Step back one topic within the current chapter.
    #[must_use]
    pub fn prev_topic(&self, snapshot: &ProgressSnapshot) -> ProgressSnapshot {
        let mut next = snapshot.clone();
        if next.current_topic_index > 0 {
            next.current_topic_index -= 1;
        }
        self.validate(next)
    }

    /// Move past the current topic: next topic in the chapter, else the first
    /// topic of the following chapter when it is unlocked, else stay put.
    pub(super) fn advance(&self, mut snapshot: ProgressSnapshot) -> (ProgressSnapshot, Advance) {
        let topic_count = self
            .current_chapter(&snapshot)
            .map_or(0, |chapter| chapter.topic_count());

        if snapshot.current_topic_index + 1 < topic_count {
            snapshot.current_topic_index += 1;
            return (self.validate(snapshot), Advance::NextTopic);
        }

        let following = snapshot
            .current_chapter
            .next()
            .filter(|id| self.knowledge().contains_chapter(*id) && snapshot.is_unlocked(*id));
        if let Some(id) = following {
            snapshot.current_chapter = id;
            snapshot.current_topic_index = 0;
            return (self.validate(snapshot), Advance::NextChapter(id));
        }

        (self.validate(snapshot), Advance::Stayed)
    }
}
