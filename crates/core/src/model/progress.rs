use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{ChapterId, TopicKey};

/// Version stamped on every snapshot written by this crate.
///
/// Data written before versioning carries no `schemaVersion` field and is
/// treated as version 0 by migration.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Answer counters kept alongside progress.
///
/// `total_study_time` and `streak_days` are carried through load/save but no
/// transition updates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_study_time: u64,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub streak_days: u32,
}

impl Statistics {
    /// Share of correct answers, or `None` before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = u64::from(self.correct_answers) + u64::from(self.wrong_answers);
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = f64::from(self.correct_answers) / total as f64;
        Some(ratio)
    }
}

/// The complete persisted progress state.
///
/// Snapshots are plain records; the engine keeps them consistent with the
/// knowledge base. Persisted text is read back through
/// [`ProgressEngine::migrate`](crate::engine::ProgressEngine::migrate), never
/// deserialized directly, so older or hand-edited shapes are normalized first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_chapter: ChapterId,
    pub current_topic_index: usize,
    pub completed_topics: Vec<TopicKey>,
    pub unlocked_chapters: Vec<ChapterId>,
    pub total_score: u64,
    pub statistics: Statistics,
    pub last_visit: Option<DateTime<Utc>>,
    pub schema_version: u32,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            current_chapter: ChapterId::FIRST,
            current_topic_index: 0,
            completed_topics: Vec::new(),
            unlocked_chapters: vec![ChapterId::FIRST],
            total_score: 0,
            statistics: Statistics::default(),
            last_visit: None,
            schema_version: SNAPSHOT_VERSION,
        }
    }
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_completed(&self, key: &TopicKey) -> bool {
        self.completed_topics.contains(key)
    }

    #[must_use]
    pub fn is_unlocked(&self, chapter: ChapterId) -> bool {
        self.unlocked_chapters.contains(&chapter)
    }

    /// Record a topic as completed. Returns `false` if it already was.
    pub fn mark_completed(&mut self, key: TopicKey) -> bool {
        if self.is_completed(&key) {
            return false;
        }
        self.completed_topics.push(key);
        true
    }

    /// Unlock a chapter. Returns `false` if it already was unlocked.
    pub fn unlock(&mut self, chapter: ChapterId) -> bool {
        if self.is_unlocked(chapter) {
            return false;
        }
        self.unlocked_chapters.push(chapter);
        true
    }

    /// Stamp the time of the latest save.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_visit = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn default_snapshot_unlocks_first_chapter() {
        let snapshot = ProgressSnapshot::default();
        assert!(snapshot.is_unlocked(ChapterId::FIRST));
        assert_eq!(snapshot.current_chapter, ChapterId::FIRST);
        assert_eq!(snapshot.schema_version, SNAPSHOT_VERSION);
    }

    #[test]
    fn mark_completed_is_set_like() {
        let mut snapshot = ProgressSnapshot::default();
        let key = TopicKey::new(ChapterId::FIRST, "Token");
        assert!(snapshot.mark_completed(key.clone()));
        assert!(!snapshot.mark_completed(key));
        assert_eq!(snapshot.completed_topics.len(), 1);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot.touch(fixed_now());
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["currentChapter"], 1);
        assert_eq!(value["unlockedChapters"], serde_json::json!([1]));
        assert_eq!(value["statistics"]["correctAnswers"], 0);
        assert_eq!(value["schemaVersion"], SNAPSHOT_VERSION);
        assert!(value["lastVisit"].is_string());
    }

    #[test]
    fn accuracy_needs_answers() {
        let mut stats = Statistics::default();
        assert_eq!(stats.accuracy(), None);
        stats.correct_answers = 3;
        stats.wrong_answers = 1;
        assert_eq!(stats.accuracy(), Some(0.75));
    }
}
