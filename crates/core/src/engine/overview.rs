use super::ProgressEngine;
use crate::model::{ChapterId, ProgressSnapshot};

/// Completed vs. total topics across the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSummary {
    /// Completion percentage rounded to one decimal; 0 for an empty catalog.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed as f64 / self.total as f64;
        (ratio * 1000.0).round() / 10.0
    }
}

/// How a chapter appears in the chapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    Locked,
    Completed,
    Current,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOverview {
    pub id: ChapterId,
    pub title: String,
    pub icon: String,
    pub status: ChapterStatus,
}

/// Position of the current topic inside its chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicPosition {
    pub index: usize,
    pub count: usize,
}

impl TopicPosition {
    /// 1-based topic number for display.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.count
    }
}

impl ProgressEngine {
    /// Completed topics that still exist in the knowledge base, out of all topics.
    #[must_use]
    pub fn progress(&self, snapshot: &ProgressSnapshot) -> ProgressSummary {
        let knowledge = self.knowledge();
        let completed = snapshot
            .completed_topics
            .iter()
            .filter(|key| knowledge.topic(key).is_some())
            .count();
        ProgressSummary {
            completed,
            total: knowledge.total_topics(),
        }
    }

    /// Status of every chapter, in order.
    ///
    /// Locked wins over everything, then completed, then current.
    #[must_use]
    pub fn chapter_overview(&self, snapshot: &ProgressSnapshot) -> Vec<ChapterOverview> {
        self.knowledge()
            .chapters()
            .iter()
            .map(|chapter| {
                let status = if !snapshot.is_unlocked(chapter.id()) {
                    ChapterStatus::Locked
                } else if self.is_chapter_completed(chapter, snapshot) {
                    ChapterStatus::Completed
                } else if snapshot.current_chapter == chapter.id() {
                    ChapterStatus::Current
                } else {
                    ChapterStatus::Available
                };
                ChapterOverview {
                    id: chapter.id(),
                    title: chapter.title().to_string(),
                    icon: chapter.icon().to_string(),
                    status,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn topic_position(&self, snapshot: &ProgressSnapshot) -> Option<TopicPosition> {
        let chapter = self.current_chapter(snapshot)?;
        (snapshot.current_topic_index < chapter.topic_count()).then(|| TopicPosition {
            index: snapshot.current_topic_index,
            count: chapter.topic_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::engine;
    use crate::model::TopicKey;

    #[test]
    fn progress_ignores_topics_missing_from_catalog() {
        let engine = engine();
        let mut snapshot = ProgressSnapshot::default();
        snapshot.mark_completed(TopicKey::new(ChapterId::FIRST, "Token"));
        snapshot.mark_completed(TopicKey::new(ChapterId::new(9), "Retired"));

        let summary = engine.progress(&snapshot);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 5);
        assert!((summary.percent() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        let summary = ProgressSummary {
            completed: 1,
            total: 3,
        };
        assert!((summary.percent() - 33.3).abs() < 1e-9);
    }

    #[test]
    fn chapter_statuses_follow_precedence() {
        let engine = engine();
        let mut snapshot = ProgressSnapshot::default();
        snapshot.mark_completed(TopicKey::new(ChapterId::FIRST, "Token"));
        snapshot.mark_completed(TopicKey::new(ChapterId::FIRST, "Embedding"));
        snapshot.unlock(ChapterId::new(2));

        let statuses: Vec<ChapterStatus> = engine
            .chapter_overview(&snapshot)
            .into_iter()
            .map(|c| c.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                ChapterStatus::Completed,
                ChapterStatus::Available,
                ChapterStatus::Locked
            ]
        );
    }

    #[test]
    fn topic_position_reports_bounds() {
        let engine = engine();
        let snapshot = ProgressSnapshot {
            current_topic_index: 1,
            ..ProgressSnapshot::default()
        };
        let position = engine.topic_position(&snapshot).unwrap();
        assert_eq!(position.number(), 2);
        assert!(position.is_last());
        assert!(!position.is_first());
    }
}
