use tracing::{debug, info};

use super::{EngineError, ProgressEngine};
use crate::model::{Chapter, ChapterId, ProgressSnapshot, Topic, TopicKey};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Notification raised when finishing a chapter unlocks the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub title: String,
    pub chapter_title: String,
    pub description: String,
    pub unlocked: ChapterId,
}

impl Achievement {
    fn chapter_completed(chapter: &Chapter, unlocked: ChapterId) -> Self {
        Self {
            title: "🎉 Chapter complete!".to_string(),
            chapter_title: chapter.title().to_string(),
            description: format!(
                "Congratulations on finishing {}. The next chapter is unlocked!",
                chapter.title()
            ),
            unlocked,
        }
    }
}

/// Evaluation of the selected option for the current topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCheck {
    pub key: TopicKey,
    pub selected: usize,
    pub correct_index: usize,
    pub correct: bool,
    /// Score added to the total; zero for a wrong answer.
    pub points: u32,
    pub achievement: Option<Achievement>,
}

/// Where the position went after an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextTopic,
    NextChapter(ChapterId),
    /// Last topic of the last reachable chapter.
    Stayed,
}

/// Result of [`ProgressEngine::next_topic`].
///
/// The first advance on an unanswered topic only checks the answer; the
/// position moves on the following advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Checked(AnswerCheck),
    Advanced(Advance),
}

impl NextOutcome {
    #[must_use]
    pub fn is_checked(&self) -> bool {
        matches!(self, NextOutcome::Checked(_))
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

impl ProgressEngine {
    /// True when every topic of `chapter` is in the completed set.
    #[must_use]
    pub fn is_chapter_completed(&self, chapter: &Chapter, snapshot: &ProgressSnapshot) -> bool {
        chapter
            .topic_keys()
            .all(|key| snapshot.is_completed(&key))
    }

    /// Unlock the chapter after `completed`, if there is one and it is still locked.
    ///
    /// Returns the achievement to show; `None` when nothing was unlocked.
    pub fn unlock_next_chapter(
        &self,
        snapshot: &mut ProgressSnapshot,
        completed: ChapterId,
    ) -> Option<Achievement> {
        let next = completed.next()?;
        if !self.knowledge().contains_chapter(next) || !snapshot.unlock(next) {
            return None;
        }
        let chapter = self.knowledge().chapter(completed)?;
        info!(completed = %completed, unlocked = %next, "chapter completed");
        Some(Achievement::chapter_completed(chapter, next))
    }

    /// Handle an advance request on the current topic.
    ///
    /// - Completed topic, or answer already checked during this visit: move on.
    /// - Otherwise evaluate `selected`, record the result and stay on the topic.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoSelection` when the topic still needs an answer
    /// and none was selected. The caller's snapshot is left as it was.
    pub fn next_topic(
        &self,
        snapshot: &ProgressSnapshot,
        selected: Option<usize>,
        already_checked: bool,
    ) -> Result<(ProgressSnapshot, NextOutcome), EngineError> {
        let current = self.validate(snapshot.clone());
        let knowledge = self.knowledge();
        let position = knowledge.chapter(current.current_chapter).and_then(|chapter| {
            chapter
                .topic(current.current_topic_index)
                .map(|topic| (chapter, topic))
        });
        let Some((chapter, topic)) = position else {
            return Ok((current, NextOutcome::Advanced(Advance::Stayed)));
        };
        let key = TopicKey::new(chapter.id(), topic.term());

        if already_checked || current.is_completed(&key) {
            let (next, advance) = self.advance(current);
            debug!(topic = %key, ?advance, "advanced");
            return Ok((next, NextOutcome::Advanced(advance)));
        }

        let selected = selected.ok_or(EngineError::NoSelection)?;
        let (next, check) = self.check_answer(current, chapter, topic, key, selected);
        Ok((self.validate(next), NextOutcome::Checked(check)))
    }

    fn check_answer(
        &self,
        mut snapshot: ProgressSnapshot,
        chapter: &Chapter,
        topic: &Topic,
        key: TopicKey,
        selected: usize,
    ) -> (ProgressSnapshot, AnswerCheck) {
        let correct = topic.quiz().is_correct(selected);
        let mut points = 0;
        let mut achievement = None;

        if correct {
            points = topic.difficulty().score();
            snapshot.mark_completed(key.clone());
            snapshot.total_score = snapshot.total_score.saturating_add(u64::from(points));
            let stats = &mut snapshot.statistics;
            stats.correct_answers = stats.correct_answers.saturating_add(1);
            if self.is_chapter_completed(chapter, &snapshot) {
                achievement = self.unlock_next_chapter(&mut snapshot, chapter.id());
            }
        } else {
            snapshot.statistics.wrong_answers = snapshot.statistics.wrong_answers.saturating_add(1);
        }
        debug!(topic = %key, selected, correct, points, "answer checked");

        let check = AnswerCheck {
            key,
            selected,
            correct_index: topic.quiz().answer(),
            correct,
            points,
            achievement,
        };
        (snapshot, check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::engine;

    fn token() -> TopicKey {
        TopicKey::new(ChapterId::FIRST, "Token")
    }

    #[test]
    fn correct_answer_completes_topic_and_scores() {
        let engine = engine();
        let snapshot = ProgressSnapshot::default();

        let (next, outcome) = engine.next_topic(&snapshot, Some(1), false).unwrap();
        let NextOutcome::Checked(check) = outcome else {
            panic!("expected a checked outcome");
        };
        assert!(check.correct);
        assert_eq!(check.points, 10);
        assert_eq!(next.total_score, 10);
        assert!(next.is_completed(&token()));
        assert_eq!(next.statistics.correct_answers, 1);
        assert_eq!(next.current_topic_index, 0);
    }

    #[test]
    fn wrong_answer_counts_and_keeps_topic_open() {
        let engine = engine();
        let snapshot = ProgressSnapshot::default();

        let (next, outcome) = engine.next_topic(&snapshot, Some(0), false).unwrap();
        let NextOutcome::Checked(check) = outcome else {
            panic!("expected a checked outcome");
        };
        assert!(!check.correct);
        assert_eq!(check.correct_index, 1);
        assert_eq!(next.total_score, 0);
        assert!(!next.is_completed(&token()));
        assert_eq!(next.statistics.wrong_answers, 1);
    }

    #[test]
    fn missing_selection_is_rejected() {
        let engine = engine();
        let snapshot = ProgressSnapshot::default();
        let err = engine.next_topic(&snapshot, None, false).unwrap_err();
        assert_eq!(err, EngineError::NoSelection);
        assert_eq!(snapshot, ProgressSnapshot::default());
    }

    #[test]
    fn second_advance_moves_even_after_wrong_answer() {
        let engine = engine();
        let (checked, _) = engine
            .next_topic(&ProgressSnapshot::default(), Some(3), false)
            .unwrap();
        let (moved, outcome) = engine.next_topic(&checked, Some(3), true).unwrap();
        assert_eq!(outcome, NextOutcome::Advanced(Advance::NextTopic));
        assert_eq!(moved.current_topic_index, 1);
        assert_eq!(moved.statistics.wrong_answers, 1);
    }

    #[test]
    fn completed_topic_skips_evaluation() {
        let engine = engine();
        let mut snapshot = ProgressSnapshot::default();
        snapshot.mark_completed(token());

        let (next, outcome) = engine.next_topic(&snapshot, None, false).unwrap();
        assert_eq!(outcome, NextOutcome::Advanced(Advance::NextTopic));
        assert_eq!(next.statistics, snapshot.statistics);
    }

    #[test]
    fn finishing_chapter_unlocks_next_once() {
        let engine = engine();
        let mut achievements = Vec::new();
        let mut snapshot = ProgressSnapshot::default();

        for answer in [1, 2] {
            let (checked, outcome) = engine.next_topic(&snapshot, Some(answer), false).unwrap();
            if let NextOutcome::Checked(AnswerCheck {
                achievement: Some(a),
                ..
            }) = outcome
            {
                achievements.push(a);
            }
            let (moved, _) = engine.next_topic(&checked, None, true).unwrap();
            snapshot = moved;
        }

        assert!(snapshot.is_unlocked(ChapterId::new(2)));
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].chapter_title, "Foundations");
        assert_eq!(achievements[0].unlocked, ChapterId::new(2));
        assert_eq!(snapshot.total_score, 30);
        // the second advance on the last topic crossed into the new chapter
        assert_eq!(snapshot.current_chapter, ChapterId::new(2));

        let again = engine.unlock_next_chapter(&mut snapshot, ChapterId::FIRST);
        assert!(again.is_none());
    }

    #[test]
    fn last_chapter_completion_unlocks_nothing() {
        let engine = engine();
        let mut snapshot = ProgressSnapshot::default();
        assert!(engine
            .unlock_next_chapter(&mut snapshot, ChapterId::new(3))
            .is_none());
        assert_eq!(snapshot.unlocked_chapters, vec![ChapterId::FIRST]);
    }

    #[test]
    fn completed_topics_never_shrink() {
        let engine = engine();
        let mut snapshot = ProgressSnapshot::default();
        let mut last_len = 0;
        let steps: [(Option<usize>, bool); 6] = [
            (Some(1), false),
            (None, true),
            (Some(0), false),
            (None, true),
            (None, false),
            (Some(2), false),
        ];
        for (selected, checked) in steps {
            if let Ok((next, _)) = engine.next_topic(&snapshot, selected, checked) {
                snapshot = next;
            }
            snapshot = engine.prev_topic(&snapshot);
            snapshot = engine.select_chapter(&snapshot, ChapterId::FIRST);
            assert!(snapshot.completed_topics.len() >= last_len);
            assert!(snapshot.is_unlocked(ChapterId::FIRST));
            last_len = snapshot.completed_topics.len();
        }
    }
}
