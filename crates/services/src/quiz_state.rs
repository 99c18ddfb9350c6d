use quiz_core::model::TopicKey;

/// Answer state of the topic currently on screen.
///
/// Lives only for the session; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// No answer evaluated yet; the user may still change the pick.
    Unanswered { selected: Option<usize> },
    /// The pick was evaluated; the next advance moves on.
    Checked { selected: usize, correct: bool },
}

impl Default for QuizState {
    fn default() -> Self {
        QuizState::Unanswered { selected: None }
    }
}

/// Quiz state scoped to one displayed topic.
///
/// Switching to another topic discards the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicVisit {
    key: Option<TopicKey>,
    state: QuizState,
}

impl TopicVisit {
    #[must_use]
    pub fn new(key: Option<TopicKey>) -> Self {
        Self {
            key,
            state: QuizState::default(),
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&TopicKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self.state {
            QuizState::Unanswered { selected } => selected,
            QuizState::Checked { selected, .. } => Some(selected),
        }
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        matches!(self.state, QuizState::Checked { .. })
    }

    /// Pick an option. Ignored once the answer has been checked.
    ///
    /// Returns whether the pick was taken.
    pub fn select(&mut self, option: usize) -> bool {
        match self.state {
            QuizState::Unanswered { .. } => {
                self.state = QuizState::Unanswered {
                    selected: Some(option),
                };
                true
            }
            QuizState::Checked { .. } => false,
        }
    }

    pub fn mark_checked(&mut self, selected: usize, correct: bool) {
        self.state = QuizState::Checked { selected, correct };
    }

    /// Point the visit at `key`, clearing the state if the topic changed.
    ///
    /// Returns `true` when the state was cleared.
    pub fn follow(&mut self, key: Option<TopicKey>) -> bool {
        if self.key == key {
            return false;
        }
        *self = TopicVisit::new(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ChapterId;

    fn key(term: &str) -> Option<TopicKey> {
        Some(TopicKey::new(ChapterId::FIRST, term))
    }

    #[test]
    fn picks_can_change_until_checked() {
        let mut visit = TopicVisit::new(key("Token"));
        assert!(visit.select(0));
        assert!(visit.select(2));
        assert_eq!(visit.selected(), Some(2));

        visit.mark_checked(2, false);
        assert!(!visit.select(1));
        assert_eq!(
            visit.state(),
            QuizState::Checked {
                selected: 2,
                correct: false
            }
        );
    }

    #[test]
    fn following_same_topic_keeps_state() {
        let mut visit = TopicVisit::new(key("Token"));
        visit.select(1);
        assert!(!visit.follow(key("Token")));
        assert_eq!(visit.selected(), Some(1));
    }

    #[test]
    fn following_new_topic_resets_state() {
        let mut visit = TopicVisit::new(key("Token"));
        visit.select(1);
        visit.mark_checked(1, true);
        assert!(visit.follow(key("Embedding")));
        assert_eq!(visit.state(), QuizState::default());
        assert_eq!(visit.key(), key("Embedding").as_ref());
    }
}
