use quiz_core::engine::{Achievement, AnswerCheck, ChapterOverview, ProgressSummary, TopicPosition};
use quiz_core::model::{Chapter, ProgressSnapshot, Topic};

use crate::quiz_state::TopicVisit;

/// Everything needed to draw the topic on screen.
#[derive(Debug, Clone, Copy)]
pub struct TopicView<'a> {
    pub chapter: &'a Chapter,
    pub topic: &'a Topic,
    pub position: TopicPosition,
    /// The topic's quiz was already answered correctly in an earlier visit.
    pub completed: bool,
    pub visit: &'a TopicVisit,
}

/// Output side of a learning session.
///
/// Implementations draw state; they never change it. User intents flow back
/// through `LearningSession` methods.
pub trait Presenter {
    fn render_chapter_list(&mut self, chapters: &[ChapterOverview], snapshot: &ProgressSnapshot);

    fn render_topic(&mut self, view: &TopicView<'_>, snapshot: &ProgressSnapshot);

    fn render_progress(&mut self, summary: ProgressSummary);

    /// Result of checking the selected option.
    fn show_feedback(&mut self, check: &AnswerCheck);

    fn notify_achievement(&mut self, achievement: &Achievement);

    /// The user tried to move on without picking an option.
    fn prompt_selection(&mut self);
}
