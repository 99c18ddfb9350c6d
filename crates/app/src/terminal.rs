use std::fmt::Display;
use std::io::Write;

use quiz_core::engine::{
    Achievement, AnswerCheck, ChapterOverview, ChapterStatus, ProgressSummary,
};
use quiz_core::model::ProgressSnapshot;
use services::{Presenter, QuizState, TopicView};
use tracing::warn;

use crate::command::option_label;

/// Line-oriented presenter for an interactive terminal.
pub struct TerminalPresenter<W> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn prompt(&mut self) {
        self.emit("> ");
    }

    pub fn message(&mut self, text: impl Display) {
        self.emit(&format!("{text}\n"));
    }

    pub fn error(&mut self, err: impl Display) {
        self.emit(&format!("⚠️  {err}\n"));
    }

    pub fn help(&mut self) {
        self.emit(
            "\
Commands:
  chapters            list chapters and their status
  chapter <n>         open an unlocked chapter
  pick <A|1>          choose a quiz option (a bare letter works too)
  next                check the answer, then move on
  prev                go back one topic
  stats               show score and answer statistics
  export [file]       print progress, or write it to a file
  import <file>       replace progress with an exported file
  reset               forget all progress
  help                show this list
  quit                leave
",
        );
    }

    pub fn render_stats(&mut self, snapshot: &ProgressSnapshot, summary: ProgressSummary) {
        let stats = &snapshot.statistics;
        let accuracy = stats
            .accuracy()
            .map_or_else(|| "n/a".to_owned(), |ratio| format!("{:.1}%", ratio * 100.0));
        let last_visit = snapshot
            .last_visit
            .map_or_else(|| "never".to_owned(), |at| at.to_rfc3339());
        let mut text = format!("Score: {}\n", snapshot.total_score);
        text.push_str(&format!(
            "Topics: {}/{} ({:.1}%)\n",
            summary.completed,
            summary.total,
            summary.percent()
        ));
        text.push_str(&format!(
            "Answers: {} correct, {} wrong (accuracy {accuracy})\n",
            stats.correct_answers, stats.wrong_answers
        ));
        text.push_str(&format!(
            "Unlocked chapters: {}\nLast visit: {last_visit}\n",
            snapshot.unlocked_chapters.len()
        ));
        self.emit(&text);
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(%err, "failed to write to terminal");
        }
    }
}

fn status_marker(status: ChapterStatus) -> &'static str {
    match status {
        ChapterStatus::Locked => "🔒",
        ChapterStatus::Completed => "✅",
        ChapterStatus::Current => "▶ ",
        ChapterStatus::Available => "  ",
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_chapter_list(&mut self, chapters: &[ChapterOverview], _snapshot: &ProgressSnapshot) {
        let mut text = String::from("\nChapters\n");
        for chapter in chapters {
            text.push_str(&format!(
                "  {} {}. {} {}\n",
                status_marker(chapter.status),
                chapter.id,
                chapter.icon,
                chapter.title
            ));
        }
        self.emit(&text);
    }

    fn render_topic(&mut self, view: &TopicView<'_>, _snapshot: &ProgressSnapshot) {
        let topic = view.topic;
        let quiz = topic.quiz();
        let mut text = format!(
            "\n── {} {} · topic {}/{} ──\n",
            view.chapter.icon(),
            view.chapter.title(),
            view.position.number(),
            view.position.count,
        );
        text.push_str(&format!(
            "{} ({})  [{}, {} pts]{}\n",
            topic.term(),
            topic.english(),
            topic.difficulty().label(),
            topic.difficulty().score(),
            if view.completed { "  ✓ learned" } else { "" },
        ));
        if !topic.definition().is_empty() {
            text.push_str(&format!("{}\n", topic.definition()));
        }
        if !topic.tips().is_empty() {
            text.push_str(&format!("Tip: {}\n", topic.tips()));
        }

        text.push_str(&format!("\nQuiz: {}\n", quiz.question()));
        let state = view.visit.state();
        for (index, option) in quiz.options().iter().enumerate() {
            let marker = match state {
                QuizState::Checked { .. } if index == quiz.answer() => "✓",
                QuizState::Checked { selected, .. } if index == selected => "✗",
                QuizState::Unanswered {
                    selected: Some(selected),
                } if index == selected => "*",
                _ => " ",
            };
            text.push_str(&format!("  {marker} {}) {option}\n", option_label(index)));
        }
        if view.completed && !view.visit.is_checked() {
            text.push_str("Already answered. `next` moves on.\n");
        }
        self.emit(&text);
    }

    fn render_progress(&mut self, summary: ProgressSummary) {
        self.emit(&format!(
            "Progress: {}/{} ({:.1}%)\n",
            summary.completed,
            summary.total,
            summary.percent()
        ));
    }

    fn show_feedback(&mut self, check: &AnswerCheck) {
        let text = if check.correct {
            format!("✅ Correct! +{} points\n", check.points)
        } else {
            format!(
                "❌ Not quite. The correct answer is {}.\n",
                option_label(check.correct_index)
            )
        };
        self.emit(&format!("{text}Type `next` to continue.\n"));
    }

    fn notify_achievement(&mut self, achievement: &Achievement) {
        self.emit(&format!(
            "\n{}\n{}\n",
            achievement.title, achievement.description
        ));
    }

    fn prompt_selection(&mut self) {
        self.emit("Pick an answer first, e.g. `pick A`.\n");
    }
}
