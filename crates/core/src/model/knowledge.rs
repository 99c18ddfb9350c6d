use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{ChapterId, TopicKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KnowledgeBaseError {
    #[error("knowledge base is not valid JSON: {0}")]
    Parse(String),

    #[error("knowledge base has no chapters")]
    Empty,

    #[error("chapter ids must be dense from 1: expected {expected}, found {found}")]
    NonSequentialChapter { expected: u32, found: u32 },

    #[error("chapter {0} has no topics")]
    EmptyChapter(ChapterId),

    #[error("chapter {0} has a topic with an empty term")]
    EmptyTerm(ChapterId),

    #[error("duplicate topic {0}")]
    DuplicateTerm(TopicKey),

    #[error("quiz for {0} needs at least two options")]
    TooFewOptions(TopicKey),

    #[error("quiz answer {answer} for {key} is out of range for {options} options")]
    AnswerOutOfRange {
        key: TopicKey,
        answer: usize,
        options: usize,
    },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// How hard a topic is; drives the score awarded for a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    /// Points added to the total score when the topic's quiz is answered correctly.
    #[must_use]
    pub fn score(self) -> u32 {
        match self {
            Difficulty::Beginner => 10,
            Difficulty::Intermediate => 20,
            Difficulty::Expert => 30,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
        }
    }
}

//
// ─── TOPICS ────────────────────────────────────────────────────────────────────
//

/// Multiple-choice question attached to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    question: String,
    options: Vec<String>,
    answer: usize,
}

impl Quiz {
    #[must_use]
    pub fn new(question: impl Into<String>, options: Vec<String>, answer: usize) -> Self {
        Self {
            question: question.into(),
            options,
            answer,
        }
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Index of the correct option.
    #[must_use]
    pub fn answer(&self) -> usize {
        self.answer
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.answer
    }
}

/// A single knowledge unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    term: String,
    #[serde(default)]
    english: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    tips: String,
    difficulty: Difficulty,
    quiz: Quiz,
}

impl Topic {
    #[must_use]
    pub fn new(
        term: impl Into<String>,
        english: impl Into<String>,
        definition: impl Into<String>,
        tips: impl Into<String>,
        difficulty: Difficulty,
        quiz: Quiz,
    ) -> Self {
        Self {
            term: term.into(),
            english: english.into(),
            definition: definition.into(),
            tips: tips.into(),
            difficulty,
            quiz,
        }
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn english(&self) -> &str {
        &self.english
    }

    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    #[must_use]
    pub fn tips(&self) -> &str {
        &self.tips
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }
}

//
// ─── CHAPTERS ──────────────────────────────────────────────────────────────────
//

/// Ordered group of topics behind an unlock gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    id: ChapterId,
    title: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    description: String,
    topics: Vec<Topic>,
}

impl Chapter {
    #[must_use]
    pub fn new(
        id: ChapterId,
        title: impl Into<String>,
        icon: impl Into<String>,
        description: impl Into<String>,
        topics: Vec<Topic>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            icon: icon.into(),
            description: description.into(),
            topics,
        }
    }

    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn topic(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Key of the topic at `index`, if any.
    #[must_use]
    pub fn topic_key(&self, index: usize) -> Option<TopicKey> {
        self.topics
            .get(index)
            .map(|topic| TopicKey::new(self.id, topic.term()))
    }

    /// Keys of every topic, in chapter order.
    pub fn topic_keys(&self) -> impl Iterator<Item = TopicKey> + '_ {
        self.topics
            .iter()
            .map(|topic| TopicKey::new(self.id, topic.term()))
    }

    fn check(&self) -> Result<(), KnowledgeBaseError> {
        if self.topics.is_empty() {
            return Err(KnowledgeBaseError::EmptyChapter(self.id));
        }

        let mut seen = HashSet::with_capacity(self.topics.len());
        for topic in &self.topics {
            if topic.term.trim().is_empty() {
                return Err(KnowledgeBaseError::EmptyTerm(self.id));
            }
            let key = TopicKey::new(self.id, topic.term());
            if !seen.insert(topic.term.as_str()) {
                return Err(KnowledgeBaseError::DuplicateTerm(key));
            }
            let options = topic.quiz.options.len();
            if options < 2 {
                return Err(KnowledgeBaseError::TooFewOptions(key));
            }
            if topic.quiz.answer >= options {
                return Err(KnowledgeBaseError::AnswerOutOfRange {
                    key,
                    answer: topic.quiz.answer,
                    options,
                });
            }
        }
        Ok(())
    }
}

//
// ─── KNOWLEDGE BASE ────────────────────────────────────────────────────────────
//

/// Immutable catalog of chapters, loaded once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBase {
    chapters: Vec<Chapter>,
}

#[derive(Deserialize)]
struct KnowledgeBaseDocument {
    chapters: Vec<Chapter>,
}

impl KnowledgeBase {
    /// Build a validated knowledge base.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeBaseError` if there are no chapters, ids are not dense
    /// from 1, or any chapter or quiz is malformed.
    pub fn new(chapters: Vec<Chapter>) -> Result<Self, KnowledgeBaseError> {
        if chapters.is_empty() {
            return Err(KnowledgeBaseError::Empty);
        }
        for (expected, chapter) in (1_u32..).zip(&chapters) {
            if chapter.id.value() != expected {
                return Err(KnowledgeBaseError::NonSequentialChapter {
                    expected,
                    found: chapter.id.value(),
                });
            }
            chapter.check()?;
        }
        Ok(Self { chapters })
    }

    /// Parse a `{ "chapters": [...] }` document.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeBaseError::Parse` for malformed JSON, or any validation
    /// error from [`KnowledgeBase::new`].
    pub fn from_json(text: &str) -> Result<Self, KnowledgeBaseError> {
        let doc: KnowledgeBaseDocument =
            serde_json::from_str(text).map_err(|err| KnowledgeBaseError::Parse(err.to_string()))?;
        Self::new(doc.chapters)
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.chapters.get(index)
    }

    #[must_use]
    pub fn chapter_count(&self) -> u32 {
        u32::try_from(self.chapters.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn contains_chapter(&self, id: ChapterId) -> bool {
        (1..=self.chapter_count()).contains(&id.value())
    }

    /// Total number of topics across all chapters.
    #[must_use]
    pub fn total_topics(&self) -> usize {
        self.chapters.iter().map(Chapter::topic_count).sum()
    }

    #[must_use]
    pub fn topic(&self, key: &TopicKey) -> Option<&Topic> {
        self.chapter(key.chapter())?
            .topics
            .iter()
            .find(|topic| topic.term == key.term())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(answer: usize) -> Quiz {
        Quiz::new("Q?", vec!["a".into(), "b".into(), "c".into()], answer)
    }

    fn topic(term: &str) -> Topic {
        Topic::new(term, "", "", "", Difficulty::Beginner, quiz(0))
    }

    #[test]
    fn difficulty_scores() {
        assert_eq!(Difficulty::Beginner.score(), 10);
        assert_eq!(Difficulty::Intermediate.score(), 20);
        assert_eq!(Difficulty::Expert.score(), 30);
    }

    #[test]
    fn rejects_empty_catalog() {
        assert_eq!(KnowledgeBase::new(vec![]), Err(KnowledgeBaseError::Empty));
    }

    #[test]
    fn rejects_gaps_in_chapter_ids() {
        let chapters = vec![
            Chapter::new(ChapterId::new(1), "One", "", "", vec![topic("a")]),
            Chapter::new(ChapterId::new(3), "Three", "", "", vec![topic("b")]),
        ];
        let err = KnowledgeBase::new(chapters).unwrap_err();
        assert_eq!(
            err,
            KnowledgeBaseError::NonSequentialChapter {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_duplicate_terms_and_bad_answers() {
        let dup = vec![Chapter::new(
            ChapterId::new(1),
            "One",
            "",
            "",
            vec![topic("a"), topic("a")],
        )];
        assert!(matches!(
            KnowledgeBase::new(dup),
            Err(KnowledgeBaseError::DuplicateTerm(_))
        ));

        let bad = vec![Chapter::new(
            ChapterId::new(1),
            "One",
            "",
            "",
            vec![Topic::new("a", "", "", "", Difficulty::Expert, quiz(7))],
        )];
        assert!(matches!(
            KnowledgeBase::new(bad),
            Err(KnowledgeBaseError::AnswerOutOfRange { answer: 7, .. })
        ));
    }

    #[test]
    fn parses_json_document() {
        let json = r#"{
            "chapters": [{
                "id": 1,
                "title": "Basics",
                "icon": "📘",
                "description": "Start here",
                "topics": [{
                    "term": "Token",
                    "english": "Token",
                    "definition": "A unit of text",
                    "tips": "Think of words",
                    "difficulty": "intermediate",
                    "quiz": { "question": "What is a token?", "options": ["x", "y"], "answer": 1 }
                }]
            }]
        }"#;
        let kb = KnowledgeBase::from_json(json).unwrap();
        assert_eq!(kb.chapter_count(), 1);
        assert_eq!(kb.total_topics(), 1);
        let key = TopicKey::new(ChapterId::new(1), "Token");
        let topic = kb.topic(&key).unwrap();
        assert_eq!(topic.difficulty(), Difficulty::Intermediate);
        assert!(topic.quiz().is_correct(1));
        assert!(kb.chapter(ChapterId::new(2)).is_none());
        assert!(kb.chapter(ChapterId::new(0)).is_none());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            KnowledgeBase::from_json("{ nope"),
            Err(KnowledgeBaseError::Parse(_))
        ));
    }
}
