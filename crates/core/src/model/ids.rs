use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a chapter in the knowledge base.
///
/// Chapter ids are dense and start at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(u32);

impl ChapterId {
    /// The first chapter, which is always unlocked.
    pub const FIRST: ChapterId = ChapterId(1);

    /// Creates a new `ChapterId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The chapter that follows this one, if the id space allows it.
    #[must_use]
    pub fn next(&self) -> Option<ChapterId> {
        self.0.checked_add(1).map(ChapterId)
    }
}

impl fmt::Debug for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChapterId({})", self.0)
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Topic Key ─────────────────────────────────────────────────────────────────

/// Stable identity of a topic: the owning chapter plus the topic's term.
///
/// Persisted as `"<chapter>-<term>"`. Terms may themselves contain `-`; only the
/// first separator splits the chapter id off.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey {
    chapter: ChapterId,
    term: String,
}

impl TopicKey {
    #[must_use]
    pub fn new(chapter: ChapterId, term: impl Into<String>) -> Self {
        Self {
            chapter,
            term: term.into(),
        }
    }

    #[must_use]
    pub fn chapter(&self) -> ChapterId {
        self.chapter
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }
}

impl fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicKey({}-{})", self.chapter, self.term)
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.chapter, self.term)
    }
}

impl Serialize for TopicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TopicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an identifier from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ChapterId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(id) if id > 0 => Ok(ChapterId(id)),
            _ => Err(ParseIdError {
                kind: "ChapterId",
                raw: s.to_string(),
            }),
        }
    }
}

impl FromStr for TopicKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            kind: "TopicKey",
            raw: s.to_string(),
        };
        let (chapter, term) = s.split_once('-').ok_or_else(err)?;
        let chapter = chapter.parse::<ChapterId>().map_err(|_| err())?;
        if term.is_empty() {
            return Err(err());
        }
        Ok(TopicKey::new(chapter, term))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
