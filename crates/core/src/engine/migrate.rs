use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::ProgressEngine;
use crate::model::{ChapterId, ProgressSnapshot, SNAPSHOT_VERSION, Statistics, TopicKey};

impl ProgressEngine {
    /// Turn raw persisted data into a valid snapshot.
    ///
    /// Known fields are read over the defaults, collections stored as objects
    /// or single values are flattened into ordered sequences, unreadable
    /// entries are dropped and the result is validated. Feeding the serialized
    /// result back in yields the same snapshot.
    #[must_use]
    pub fn migrate(&self, raw: &Value) -> ProgressSnapshot {
        self.validate(normalize(raw))
    }
}

/// Read any accepted snapshot shape into the canonical representation,
/// without checking it against a knowledge base.
pub(crate) fn normalize(raw: &Value) -> ProgressSnapshot {
    let defaults = ProgressSnapshot::default();
    let Some(fields) = raw.as_object() else {
        debug!("persisted progress is not an object; using defaults");
        return defaults;
    };

    let version = fields.get("schemaVersion").and_then(as_u64).unwrap_or(0);
    if version < u64::from(SNAPSHOT_VERSION) {
        debug!(from = version, to = SNAPSHOT_VERSION, "upgrading persisted progress");
    }

    ProgressSnapshot {
        current_chapter: fields
            .get("currentChapter")
            .and_then(as_chapter_id)
            .unwrap_or(defaults.current_chapter),
        current_topic_index: fields
            .get("currentTopicIndex")
            .and_then(as_u64)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(defaults.current_topic_index),
        completed_topics: fields
            .get("completedTopics")
            .map(|v| members(v, as_topic_key))
            .unwrap_or(defaults.completed_topics),
        unlocked_chapters: fields
            .get("unlockedChapters")
            .map(|v| members(v, as_chapter_id))
            .unwrap_or(defaults.unlocked_chapters),
        total_score: fields
            .get("totalScore")
            .and_then(as_u64)
            .unwrap_or(defaults.total_score),
        statistics: fields
            .get("statistics")
            .and_then(Value::as_object)
            .map_or(defaults.statistics, statistics),
        last_visit: fields.get("lastVisit").and_then(as_timestamp),
        schema_version: SNAPSHOT_VERSION,
    }
}

/// Flatten a set-like value into its members.
///
/// Arrays keep their order. Objects whose values are all booleans are read as
/// membership maps (`{"1-Token": true}`); other objects contribute their values.
/// A lone scalar is a one-element set.
fn members<T>(value: &Value, read: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(read).collect(),
        Value::Object(map) if !map.is_empty() && map.values().all(Value::is_boolean) => map
            .iter()
            .filter(|(_, present)| present.as_bool() == Some(true))
            .filter_map(|(key, _)| read(&Value::String(key.clone())))
            .collect(),
        Value::Object(map) => map.values().filter_map(read).collect(),
        scalar => read(scalar).into_iter().collect(),
    }
}

fn statistics(fields: &Map<String, Value>) -> Statistics {
    let counter = |name: &str| {
        fields
            .get(name)
            .and_then(as_u64)
            .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
    };
    Statistics {
        total_study_time: fields.get("totalStudyTime").and_then(as_u64).unwrap_or(0),
        correct_answers: counter("correctAnswers"),
        wrong_answers: counter("wrongAnswers"),
        streak_days: counter("streakDays"),
    }
}

/// Non-negative whole numbers, including integral floats and numeric strings.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_chapter_id(value: &Value) -> Option<ChapterId> {
    as_u64(value)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .map(ChapterId::new)
}

fn as_topic_key(value: &Value) -> Option<TopicKey> {
    value.as_str()?.parse().ok()
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.as_str()?)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
