use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::Difficulty;

/// Answered/correct counter pair. `correct <= answered` always holds when
/// mutated through the progress store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBucket {
    pub answered: u64,
    pub correct: u64,
}

impl StatBucket {
    pub fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        self.correct as f64 / self.answered as f64 * 100.0
    }
}

/// Cumulative play statistics persisted under the progress key. Field names
/// are camelCase on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub total_questions_answered: u64,
    pub total_correct_answers: u64,
    pub streak_best: u64,
    pub current_streak: u64,
    pub sessions_count: u64,
    pub total_play_time_seconds: u64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_played_at: Option<DateTime<Utc>>,
    pub per_difficulty_stats: BTreeMap<String, StatBucket>,
    pub per_mode_stats: BTreeMap<String, StatBucket>,
}

impl ProgressRecord {
    /// Zeroed record with a bucket for every difficulty and every `mode`.
    pub fn zeroed<S: AsRef<str>>(modes: &[S]) -> Self {
        Self {
            total_questions_answered: 0,
            total_correct_answers: 0,
            streak_best: 0,
            current_streak: 0,
            sessions_count: 0,
            total_play_time_seconds: 0,
            last_played_at: None,
            per_difficulty_stats: Difficulty::ALL
                .iter()
                .map(|d| (d.as_str().to_string(), StatBucket::default()))
                .collect(),
            per_mode_stats: modes
                .iter()
                .map(|m| (m.as_ref().to_string(), StatBucket::default()))
                .collect(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_questions_answered == 0 {
            return 0.0;
        }
        self.total_correct_answers as f64 / self.total_questions_answered as f64 * 100.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locks {
    pub theme: bool,
    pub difficulty: bool,
    pub game_mode: bool,
}

/// Parental controls persisted under the parent settings key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSettings {
    /// Four-digit PIN, unset until the first parent login.
    pub pin: Option<String>,
    /// Minutes of foreground play per session; 0 means unlimited.
    pub session_time_limit: u32,
    pub stop_after_current_question: bool,
    pub locks: Locks,
    pub allowed_themes: Vec<String>,
    pub allowed_difficulties: Vec<String>,
    pub allowed_modes: Vec<String>,
}

impl ParentSettings {
    pub fn is_theme_allowed(&self, theme: &str) -> bool {
        self.allowed_themes.iter().any(|t| t == theme)
    }

    pub fn is_difficulty_allowed(&self, difficulty: &str) -> bool {
        self.allowed_difficulties.iter().any(|d| d == difficulty)
    }

    pub fn is_mode_allowed(&self, mode: &str) -> bool {
        self.allowed_modes.iter().any(|m| m == mode)
    }

    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.session_time_limit) * 60
    }
}

/// Overlay the top-level keys of `overlay` onto `defaults`. Nested objects
/// are replaced wholesale, not merged. A non-object on either side leaves
/// the defaults untouched.
pub fn shallow_merge(defaults: Value, overlay: Value) -> Value {
    match (defaults, overlay) {
        (Value::Object(mut base), Value::Object(top)) => {
            for (key, value) in top {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (defaults, _) => defaults,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zeroed_record_has_all_buckets() {
        let record = ProgressRecord::zeroed(&["vocab", "labs", "facts"]);
        assert_eq!(record.per_difficulty_stats.len(), 3);
        assert!(record.per_difficulty_stats.contains_key("intermediate"));
        assert_eq!(record.per_mode_stats.len(), 3);
        assert_eq!(record.accuracy(), 0.0);
    }

    #[test]
    fn record_serializes_with_camel_case_and_millis() {
        let mut record = ProgressRecord::zeroed(&["vocab"]);
        record.last_played_at = DateTime::from_timestamp_millis(1_700_000_000_123);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["totalQuestionsAnswered"], json!(0));
        assert_eq!(value["lastPlayedAt"], json!(1_700_000_000_123_i64));
        assert_eq!(value["perModeStats"]["vocab"], json!({"answered": 0, "correct": 0}));
    }

    #[test]
    fn settings_serialize_lock_keys_like_the_web_apps() {
        let settings = ParentSettings {
            pin: None,
            session_time_limit: 0,
            stop_after_current_question: true,
            locks: Locks::default(),
            allowed_themes: vec![],
            allowed_difficulties: vec![],
            allowed_modes: vec![],
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["locks"]["gameMode"], json!(false));
        assert_eq!(value["pin"], Value::Null);
        assert_eq!(value["sessionTimeLimit"], json!(0));
    }

    #[test]
    fn shallow_merge_replaces_top_level_keys_only() {
        let defaults = json!({"a": 1, "nested": {"x": 1, "y": 2}, "keep": true});
        let overlay = json!({"a": 5, "nested": {"x": 9}, "extra": "ignored later"});
        let merged = shallow_merge(defaults, overlay);
        assert_eq!(merged["a"], json!(5));
        assert_eq!(merged["nested"], json!({"x": 9}));
        assert_eq!(merged["keep"], json!(true));
        assert_eq!(merged["extra"], json!("ignored later"));
    }

    #[test]
    fn shallow_merge_ignores_non_object_overlay() {
        let defaults = json!({"a": 1});
        assert_eq!(shallow_merge(defaults.clone(), json!([1, 2])), defaults);
        assert_eq!(shallow_merge(defaults.clone(), Value::Null), defaults);
    }

    #[test]
    fn bucket_accuracy() {
        let mut bucket = StatBucket::default();
        bucket.record(true);
        bucket.record(false);
        assert_eq!(bucket, StatBucket { answered: 2, correct: 1 });
        assert!((bucket.accuracy() - 50.0).abs() < f64::EPSILON);
    }
}
