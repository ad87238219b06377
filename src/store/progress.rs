use chrono::Utc;

use crate::store::schema::ProgressRecord;
use crate::store::{KeyValueBackend, load_merged, save_logged};

#[derive(Clone, Debug)]
pub struct ProgressStoreConfig {
    pub storage_key: String,
    pub modes: Vec<String>,
}

impl ProgressStoreConfig {
    pub fn new(storage_key: impl Into<String>, modes: Vec<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            modes,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AnswerEvent<'a> {
    pub correct: bool,
    pub difficulty: &'a str,
    pub mode: &'a str,
}

/// Performance counters for one app, persisted as a single JSON blob.
///
/// Every mutating call is a fresh load, modify, save cycle; nothing is
/// cached between calls. Storage failures are logged and never returned.
pub struct ProgressStore<B> {
    backend: B,
    config: ProgressStoreConfig,
}

impl<B: KeyValueBackend> ProgressStore<B> {
    pub fn new(backend: B, config: ProgressStoreConfig) -> Self {
        Self { backend, config }
    }

    pub fn storage_key(&self) -> &str {
        &self.config.storage_key
    }

    pub fn defaults(&self) -> ProgressRecord {
        ProgressRecord::zeroed(self.config.modes.as_slice())
    }

    pub fn load_progress(&self) -> ProgressRecord {
        load_merged(
            &self.backend,
            &self.config.storage_key,
            self.defaults(),
            "progress",
        )
    }

    pub fn save_progress(&self, record: &ProgressRecord) {
        save_logged(&self.backend, &self.config.storage_key, record, "progress");
    }

    /// Count one answer. Unknown difficulty or mode keys still count toward
    /// the totals but touch no bucket.
    pub fn record_answer(&self, event: AnswerEvent<'_>) -> ProgressRecord {
        let mut progress = self.load_progress();

        progress.total_questions_answered += 1;
        if event.correct {
            progress.total_correct_answers += 1;
            progress.current_streak += 1;
            progress.streak_best = progress.streak_best.max(progress.current_streak);
        } else {
            progress.current_streak = 0;
        }

        if let Some(bucket) = progress.per_difficulty_stats.get_mut(event.difficulty) {
            bucket.record(event.correct);
        }
        if let Some(bucket) = progress.per_mode_stats.get_mut(event.mode) {
            bucket.record(event.correct);
        }

        progress.last_played_at = Some(Utc::now());
        self.save_progress(&progress);
        progress
    }

    pub fn record_session_start(&self) -> ProgressRecord {
        let mut progress = self.load_progress();
        progress.sessions_count += 1;
        progress.last_played_at = Some(Utc::now());
        self.save_progress(&progress);
        progress
    }

    pub fn record_session_end(&self, duration_seconds: u64) -> ProgressRecord {
        let mut progress = self.load_progress();
        progress.total_play_time_seconds += duration_seconds;
        self.save_progress(&progress);
        tracing::info!(duration_seconds, "session ended");
        progress
    }

    /// Overwrite the stored record with zeroed defaults.
    pub fn reset_progress(&self) -> ProgressRecord {
        let progress = self.defaults();
        self.save_progress(&progress);
        progress
    }
}
