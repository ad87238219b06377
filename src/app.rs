use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::config::Config;
use crate::content::{ContentPack, Difficulty};
use crate::generator::recent::RecentProblems;
use crate::generator::{self, Problem, ProblemRequest};
use crate::session::pin::{PIN_LENGTH, PinOutcome, PinPad, is_valid_pin};
use crate::store::schema::{ParentSettings, ProgressRecord};
use crate::store::parent_settings::DEFAULT_THEMES;
use crate::store::{
    AnswerEvent, KeyValueBackend, ParentSettingsConfig, ParentSettingsStore, ProgressStore,
    ProgressStoreConfig,
};

pub const SEEDS_PER_LEVEL: u32 = 10;
pub const MAX_LEVEL: u32 = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Quiz,
    SessionEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { leveled_up: bool },
    /// The same problem stays up for another try.
    Incorrect,
    /// No problem is showing, the index is out of range, or the session is over.
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{0} is locked by a parent")]
    Locked(&'static str),
    #[error("{0} is not allowed by parent settings")]
    NotAllowed(String),
    #[error("{0} is not part of this pack")]
    Unknown(String),
}

/// Progress store keyed for `pack` under the configured namespace.
pub fn progress_store<B: KeyValueBackend>(
    pack: &ContentPack,
    backend: B,
    config: &Config,
) -> ProgressStore<B> {
    ProgressStore::new(
        backend,
        ProgressStoreConfig::new(config.progress_key(&pack.id), pack.mode_keys()),
    )
}

/// Parent settings store whose default allow-lists cover every mode and
/// theme in `pack`.
pub fn parent_settings_store<B: KeyValueBackend>(
    pack: &ContentPack,
    backend: B,
    config: &Config,
) -> ParentSettingsStore<B> {
    let mut settings_config =
        ParentSettingsConfig::new(config.parent_settings_key(&pack.id), pack.mode_keys());
    if !pack.themes.is_empty() {
        settings_config = settings_config.with_themes(pack.themes.clone());
    }
    ParentSettingsStore::new(backend, settings_config)
}

/// One play session: current selections, the problem on screen, seeds and
/// level, and the stores answers are written to.
pub struct App<B: KeyValueBackend> {
    pub screen: AppScreen,
    pub pack: ContentPack,
    pub mode: String,
    pub theme: String,
    pub difficulty: Difficulty,
    pub level: u32,
    pub seeds: u32,
    pub garden: u32,
    pub problem: Problem,
    pub hinted: Option<usize>,
    pub stats: ProgressRecord,
    pub settings: ParentSettings,
    pub pending_session_end: bool,
    progress: ProgressStore<B>,
    parent_settings: ParentSettingsStore<B>,
    recent: RecentProblems,
    rng: SmallRng,
}

impl<B: KeyValueBackend + Clone> App<B> {
    pub fn new(pack: ContentPack, backend: B, config: &Config) -> Self {
        Self::with_rng(pack, backend, config, SmallRng::from_entropy())
    }

    pub fn with_rng(pack: ContentPack, backend: B, config: &Config, rng: SmallRng) -> Self {
        let progress = progress_store(&pack, backend.clone(), config);
        let parent_settings = parent_settings_store(&pack, backend, config);
        let settings = parent_settings.load_parent_settings();
        let stats = progress.record_session_start();

        let mode = config
            .mode
            .clone()
            .or_else(|| pack.modes.first().map(|m| m.key.clone()))
            .unwrap_or_default();
        let theme = config
            .theme
            .clone()
            .or_else(|| pack.themes.first().cloned())
            .unwrap_or_else(|| "garden".to_string());
        let difficulty = config
            .difficulty
            .as_deref()
            .map(Difficulty::from_key_lenient)
            .unwrap_or(Difficulty::Intermediate);

        let mut app = Self {
            screen: AppScreen::Quiz,
            pack,
            mode,
            theme,
            difficulty,
            level: 1,
            seeds: 0,
            garden: 0,
            problem: Problem::empty(""),
            hinted: None,
            stats,
            settings,
            pending_session_end: false,
            progress,
            parent_settings,
            recent: RecentProblems::new(config.recent_history, config.max_rerolls),
            rng,
        };
        app.coerce_selections();
        app.next_problem();
        app
    }
}

impl<B: KeyValueBackend> App<B> {
    pub fn progress_store(&self) -> &ProgressStore<B> {
        &self.progress
    }

    pub fn parent_settings_store(&self) -> &ParentSettingsStore<B> {
        &self.parent_settings
    }

    /// Move any selection the parent no longer allows onto the first allowed
    /// value.
    fn coerce_selections(&mut self) {
        let s = &self.settings;
        if let Some(first) = s.allowed_modes.first()
            && !s.is_mode_allowed(&self.mode)
        {
            self.mode = first.clone();
        }
        if let Some(first) = s.allowed_themes.first()
            && !s.is_theme_allowed(&self.theme)
        {
            self.theme = first.clone();
        }
        if let Some(first) = s.allowed_difficulties.first()
            && !s.is_difficulty_allowed(self.difficulty.as_str())
        {
            self.difficulty = Difficulty::from_key_lenient(first);
        }
    }

    pub fn next_problem(&mut self) {
        let request = ProblemRequest {
            mode: &self.mode,
            theme: &self.theme,
            difficulty: self.difficulty,
            level: Some(self.level),
        };
        let pack = &self.pack;
        let rng = &mut self.rng;
        self.problem = self
            .recent
            .draw(&request, || generator::generate(pack, &request, rng));
        self.hinted = None;
    }

    pub fn answer(&mut self, index: usize) -> AnswerOutcome {
        if self.screen != AppScreen::Quiz {
            return AnswerOutcome::Ignored;
        }
        let Some(choice) = self.problem.options.get(index) else {
            return AnswerOutcome::Ignored;
        };
        let correct = self.problem.is_correct(choice);

        self.stats = self.progress.record_answer(AnswerEvent {
            correct,
            difficulty: self.difficulty.as_str(),
            mode: &self.mode,
        });

        if !correct {
            return AnswerOutcome::Incorrect;
        }

        self.seeds += 1;
        let leveled_up = self.seeds >= SEEDS_PER_LEVEL;
        if self.pending_session_end {
            self.screen = AppScreen::SessionEnd;
            return AnswerOutcome::Correct { leveled_up };
        }
        if leveled_up {
            self.garden += 1;
            self.level = (self.level + 1).min(MAX_LEVEL);
            self.seeds = 0;
        }
        self.next_problem();
        AnswerOutcome::Correct { leveled_up }
    }

    /// Point at one wrong option. Repeated calls return the same index.
    pub fn hint(&mut self) -> Option<usize> {
        if self.hinted.is_none() {
            self.hinted = self.problem.incorrect_indices().choose(&mut self.rng).copied();
        }
        self.hinted
    }

    pub fn reset_garden(&mut self) {
        self.level = 1;
        self.seeds = 0;
        self.garden = 0;
        self.next_problem();
    }

    /// The parent's time limit ran out.
    pub fn handle_time_up(&mut self) {
        if self.settings.stop_after_current_question {
            self.pending_session_end = true;
        } else {
            self.screen = AppScreen::SessionEnd;
        }
    }

    pub fn session_over(&self) -> bool {
        self.screen == AppScreen::SessionEnd
    }

    pub fn select_mode(&mut self, mode: &str) -> Result<(), SelectionError> {
        if !self.pack.has_mode(mode) {
            return Err(SelectionError::Unknown(mode.to_string()));
        }
        if self.settings.locks.game_mode {
            return Err(SelectionError::Locked("game mode"));
        }
        if !self.parent_settings.is_mode_allowed(mode) {
            return Err(SelectionError::NotAllowed(mode.to_string()));
        }
        self.mode = mode.to_string();
        self.next_problem();
        Ok(())
    }

    pub fn select_theme(&mut self, theme: &str) -> Result<(), SelectionError> {
        if !self.pack.themes.is_empty() && !self.pack.themes.iter().any(|t| t == theme) {
            return Err(SelectionError::Unknown(theme.to_string()));
        }
        if self.settings.locks.theme {
            return Err(SelectionError::Locked("theme"));
        }
        if !self.parent_settings.is_theme_allowed(theme) {
            return Err(SelectionError::NotAllowed(theme.to_string()));
        }
        self.theme = theme.to_string();
        self.next_problem();
        Ok(())
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SelectionError> {
        if self.settings.locks.difficulty {
            return Err(SelectionError::Locked("difficulty"));
        }
        if !self.parent_settings.is_difficulty_allowed(difficulty.as_str()) {
            return Err(SelectionError::NotAllowed(difficulty.to_string()));
        }
        self.difficulty = difficulty;
        self.next_problem();
        Ok(())
    }

    pub fn cycle_mode(&mut self) -> Result<(), SelectionError> {
        let modes = self.pack.mode_keys();
        match next_allowed(&modes, &self.mode, |m| self.settings.is_mode_allowed(m)) {
            Some(next) => self.select_mode(&next),
            None => Ok(()),
        }
    }

    pub fn cycle_theme(&mut self) -> Result<(), SelectionError> {
        let themes: Vec<String> = if self.pack.themes.is_empty() {
            DEFAULT_THEMES.iter().map(|t| t.to_string()).collect()
        } else {
            self.pack.themes.clone()
        };
        match next_allowed(&themes, &self.theme, |t| self.settings.is_theme_allowed(t)) {
            Some(next) => self.select_theme(&next),
            None => Ok(()),
        }
    }

    pub fn cycle_difficulty(&mut self) -> Result<(), SelectionError> {
        let keys: Vec<String> = Difficulty::ALL.iter().map(|d| d.as_str().to_string()).collect();
        let next = next_allowed(&keys, self.difficulty.as_str(), |d| {
            self.settings.is_difficulty_allowed(d)
        });
        match next {
            Some(next) => self.select_difficulty(Difficulty::from_key_lenient(&next)),
            None => Ok(()),
        }
    }

    /// Persist new parent settings and re-apply them to the live session.
    pub fn update_settings(&mut self, settings: ParentSettings) {
        self.parent_settings.save_parent_settings(&settings);
        self.settings = settings;
        let before = (self.mode.clone(), self.theme.clone(), self.difficulty);
        self.coerce_selections();
        if before != (self.mode.clone(), self.theme.clone(), self.difficulty) {
            self.next_problem();
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParentEditError {
    #[error("the parent PIN is {PIN_LENGTH} digits")]
    MalformedPin,
    #[error("incorrect parent PIN")]
    WrongPin,
    #[error("a new PIN must be {PIN_LENGTH} digits")]
    MalformedNewPin,
    #[error("allowed {0} cannot be empty")]
    EmptyAllowList(&'static str),
    #[error("unknown {what} entry: {entry}")]
    UnknownEntry { what: &'static str, entry: String },
}

/// Changes a parent asked for. `None` leaves a setting as it is.
#[derive(Clone, Debug, Default)]
pub struct ParentEdit {
    pub time_limit: Option<u32>,
    pub stop_after_question: Option<bool>,
    pub lock_theme: Option<bool>,
    pub lock_difficulty: Option<bool>,
    pub lock_mode: Option<bool>,
    pub allow_themes: Option<Vec<String>>,
    pub allow_difficulties: Option<Vec<String>>,
    pub allow_modes: Option<Vec<String>>,
    pub new_pin: Option<String>,
}

/// Trim entries, drop blanks, and check each against `known`. An allow-list
/// is never left empty.
fn allow_list<F: Fn(&str) -> bool>(
    what: &'static str,
    entries: Vec<String>,
    known: F,
) -> Result<Vec<String>, ParentEditError> {
    let entries: Vec<String> = entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(ParentEditError::EmptyAllowList(what));
    }
    if let Some(unknown) = entries.iter().find(|e| !known(e.as_str())) {
        return Err(ParentEditError::UnknownEntry {
            what,
            entry: unknown.clone(),
        });
    }
    Ok(entries)
}

/// Check `pin` through the PIN pad. With no stored PIN, `pin` becomes the PIN.
pub fn unlock_parent_settings(
    mut settings: ParentSettings,
    pin: &str,
) -> Result<ParentSettings, ParentEditError> {
    if !is_valid_pin(pin) {
        return Err(ParentEditError::MalformedPin);
    }
    let mut pad = PinPad::new(settings.pin.as_deref());
    match pad.enter(pin) {
        PinOutcome::Authenticated => Ok(settings),
        PinOutcome::PinSet(pin) => {
            settings.pin = Some(pin);
            Ok(settings)
        }
        PinOutcome::Rejected => Err(ParentEditError::WrongPin),
        PinOutcome::Pending => Err(ParentEditError::MalformedPin),
    }
}

/// Apply `edit` to already unlocked settings. Nothing changes on error.
pub fn apply_parent_edit(
    mut settings: ParentSettings,
    edit: ParentEdit,
    pack: &ContentPack,
) -> Result<ParentSettings, ParentEditError> {
    if let Some(minutes) = edit.time_limit {
        settings.session_time_limit = minutes;
    }
    if let Some(stop) = edit.stop_after_question {
        settings.stop_after_current_question = stop;
    }
    if let Some(lock) = edit.lock_theme {
        settings.locks.theme = lock;
    }
    if let Some(lock) = edit.lock_difficulty {
        settings.locks.difficulty = lock;
    }
    if let Some(lock) = edit.lock_mode {
        settings.locks.game_mode = lock;
    }
    if let Some(themes) = edit.allow_themes {
        settings.allowed_themes = allow_list("themes", themes, |t| {
            pack.themes.is_empty() || pack.themes.iter().any(|known| known == t)
        })?;
    }
    if let Some(difficulties) = edit.allow_difficulties {
        settings.allowed_difficulties = allow_list("difficulties", difficulties, |d| {
            d.parse::<Difficulty>().is_ok()
        })?;
    }
    if let Some(modes) = edit.allow_modes {
        settings.allowed_modes = allow_list("modes", modes, |m| pack.has_mode(m))?;
    }
    if let Some(pin) = edit.new_pin {
        if !is_valid_pin(&pin) {
            return Err(ParentEditError::MalformedNewPin);
        }
        settings.pin = Some(pin);
    }
    Ok(settings)
}

/// Unlock, edit and persist parent settings. The store is only written when
/// the PIN is accepted and every change is valid.
pub fn edit_parent_settings<B: KeyValueBackend>(
    store: &ParentSettingsStore<B>,
    pin: &str,
    edit: ParentEdit,
    pack: &ContentPack,
) -> Result<ParentSettings, ParentEditError> {
    let settings = unlock_parent_settings(store.load_parent_settings(), pin)?;
    let settings = apply_parent_edit(settings, edit, pack)?;
    store.save_parent_settings(&settings);
    tracing::info!(pack = %pack.id, "parent settings updated");
    Ok(settings)
}

/// The first allowed entry after `current`, wrapping around.
fn next_allowed<F: Fn(&str) -> bool>(items: &[String], current: &str, allowed: F) -> Option<String> {
    let start = items.iter().position(|i| i == current).map_or(0, |p| p + 1);
    items
        .iter()
        .cycle()
        .skip(start)
        .take(items.len())
        .find(|i| *i != current && allowed(i))
        .cloned()
}
