use crate::content::Difficulty;
use crate::store::schema::{Locks, ParentSettings};
use crate::store::{KeyValueBackend, load_merged, save_logged};

pub const DEFAULT_THEMES: [&str; 3] = ["garden", "ocean", "space"];

#[derive(Clone, Debug)]
pub struct ParentSettingsConfig {
    pub storage_key: String,
    pub allowed_modes: Vec<String>,
    pub allowed_themes: Vec<String>,
}

impl ParentSettingsConfig {
    pub fn new(storage_key: impl Into<String>, allowed_modes: Vec<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            allowed_modes,
            allowed_themes: DEFAULT_THEMES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Replace the default garden/ocean/space theme allow-list.
    pub fn with_themes(mut self, themes: Vec<String>) -> Self {
        self.allowed_themes = themes;
        self
    }
}

/// Parental controls. The `is_*_allowed` checks reload from storage on every
/// call so a saved change applies to the very next check.
pub struct ParentSettingsStore<B> {
    backend: B,
    config: ParentSettingsConfig,
}

impl<B: KeyValueBackend> ParentSettingsStore<B> {
    pub fn new(backend: B, config: ParentSettingsConfig) -> Self {
        Self { backend, config }
    }

    pub fn defaults(&self) -> ParentSettings {
        ParentSettings {
            pin: None,
            session_time_limit: 0,
            stop_after_current_question: true,
            locks: Locks::default(),
            allowed_themes: self.config.allowed_themes.clone(),
            allowed_difficulties: Difficulty::ALL
                .iter()
                .map(|d| d.as_str().to_string())
                .collect(),
            allowed_modes: self.config.allowed_modes.clone(),
        }
    }

    pub fn load_parent_settings(&self) -> ParentSettings {
        load_merged(
            &self.backend,
            &self.config.storage_key,
            self.defaults(),
            "parent settings",
        )
    }

    pub fn save_parent_settings(&self, settings: &ParentSettings) {
        save_logged(
            &self.backend,
            &self.config.storage_key,
            settings,
            "parent settings",
        );
    }

    pub fn is_theme_allowed(&self, theme: &str) -> bool {
        self.load_parent_settings().is_theme_allowed(theme)
    }

    pub fn is_difficulty_allowed(&self, difficulty: &str) -> bool {
        self.load_parent_settings().is_difficulty_allowed(difficulty)
    }

    pub fn is_mode_allowed(&self, mode: &str) -> bool {
        self.load_parent_settings().is_mode_allowed(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use crate::store::testing::BrokenBackend;

    const KEY: &str = "science_sprouts_parent_settings";

    fn config() -> ParentSettingsConfig {
        ParentSettingsConfig::new(KEY, vec!["vocab".into(), "labs".into(), "facts".into()])
    }

    #[test]
    fn defaults_allow_everything() {
        let store = ParentSettingsStore::new(MemoryBackend::new(), config());
        let settings = store.load_parent_settings();
        assert_eq!(settings.pin, None);
        assert_eq!(settings.session_time_limit, 0);
        assert!(settings.stop_after_current_question);
        assert_eq!(settings.locks, Locks::default());
        assert!(store.is_theme_allowed("ocean"));
        assert!(store.is_difficulty_allowed("advanced"));
        assert!(store.is_mode_allowed("labs"));
        assert!(!store.is_mode_allowed("riddles"));
    }

    #[test]
    fn saved_allow_list_takes_effect_immediately() {
        let store = ParentSettingsStore::new(MemoryBackend::new(), config());
        assert!(store.is_mode_allowed("labs"));

        let mut settings = store.load_parent_settings();
        settings.allowed_modes = vec!["vocab".into(), "facts".into()];
        store.save_parent_settings(&settings);

        assert!(!store.is_mode_allowed("labs"));
        assert!(store.is_mode_allowed("vocab"));
    }

    #[test]
    fn partial_blob_merges_with_defaults() {
        let backend = MemoryBackend::new();
        backend
            .set(KEY, r#"{"pin": "1234", "sessionTimeLimit": 15, "unknownKey": 1}"#)
            .unwrap();
        let store = ParentSettingsStore::new(&backend, config());
        let settings = store.load_parent_settings();
        assert_eq!(settings.pin.as_deref(), Some("1234"));
        assert_eq!(settings.session_time_limit, 15);
        assert_eq!(settings.time_limit_seconds(), 900);
        assert_eq!(settings.allowed_modes, vec!["vocab", "labs", "facts"]);
    }

    #[test]
    fn custom_theme_list() {
        let store = ParentSettingsStore::new(
            MemoryBackend::new(),
            config().with_themes(vec!["jungle".into()]),
        );
        assert!(store.is_theme_allowed("jungle"));
        assert!(!store.is_theme_allowed("garden"));
    }

    #[test]
    fn corrupted_blob_reverts_to_defaults() {
        let backend = MemoryBackend::new();
        backend.set(KEY, "[]").unwrap();
        let store = ParentSettingsStore::new(&backend, config());
        assert_eq!(store.load_parent_settings(), store.defaults());

        backend.set(KEY, r#"{"locks": "yes"}"#).unwrap();
        assert_eq!(store.load_parent_settings(), store.defaults());
    }

    #[test]
    fn broken_backend_falls_back_silently() {
        let store = ParentSettingsStore::new(BrokenBackend, config());
        let mut settings = store.load_parent_settings();
        settings.pin = Some("4321".into());
        store.save_parent_settings(&settings);
        assert_eq!(store.load_parent_settings().pin, None);
    }
}
