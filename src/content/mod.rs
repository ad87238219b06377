use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Embed)]
#[folder = "assets/packs/"]
struct PackAssets;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unknown content pack: {0}")]
    UnknownPack(String),
    #[error("malformed content pack: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read content pack {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Anything that is not one of the three keys plays as intermediate.
    pub fn from_key_lenient(key: &str) -> Self {
        key.parse().unwrap_or(Difficulty::Intermediate)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    Science,
    Reading,
    Math,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeInfo {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VocabItem {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub def: String,
}

/// Fill-in-the-blank template. Labs packs name the sentence `q`, story
/// packs name it `t`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlankTemplate {
    #[serde(default, rename = "q", alias = "t")]
    pub text: String,
    #[serde(default)]
    pub a: String,
    #[serde(default)]
    pub d: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FactItem {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub f1: String,
    #[serde(default)]
    pub f2: String,
}

/// Items keyed by difficulty name.
pub type Tiered<T> = BTreeMap<String, Vec<T>>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Banks {
    #[serde(default)]
    pub vocab: BTreeMap<String, Tiered<VocabItem>>,
    #[serde(default)]
    pub labs: BTreeMap<String, Vec<BlankTemplate>>,
    #[serde(default)]
    pub facts: BTreeMap<String, Tiered<FactItem>>,
    #[serde(default)]
    pub words: BTreeMap<String, Tiered<String>>,
    #[serde(default)]
    pub sightwords: Tiered<String>,
    #[serde(default)]
    pub stories: BTreeMap<String, Vec<BlankTemplate>>,
}

impl Banks {
    pub fn vocab(&self, theme: &str, difficulty: Difficulty) -> &[VocabItem] {
        tier(self.vocab.get(theme), difficulty)
    }

    pub fn labs(&self, theme: &str) -> &[BlankTemplate] {
        self.labs.get(theme).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn facts(&self, theme: &str, difficulty: Difficulty) -> &[FactItem] {
        tier(self.facts.get(theme), difficulty)
    }

    pub fn words(&self, theme: &str, difficulty: Difficulty) -> &[String] {
        tier(self.words.get(theme), difficulty)
    }

    pub fn sightwords(&self, difficulty: Difficulty) -> &[String] {
        tier(Some(&self.sightwords), difficulty)
    }

    pub fn stories(&self, theme: &str) -> &[BlankTemplate] {
        self.stories.get(theme).map(Vec::as_slice).unwrap_or_default()
    }
}

fn tier<T>(by_difficulty: Option<&Tiered<T>>, difficulty: Difficulty) -> &[T] {
    by_difficulty
        .and_then(|tiers| tiers.get(difficulty.as_str()))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentPack {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PackKind,
    #[serde(default)]
    pub title: String,
    pub modes: Vec<ModeInfo>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default = "default_difficulties")]
    pub difficulties: Vec<Difficulty>,
    #[serde(default)]
    pub banks: Banks,
}

fn default_difficulties() -> Vec<Difficulty> {
    Difficulty::ALL.to_vec()
}

impl ContentPack {
    /// Load one of the packs bundled into the binary.
    pub fn builtin(id: &str) -> Result<Self, ContentError> {
        let file = PackAssets::get(&format!("{id}.json"))
            .ok_or_else(|| ContentError::UnknownPack(id.to_string()))?;
        let json = std::str::from_utf8(file.data.as_ref())
            .map_err(|_| ContentError::UnknownPack(id.to_string()))?;
        Self::from_json(json)
    }

    pub fn builtin_ids() -> Vec<String> {
        let mut ids: Vec<String> = PackAssets::iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .collect();
        ids.sort();
        ids
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let json = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn mode_keys(&self) -> Vec<String> {
        self.modes.iter().map(|m| m.key.clone()).collect()
    }

    pub fn has_mode(&self, key: &str) -> bool {
        self.modes.iter().any(|m| m.key == key)
    }

    pub fn mode_label(&self, key: &str) -> Option<&str> {
        self.modes
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.label.as_str())
    }
}
