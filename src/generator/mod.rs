pub mod math;
pub mod reading;
pub mod recent;
pub mod science;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::content::{ContentPack, Difficulty, PackKind};
use crate::generator::math::Equation;

/// Token a fill-in-the-blank template carries where the answer goes.
pub const PLACEHOLDER: &str = "{__}";
/// What the placeholder is rendered as in the prompt.
pub const BLANK: &str = "____";

const NO_QUESTIONS: &str = "No questions loaded.";
const UNKNOWN_MODE: &str = "Unknown mode.";

/// One renderable multiple-choice question. `options` is empty when the
/// selected bank has no content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<Equation>,
}

impl Problem {
    pub fn empty(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: Vec::new(),
            answer: String::new(),
            equation: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        !self.is_empty() && choice.to_lowercase() == self.answer
    }

    pub fn answer_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.answer)
    }

    pub fn incorrect_indices(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| **o != self.answer)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProblemRequest<'a> {
    pub mode: &'a str,
    pub theme: &'a str,
    pub difficulty: Difficulty,
    pub level: Option<u32>,
}

/// Build a problem from `pack` for the requested mode/theme/difficulty.
/// Lookup failures never error; they yield an empty problem.
pub fn generate<R: Rng + ?Sized>(
    pack: &ContentPack,
    request: &ProblemRequest<'_>,
    rng: &mut R,
) -> Problem {
    let problem = match pack.kind {
        PackKind::Math => math::generate(request.level.unwrap_or(1), request.difficulty, rng),
        PackKind::Science => science::generate(&pack.banks, request, rng),
        PackKind::Reading => reading::generate(&pack.banks, request, rng),
    };
    tracing::debug!(
        pack = %pack.id,
        mode = request.mode,
        theme = request.theme,
        difficulty = %request.difficulty,
        options = problem.options.len(),
        "generated problem"
    );
    problem
}

/// Combine a correct answer with up to two distractors.
///
/// Everything is lowercased; distractors that are empty, equal to the answer,
/// or equal to an earlier distractor are dropped, so the result never holds
/// duplicates but may hold fewer than three options.
pub(crate) fn assemble_options<R, I, S>(answer: &str, distractors: I, rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let answer = answer.to_lowercase();
    let mut pool: Vec<String> = Vec::new();
    for d in distractors {
        let d = d.as_ref().to_lowercase();
        if !d.is_empty() && d != answer && !pool.contains(&d) {
            pool.push(d);
        }
    }
    pool.shuffle(rng);
    pool.truncate(2);

    let mut options = Vec::with_capacity(3);
    options.push(answer);
    options.extend(pool);
    options.shuffle(rng);
    options
}

pub(crate) fn fill_blank(template: &str) -> String {
    template.replacen(PLACEHOLDER, BLANK, 1)
}
