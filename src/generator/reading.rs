use rand::Rng;
use rand::seq::SliceRandom;

use crate::content::{Banks, Difficulty};
use crate::generator::{Problem, ProblemRequest, UNKNOWN_MODE, assemble_options, fill_blank};

pub fn generate<R: Rng + ?Sized>(
    banks: &Banks,
    request: &ProblemRequest<'_>,
    rng: &mut R,
) -> Problem {
    match request.mode {
        "phonics" => phonics(banks, request, rng),
        "sight" => sight(banks, request.difficulty, rng),
        "story" => story(banks, request, rng),
        _ => Problem::empty(UNKNOWN_MODE),
    }
}

fn initial(word: &str) -> String {
    word.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

/// Ask which word starts with a letter. Distractors must start with a
/// different letter; the theme's beginner words top up a thin bank.
fn phonics<R: Rng + ?Sized>(banks: &Banks, request: &ProblemRequest<'_>, rng: &mut R) -> Problem {
    let words = banks.words(request.theme, request.difficulty);
    let Some(correct) = words.choose(rng) else {
        return Problem::empty("No words loaded.");
    };
    let letter = initial(correct);

    let differs = |w: &&String| *w != correct && initial(w) != letter;
    let mut pool: Vec<&String> = words.iter().filter(differs).collect();
    if pool.len() < 2 {
        let fallback = banks.words(request.theme, Difficulty::Beginner);
        for w in fallback.iter().filter(differs) {
            if !pool.contains(&w) {
                pool.push(w);
            }
        }
    }

    Problem {
        prompt: format!("Which word starts with \"{letter}\"?"),
        options: assemble_options(correct, pool, rng),
        answer: correct.to_lowercase(),
        equation: None,
    }
}

/// Tap a sight word. Distractors come from the same tier plus a neighbouring
/// easier tier.
fn sight<R: Rng + ?Sized>(banks: &Banks, difficulty: Difficulty, rng: &mut R) -> Problem {
    let words = banks.sightwords(difficulty);
    let target = words
        .choose(rng)
        .map(|w| w.to_lowercase())
        .unwrap_or_default();
    if target.is_empty() {
        return Problem::empty("No sight words loaded.");
    }

    let neighbour = match difficulty {
        Difficulty::Advanced => Difficulty::Intermediate,
        _ => Difficulty::Beginner,
    };
    let pool = words.iter().chain(banks.sightwords(neighbour));

    Problem {
        prompt: format!("Tap the sight word: \"{target}\""),
        options: assemble_options(&target, pool, rng),
        answer: target,
        equation: None,
    }
}

fn story<R: Rng + ?Sized>(banks: &Banks, request: &ProblemRequest<'_>, rng: &mut R) -> Problem {
    let Some(tpl) = banks.stories(request.theme).choose(rng) else {
        return Problem::empty("No stories loaded.");
    };

    Problem {
        prompt: fill_blank(&tpl.text),
        options: assemble_options(&tpl.a, &tpl.d, rng),
        answer: tpl.a.to_lowercase(),
        equation: None,
    }
}
