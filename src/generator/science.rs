use rand::Rng;
use rand::seq::SliceRandom;

use crate::content::Banks;
use crate::generator::{
    NO_QUESTIONS, Problem, ProblemRequest, UNKNOWN_MODE, assemble_options, fill_blank,
};

pub const TRUE_STATEMENT_PROMPT: &str = "Which statement is TRUE?";

pub fn generate<R: Rng + ?Sized>(
    banks: &Banks,
    request: &ProblemRequest<'_>,
    rng: &mut R,
) -> Problem {
    match request.mode {
        "vocab" => vocab(banks, request, rng),
        "labs" => labs(banks, request, rng),
        "facts" => facts(banks, request, rng),
        _ => Problem::empty(UNKNOWN_MODE),
    }
}

/// Show a definition, ask for the matching term. Distractors are the other
/// terms of the same bank.
fn vocab<R: Rng + ?Sized>(banks: &Banks, request: &ProblemRequest<'_>, rng: &mut R) -> Problem {
    let bank = banks.vocab(request.theme, request.difficulty);
    let Some(item) = bank.choose(rng) else {
        return Problem::empty(NO_QUESTIONS);
    };

    let answer = item.term.to_lowercase();
    let others = bank.iter().map(|other| other.term.as_str());
    Problem {
        prompt: format!("Which word matches: \"{}\"", item.def),
        options: assemble_options(&answer, others, rng),
        answer,
        equation: None,
    }
}

fn labs<R: Rng + ?Sized>(banks: &Banks, request: &ProblemRequest<'_>, rng: &mut R) -> Problem {
    let Some(tpl) = banks.labs(request.theme).choose(rng) else {
        return Problem::empty(NO_QUESTIONS);
    };

    Problem {
        prompt: fill_blank(&tpl.text),
        options: assemble_options(&tpl.a, &tpl.d, rng),
        answer: tpl.a.to_lowercase(),
        equation: None,
    }
}

fn facts<R: Rng + ?Sized>(banks: &Banks, request: &ProblemRequest<'_>, rng: &mut R) -> Problem {
    let Some(item) = banks.facts(request.theme, request.difficulty).choose(rng) else {
        return Problem::empty(NO_QUESTIONS);
    };

    Problem {
        prompt: TRUE_STATEMENT_PROMPT.to_string(),
        options: assemble_options(&item.t, [&item.f1, &item.f2], rng),
        answer: item.t.to_lowercase(),
        equation: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::content::{ContentPack, Difficulty};
    use crate::generator::PLACEHOLDER;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn request<'a>(mode: &'a str, theme: &'a str, difficulty: Difficulty) -> ProblemRequest<'a> {
        ProblemRequest {
            mode,
            theme,
            difficulty,
            level: None,
        }
    }

    fn science() -> ContentPack {
        ContentPack::builtin("science").unwrap()
    }

    #[test]
    fn every_bank_yields_three_options_with_answer() {
        let pack = science();
        let mut rng = SmallRng::seed_from_u64(42);
        for mode in ["vocab", "labs", "facts"] {
            for theme in &pack.themes {
                for difficulty in Difficulty::ALL {
                    for _ in 0..20 {
                        let p = generate(&pack.banks, &request(mode, theme, difficulty), &mut rng);
                        assert_eq!(p.options.len(), 3, "{mode}/{theme}/{difficulty}: {p:?}");
                        assert!(p.options.contains(&p.answer));
                        let distinct: HashSet<&String> = p.options.iter().collect();
                        assert_eq!(distinct.len(), 3);
                    }
                }
            }
        }
    }

    #[test]
    fn vocab_answer_is_a_lowercased_term_from_the_bank() {
        let pack = science();
        let mut rng = SmallRng::seed_from_u64(9);
        let terms: Vec<String> = pack
            .banks
            .vocab("space", Difficulty::Advanced)
            .iter()
            .map(|i| i.term.to_lowercase())
            .collect();
        for _ in 0..30 {
            let p = generate(
                &pack.banks,
                &request("vocab", "space", Difficulty::Advanced),
                &mut rng,
            );
            assert!(terms.contains(&p.answer));
            assert!(p.prompt.starts_with("Which word matches: \""));
            let others: Vec<&String> = p.options.iter().filter(|o| **o != p.answer).collect();
            assert_eq!(others.len(), 2);
        }
    }

    #[test]
    fn labs_prompt_has_no_placeholder() {
        let pack = science();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..30 {
            let p = generate(&pack.banks, &request("labs", "ocean", Difficulty::Beginner), &mut rng);
            assert!(!p.prompt.contains(PLACEHOLDER));
            assert!(p.prompt.contains("____"));
            let tpl = pack
                .banks
                .labs("ocean")
                .iter()
                .find(|t| t.text.replacen(PLACEHOLDER, "____", 1) == p.prompt)
                .unwrap();
            assert_eq!(p.answer, tpl.a.to_lowercase());
        }
    }

    #[test]
    fn facts_answer_is_true_statement() {
        let pack = science();
        let mut rng = SmallRng::seed_from_u64(5);
        let truths: Vec<String> = pack
            .banks
            .facts("garden", Difficulty::Intermediate)
            .iter()
            .map(|f| f.t.to_lowercase())
            .collect();
        let p = generate(
            &pack.banks,
            &request("facts", "garden", Difficulty::Intermediate),
            &mut rng,
        );
        assert_eq!(p.prompt, TRUE_STATEMENT_PROMPT);
        assert!(truths.contains(&p.answer));
    }

    #[test]
    fn missing_bank_yields_empty_problem() {
        let pack = science();
        let mut rng = SmallRng::seed_from_u64(1);
        let p = generate(&pack.banks, &request("vocab", "desert", Difficulty::Beginner), &mut rng);
        assert!(p.is_empty());
        assert_eq!(p.prompt, NO_QUESTIONS);
        assert_eq!(p.answer, "");

        let p = generate(&pack.banks, &request("riddles", "garden", Difficulty::Beginner), &mut rng);
        assert_eq!(p.prompt, UNKNOWN_MODE);
    }

    #[test]
    fn case_colliding_distractors_are_collapsed() {
        // A labs distractor equal to the answer under a different case is
        // dropped rather than shown twice.
        let json = r#"{
            "id": "t", "type": "science",
            "modes": [{"key": "labs", "label": "Labs"}],
            "banks": {"labs": {"garden": [{"q": "Seeds need {__}.", "a": "Water", "d": ["WATER", "sand"]}]}}
        }"#;
        let pack = ContentPack::from_json(json).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let p = generate(&pack.banks, &request("labs", "garden", Difficulty::Beginner), &mut rng);
        assert_eq!(p.answer, "water");
        let mut options = p.options.clone();
        options.sort();
        assert_eq!(options, vec!["sand", "water"]);
    }

    #[test]
    fn single_item_vocab_bank_has_only_the_answer() {
        let json = r#"{
            "id": "t", "type": "science",
            "modes": [{"key": "vocab", "label": "Vocab"}],
            "banks": {"vocab": {"garden": {"beginner": [{"term": "Seed", "def": "A tiny start."}]}}}
        }"#;
        let pack = ContentPack::from_json(json).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let p = generate(&pack.banks, &request("vocab", "garden", Difficulty::Beginner), &mut rng);
        assert_eq!(p.options, vec!["seed"]);
        assert_eq!(p.prompt, "Which word matches: \"A tiny start.\"");
    }
}
