use std::collections::VecDeque;

use crate::generator::{Problem, ProblemRequest};

pub const DEFAULT_HISTORY: usize = 12;
pub const DEFAULT_MAX_REROLLS: usize = 25;

/// Remembers the last few problems handed out and rerolls candidates that
/// match one of them. After the reroll budget is spent the last candidate is
/// accepted even if it repeats.
#[derive(Clone, Debug)]
pub struct RecentProblems {
    keys: VecDeque<String>,
    capacity: usize,
    max_rerolls: usize,
}

impl Default for RecentProblems {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY, DEFAULT_MAX_REROLLS)
    }
}

impl RecentProblems {
    pub fn new(capacity: usize, max_rerolls: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            max_rerolls,
        }
    }

    pub fn key(request: &ProblemRequest<'_>, problem: &Problem) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            request.mode, request.difficulty, request.theme, problem.prompt, problem.answer
        )
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Draw from `generate` until the result is not in the history or the
    /// reroll budget runs out, then remember it.
    pub fn draw<F>(&mut self, request: &ProblemRequest<'_>, mut generate: F) -> Problem
    where
        F: FnMut() -> Problem,
    {
        let mut candidate = generate();
        let mut key = Self::key(request, &candidate);
        let mut rerolls = 0;
        while rerolls < self.max_rerolls && self.contains(&key) {
            candidate = generate();
            key = Self::key(request, &candidate);
            rerolls += 1;
        }
        if rerolls > 0 {
            tracing::debug!(rerolls, repeated = self.contains(&key), "rerolled problem");
        }

        self.keys.push_back(key);
        while self.keys.len() > self.capacity {
            self.keys.pop_front();
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Difficulty;

    fn request() -> ProblemRequest<'static> {
        ProblemRequest {
            mode: "vocab",
            theme: "garden",
            difficulty: Difficulty::Beginner,
            level: None,
        }
    }

    fn problem(answer: &str) -> Problem {
        Problem {
            prompt: format!("Which word matches: \"{answer}\""),
            options: vec![answer.to_string()],
            answer: answer.to_string(),
            equation: None,
        }
    }

    #[test]
    fn key_joins_request_and_problem() {
        let key = RecentProblems::key(&request(), &problem("seed"));
        assert_eq!(key, "vocab|beginner|garden|Which word matches: \"seed\"|seed");
    }

    #[test]
    fn rerolls_past_recent_problem() {
        let mut recent = RecentProblems::default();
        let req = request();
        recent.draw(&req, || problem("seed"));

        let mut sequence = vec![problem("root"), problem("seed"), problem("seed")];
        let mut calls = 0;
        let drawn = recent.draw(&req, || {
            calls += 1;
            sequence.pop().unwrap()
        });
        assert_eq!(drawn.answer, "root");
        assert_eq!(calls, 3);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn accepts_repeat_after_budget_exhausted() {
        let mut recent = RecentProblems::new(12, 25);
        let req = request();
        recent.draw(&req, || problem("seed"));

        let mut calls = 0;
        let drawn = recent.draw(&req, || {
            calls += 1;
            problem("seed")
        });
        assert_eq!(drawn.answer, "seed");
        assert_eq!(calls, 26);
    }

    #[test]
    fn history_is_bounded() {
        let mut recent = RecentProblems::new(3, 0);
        let req = request();
        for answer in ["a", "b", "c", "d", "e"] {
            recent.draw(&req, || problem(answer));
        }
        assert_eq!(recent.len(), 3);
        assert!(!recent.contains(&RecentProblems::key(&req, &problem("a"))));
        assert!(recent.contains(&RecentProblems::key(&req, &problem("e"))));
    }
}
