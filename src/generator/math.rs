use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::content::Difficulty;
use crate::generator::Problem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "×")]
    Mul,
    #[serde(rename = "÷")]
    Div,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '×',
            Operator::Div => '÷',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    pub num1: i64,
    pub num2: i64,
    pub op: Operator,
    pub result: i64,
}

impl Equation {
    fn new(num1: i64, op: Operator, num2: i64) -> Self {
        let result = match op {
            Operator::Add => num1 + num2,
            Operator::Sub => num1 - num2,
            Operator::Mul => num1 * num2,
            // Dividends are always built as quotient * divisor.
            Operator::Div => num1 / num2,
        };
        Self {
            num1,
            num2,
            op,
            result,
        }
    }

    /// Build `quotient * divisor ÷ divisor` so the result is an integer.
    fn division(quotient: i64, divisor: i64) -> Self {
        Self::new(quotient * divisor, Operator::Div, divisor)
    }
}

fn base_range(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Beginner => 5,
        Difficulty::Intermediate => 15,
        Difficulty::Advanced => 30,
    }
}

fn by_difficulty(difficulty: Difficulty, beginner: i64, intermediate: i64, advanced: i64) -> i64 {
    match difficulty {
        Difficulty::Beginner => beginner,
        Difficulty::Intermediate => intermediate,
        Difficulty::Advanced => advanced,
    }
}

/// Addition whose sum lies in `2..=max`, both addends at least 1.
fn sum_up_to<R: Rng + ?Sized>(max: i64, rng: &mut R) -> Equation {
    let sum = rng.gen_range(2..=max);
    let a = rng.gen_range(1..sum);
    Equation::new(a, Operator::Add, sum - a)
}

fn product<R: Rng + ?Sized>(max: i64, rng: &mut R) -> Equation {
    let a = rng.gen_range(1..=max);
    let b = rng.gen_range(1..=max);
    Equation::new(a, Operator::Mul, b)
}

/// Pick an equation for `level`. Levels climb from addition through
/// subtraction, multiplication and division to a free mix at 9 and above.
pub fn equation_for_level<R: Rng + ?Sized>(
    level: u32,
    difficulty: Difficulty,
    rng: &mut R,
) -> Equation {
    let max = base_range(difficulty);
    match level.max(1) {
        1 => sum_up_to(max, rng),
        2 => sum_up_to(max * 3 / 2, rng),
        3 => {
            let a = rng.gen_range(5..max + 5);
            let b = rng.gen_range(1..=a);
            Equation::new(a, Operator::Sub, b)
        }
        // Either operand may be larger, so results can go negative.
        4 => {
            let a = rng.gen_range(0..max);
            let b = rng.gen_range(0..max);
            Equation::new(a, Operator::Sub, b)
        }
        5 => product(by_difficulty(difficulty, 5, 9, 12), rng),
        6 => {
            if rng.gen_bool(0.5) {
                let div_max = by_difficulty(difficulty, 5, 10, 12);
                Equation::division(rng.gen_range(1..=div_max), rng.gen_range(1..=div_max))
            } else {
                product(by_difficulty(difficulty, 6, 10, 15), rng)
            }
        }
        7 => {
            let mix_max = max * 2;
            if rng.gen_bool(0.5) {
                let a = rng.gen_range(1..=mix_max);
                let b = rng.gen_range(1..=mix_max);
                Equation::new(a, Operator::Add, b)
            } else {
                let a = rng.gen_range(mix_max..mix_max * 2);
                let b = rng.gen_range(1..=mix_max);
                Equation::new(a, Operator::Sub, b)
            }
        }
        8 => {
            let a = match difficulty {
                Difficulty::Beginner => rng.gen_range(5..10),
                _ => rng.gen_range(5..15),
            };
            let b = rng.gen_range(1..=10);
            Equation::new(a, Operator::Mul, b)
        }
        _ => match rng.gen_range(0..4) {
            0 => Equation::new(rng.gen_range(0..50), Operator::Add, rng.gen_range(0..50)),
            1 => Equation::new(rng.gen_range(0..100), Operator::Sub, rng.gen_range(0..50)),
            2 => Equation::new(rng.gen_range(0..12), Operator::Mul, rng.gen_range(0..12)),
            _ => Equation::division(rng.gen_range(1..=12), rng.gen_range(1..=12)),
        },
    }
}

/// Two wrong answers near `result`: small offsets in -5..=5, plus a jump of
/// ten whenever a draw still leaves a slot open.
fn numeric_options<R: Rng + ?Sized>(result: i64, rng: &mut R) -> Vec<i64> {
    fn push(v: i64, values: &mut Vec<i64>) {
        if !values.contains(&v) {
            values.push(v);
        }
    }

    let mut values = vec![result];
    while values.len() < 3 {
        let offset = rng.gen_range(-5..=5);
        push(result + offset, &mut values);
        if values.len() < 3 {
            let jump = if rng.gen_bool(0.5) { 10 } else { -10 };
            push(result + jump, &mut values);
        }
    }
    values.shuffle(rng);
    values
}

pub fn generate<R: Rng + ?Sized>(level: u32, difficulty: Difficulty, rng: &mut R) -> Problem {
    let equation = equation_for_level(level, difficulty, rng);
    let options = numeric_options(equation.result, rng)
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    Problem {
        prompt: format!("{} {} {} = ?", equation.num1, equation.op, equation.num2),
        options,
        answer: equation.result.to_string(),
        equation: Some(equation),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn every_level_produces_consistent_equation_and_three_options() {
        let mut rng = SmallRng::seed_from_u64(99);
        for level in 0..=12 {
            for difficulty in Difficulty::ALL {
                for _ in 0..50 {
                    let p = generate(level, difficulty, &mut rng);
                    let eq = p.equation.unwrap();
                    let expected = match eq.op {
                        Operator::Add => eq.num1 + eq.num2,
                        Operator::Sub => eq.num1 - eq.num2,
                        Operator::Mul => eq.num1 * eq.num2,
                        Operator::Div => {
                            assert_eq!(eq.num1 % eq.num2, 0, "non-integer division {eq:?}");
                            eq.num1 / eq.num2
                        }
                    };
                    assert_eq!(eq.result, expected);
                    assert_eq!(p.answer, expected.to_string());
                    let distinct: HashSet<&String> = p.options.iter().collect();
                    assert_eq!(distinct.len(), 3);
                    assert!(p.options.contains(&p.answer));
                }
            }
        }
    }

    #[test]
    fn low_levels_add_and_mid_levels_multiply() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..50 {
            let eq = equation_for_level(1, Difficulty::Beginner, &mut rng);
            assert_eq!(eq.op, Operator::Add);
            assert!((2..=5).contains(&eq.result));
            assert!(eq.num1 >= 1 && eq.num2 >= 1);

            let eq = equation_for_level(3, Difficulty::Intermediate, &mut rng);
            assert_eq!(eq.op, Operator::Sub);
            assert!(eq.result >= 0);

            let eq = equation_for_level(5, Difficulty::Advanced, &mut rng);
            assert_eq!(eq.op, Operator::Mul);
            assert!(eq.num1 <= 12 && eq.num2 <= 12);
        }
    }

    #[test]
    fn distractors_stay_near_the_answer() {
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..100 {
            let values = numeric_options(20, &mut rng);
            for v in values {
                let diff = (v - 20).abs();
                assert!(diff <= 5 || diff == 10, "unexpected distractor {v}");
            }
        }
    }

    #[test]
    fn prompt_renders_equation() {
        let mut rng = SmallRng::seed_from_u64(3);
        let p = generate(5, Difficulty::Beginner, &mut rng);
        let eq = p.equation.unwrap();
        assert_eq!(p.prompt, format!("{} × {} = ?", eq.num1, eq.num2));
    }
}
