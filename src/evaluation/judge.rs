//! Decides whether a candidate answer/program matches the gold one.
//!
//! Answer equivalence is an ordered, first-match-wins cascade of pure
//! checks: exact match within tolerance, then the symmetric percent/
//! decimal (x100) rescaling. Program equivalence is decided by
//! re-executing the candidate, not by structural diff, because many
//! distinct operator sequences are mathematically identical.
//!
//! Judgment always terminates with a [`Verdict`]: candidate parse or
//! execution failures become `program_correct = false` with the error
//! named in the explanation, never a propagated error.

use crate::context::DocumentContext;
use crate::execution::{Engine, ExecutionTrace};
use crate::program::parse;
use serde::{Deserialize, Serialize};

/// Which check, if any, produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalenceKind {
    ExactMatch,
    ScaleEquivalence,
    FunctionalEquivalence,
    NoMatch,
}

/// The judge's structured output, one per (gold, candidate) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub answer_correct: bool,
    pub program_correct: bool,
    pub equivalence_kind: EquivalenceKind,
    pub explanation: String,
}

/// Combined absolute/relative tolerance for numeric comparison.
const TOLERANCE: f64 = 1e-4;

fn within_tolerance(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE.max(TOLERANCE * a.abs().max(b.abs()))
}

fn exact_match(gold: f64, candidate: f64) -> Option<EquivalenceKind> {
    within_tolerance(gold, candidate).then_some(EquivalenceKind::ExactMatch)
}

/// One answer expressed as a fraction, the other as a percentage.
/// The relation is symmetric. Sign mismatches are never forgiven:
/// a flipped sign fails both directions of this check.
fn scale_equivalence(gold: f64, candidate: f64) -> Option<EquivalenceKind> {
    (within_tolerance(gold, candidate * 100.0) || within_tolerance(gold * 100.0, candidate))
        .then_some(EquivalenceKind::ScaleEquivalence)
}

/// Precedence is positional: exact match wins over scale equivalence.
const ANSWER_CHECKS: &[fn(f64, f64) -> Option<EquivalenceKind>] =
    &[exact_match, scale_equivalence];

pub struct Judge<'a> {
    context: &'a DocumentContext,
}

impl<'a> Judge<'a> {
    pub fn new(context: &'a DocumentContext) -> Self {
        Self { context }
    }

    /// Judges a candidate (program, answer) pair against the gold pair.
    ///
    /// `prior` is the conversation's cumulative trace before this turn,
    /// so candidate back-references resolve exactly as the gold
    /// program's would.
    pub fn judge(
        &self,
        gold_answer: f64,
        gold_program: &str,
        candidate_answer: f64,
        candidate_program: &str,
        prior: &ExecutionTrace,
    ) -> Verdict {
        let answer_kind = ANSWER_CHECKS
            .iter()
            .find_map(|check| check(gold_answer, candidate_answer));
        let answer_correct = answer_kind.is_some();

        let answer_note = match answer_kind {
            Some(EquivalenceKind::ExactMatch) => {
                format!("answer {candidate_answer} matches {gold_answer} within tolerance")
            }
            Some(EquivalenceKind::ScaleEquivalence) => format!(
                "answer {candidate_answer} matches {gold_answer} up to percent/decimal scale"
            ),
            _ => format!("answer {candidate_answer} does not match {gold_answer}"),
        };

        let (program_correct, program_note) =
            self.judge_program(gold_answer, gold_program, candidate_program, prior);

        let equivalence_kind = match answer_kind {
            Some(kind) => kind,
            None if program_correct => EquivalenceKind::FunctionalEquivalence,
            None => EquivalenceKind::NoMatch,
        };

        Verdict {
            answer_correct,
            program_correct,
            equivalence_kind,
            explanation: format!("{answer_note}; {program_note}"),
        }
    }

    /// Re-parses and re-executes the candidate program, comparing its
    /// final value against the gold program's under the same cascade.
    fn judge_program(
        &self,
        gold_answer: f64,
        gold_program: &str,
        candidate_program: &str,
        prior: &ExecutionTrace,
    ) -> (bool, String) {
        let engine = Engine::new(self.context);

        // The gold program is the reference; if it fails (bad gold
        // annotation), the gold answer stands in as the reference value.
        let reference = parse(gold_program)
            .ok()
            .and_then(|p| engine.execute(&p, prior).ok())
            .map(|eval| eval.final_value)
            .unwrap_or(gold_answer);

        let candidate = match parse(candidate_program) {
            Ok(program) => program,
            Err(err) => return (false, format!("candidate program failed to parse: {err}")),
        };

        match engine.execute(&candidate, prior) {
            Ok(eval) => {
                let matched = ANSWER_CHECKS
                    .iter()
                    .any(|check| check(reference, eval.final_value).is_some());
                if matched {
                    (
                        true,
                        format!(
                            "candidate program re-executed to {}, matching the gold value {}",
                            eval.final_value, reference
                        ),
                    )
                } else {
                    (
                        false,
                        format!(
                            "candidate program re-executed to {}, gold value is {}",
                            eval.final_value, reference
                        ),
                    )
                }
            }
            Err(err) => (false, format!("candidate program failed to execute: {err}")),
        }
    }
}
