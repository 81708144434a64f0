//! Batch evaluation over many conversations.
//!
//! Conversations share no mutable state, so the batch fans out over a
//! rayon worker pool. Within one conversation the turns run strictly
//! sequentially: turn N's candidate may back-reference results of turns
//! 1..N through the gold cumulative trace, so the trace must be built
//! in turn order.

use super::judge::{Judge, Verdict};
use crate::context::DocumentContext;
use crate::conversation::Conversation;
use crate::program::parse;
use crate::records::ConversationRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One judged turn, tagged with its origin for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvaluation {
    pub conversation_id: String,
    pub turn_index: usize,
    pub verdict: Verdict,
}

/// Aggregate statistics over a batch of verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub answer_correct: usize,
    pub program_correct: usize,
    pub both_correct: usize,
    pub answer_accuracy: f64,
    pub program_accuracy: f64,
    pub overall_accuracy: f64,
}

impl EvaluationSummary {
    pub fn from_evaluations(evaluations: &[TurnEvaluation]) -> Self {
        let total = evaluations.len();
        let answer_correct = evaluations.iter().filter(|e| e.verdict.answer_correct).count();
        let program_correct = evaluations
            .iter()
            .filter(|e| e.verdict.program_correct)
            .count();
        let both_correct = evaluations
            .iter()
            .filter(|e| e.verdict.answer_correct && e.verdict.program_correct)
            .count();

        let percentage = |count: usize| {
            if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64 * 10_000.0).round() / 100.0
            }
        };

        Self {
            total,
            answer_correct,
            program_correct,
            both_correct,
            answer_accuracy: percentage(answer_correct),
            program_accuracy: percentage(program_correct),
            overall_accuracy: percentage(both_correct),
        }
    }
}

/// Judges every turn of one conversation, in order.
///
/// The gold cumulative trace is threaded through a [`Conversation`]; a
/// turn whose gold program fails to parse or execute contributes no
/// trace entries, and evaluation continues with the next turn.
pub fn evaluate_conversation(record: &ConversationRecord) -> Vec<TurnEvaluation> {
    let context = DocumentContext::from_record(&record.document);
    let judge = Judge::new(&context);
    let mut conversation = Conversation::new(&context);
    let mut evaluations = Vec::with_capacity(record.turns.len());

    for (turn_index, turn) in record.turns.iter().enumerate() {
        // Snapshot before this turn: the candidate's back-references
        // must see exactly what the gold program's would.
        let prior = conversation.cumulative_trace().clone();

        let verdict = judge.judge(
            turn.gold_answer,
            &turn.gold_program,
            turn.prediction.answer,
            &turn.prediction.program,
            &prior,
        );
        tracing::debug!(
            conversation = %record.id,
            turn = turn_index,
            answer_correct = verdict.answer_correct,
            program_correct = verdict.program_correct,
            "judged turn"
        );
        evaluations.push(TurnEvaluation {
            conversation_id: record.id.clone(),
            turn_index,
            verdict,
        });

        match parse(&turn.gold_program) {
            Ok(program) => {
                if let Err(err) = conversation.advance(&program) {
                    tracing::warn!(
                        conversation = %record.id,
                        turn = turn_index,
                        error = %err,
                        "gold program failed, continuing without its trace entries"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    conversation = %record.id,
                    turn = turn_index,
                    error = %err,
                    "gold program failed to parse"
                );
            }
        }
    }

    conversation.close();
    evaluations
}

/// Evaluates a batch of conversations in parallel and summarizes.
///
/// Output order follows the input record order regardless of worker
/// scheduling, so repeated runs produce identical reports.
pub fn evaluate_batch(
    records: &[ConversationRecord],
) -> (Vec<TurnEvaluation>, EvaluationSummary) {
    let evaluations: Vec<TurnEvaluation> = records
        .par_iter()
        .flat_map_iter(evaluate_conversation)
        .collect();

    let summary = EvaluationSummary::from_evaluations(&evaluations);
    tracing::info!(
        conversations = records.len(),
        turns = summary.total,
        answer_accuracy = summary.answer_accuracy,
        program_accuracy = summary.program_accuracy,
        "batch evaluation finished"
    );
    (evaluations, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::judge::EquivalenceKind;
    use crate::records::{DocumentRecord, PredictionRecord, TurnRecord};

    fn ups_record() -> ConversationRecord {
        ConversationRecord {
            id: "Single_UPS/2009/page_33.pdf-3".into(),
            document: DocumentRecord {
                table: vec![
                    vec!["".into(), "12/31/04".into(), "12/31/05".into(), "12/31/06".into()],
                    vec![
                        "united parcel service inc.".into(),
                        "$ 100.00".into(),
                        "$ 89.49".into(),
                        "$ 91.06".into(),
                    ],
                ],
                pre_text: vec!["five-year cumulative total shareowner return".into()],
                post_text: vec![],
            },
            turns: vec![
                TurnRecord {
                    question: "what was the change in value of ups stock?".into(),
                    gold_program: "subtract(91.06, const_100)".into(),
                    gold_answer: -8.94,
                    prediction: PredictionRecord {
                        program: "subtract(91.06, const_100)".into(),
                        answer: -8.94,
                    },
                },
                TurnRecord {
                    question: "what was the five-year return?".into(),
                    gold_program: "divide(#0, const_100)".into(),
                    gold_answer: -0.0894,
                    prediction: PredictionRecord {
                        // Restructured but equivalent, answered in percent.
                        program: "divide(subtract(91.06, const_100), const_100)".into(),
                        answer: -8.94,
                    },
                },
            ],
        }
    }

    #[test]
    fn ups_five_year_return_end_to_end() {
        let evaluations = evaluate_conversation(&ups_record());
        assert_eq!(evaluations.len(), 2);

        let first = &evaluations[0].verdict;
        assert!(first.answer_correct);
        assert!(first.program_correct);
        assert_eq!(first.equivalence_kind, EquivalenceKind::ExactMatch);

        // Turn 2: candidate answer -8.94% vs gold -0.0894 is scale-
        // equivalent, and the restructured candidate re-executes to the
        // gold program's value.
        let second = &evaluations[1].verdict;
        assert!(second.answer_correct);
        assert!(second.program_correct);
        assert_eq!(second.equivalence_kind, EquivalenceKind::ScaleEquivalence);
    }

    #[test]
    fn candidate_backrefs_resolve_against_gold_trace() {
        let mut record = ups_record();
        record.turns[1].prediction.program = "divide(#0, const_100)".into();
        record.turns[1].prediction.answer = -0.0894;

        let evaluations = evaluate_conversation(&record);
        let second = &evaluations[1].verdict;
        assert!(second.answer_correct);
        assert!(second.program_correct);
    }

    #[test]
    fn bad_gold_turn_does_not_poison_later_turns() {
        let mut record = ups_record();
        record.turns[0].gold_program = "divide(1, 0)".into();
        record.turns[0].prediction.program = "divide(1, 0)".into();
        // Turn 2's #0 now points at nothing; use a self-contained
        // prediction and gold so the turn still judges cleanly.
        record.turns[1].gold_program = "subtract(91.06, const_100)".into();
        record.turns[1].gold_answer = -8.94;
        record.turns[1].prediction.program = "subtract(91.06, const_100)".into();
        record.turns[1].prediction.answer = -8.94;

        let evaluations = evaluate_conversation(&record);
        assert!(!evaluations[0].verdict.program_correct);
        assert!(evaluations[0].verdict.explanation.contains("division by zero"));
        assert!(evaluations[1].verdict.program_correct);
    }

    #[test]
    fn batch_summary_counts_and_rounds() {
        let records = vec![ups_record(), ups_record(), ups_record()];
        let (evaluations, summary) = evaluate_batch(&records);
        assert_eq!(evaluations.len(), 6);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.answer_correct, 6);
        assert_eq!(summary.answer_accuracy, 100.0);
        assert_eq!(summary.overall_accuracy, 100.0);

        // Input order is preserved across the worker pool.
        let turn_indices: Vec<usize> = evaluations.iter().map(|e| e.turn_index).collect();
        assert_eq!(turn_indices, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn empty_batch_summarizes_to_zero() {
        let summary = EvaluationSummary::from_evaluations(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.answer_accuracy, 0.0);
    }
}
