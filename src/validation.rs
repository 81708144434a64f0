//! Structural validation of conversation records.
//!
//! Collects every problem it finds instead of failing on the first,
//! like a linter over the dataset. A record that passes here can still
//! fail at execution time (bad references, bad programs); this layer
//! only rejects shapes the core cannot meaningfully process at all.

use crate::records::ConversationRecord;

/// Checks one record, returning a human-readable problem list
/// (empty if the record is well-formed).
pub fn validate_record(record: &ConversationRecord, index: usize) -> Vec<String> {
    let mut problems = Vec::new();
    let label = if record.id.is_empty() {
        format!("record {index}")
    } else {
        format!("record {index} ('{}')", record.id)
    };

    let table = &record.document.table;
    if table.len() < 2 {
        problems.push(format!("{label}: table needs a header row and at least one data row"));
    } else {
        let header_width = table[0].len();
        if header_width < 2 {
            problems.push(format!("{label}: header row needs at least one column label"));
        }
        for (row_index, row) in table.iter().enumerate().skip(1) {
            if row.is_empty() {
                problems.push(format!("{label}: table row {row_index} is empty"));
            } else if row.len() != header_width {
                problems.push(format!(
                    "{label}: table row {row_index} has {} cells, header has {}",
                    row.len(),
                    header_width
                ));
            }
        }
    }

    if record.turns.is_empty() {
        problems.push(format!("{label}: conversation has no turns"));
    }
    for (turn_index, turn) in record.turns.iter().enumerate() {
        if turn.gold_program.trim().is_empty() {
            problems.push(format!("{label}: turn {turn_index} has no gold program"));
        }
    }

    problems
}

/// Validates a whole dataset, returning all problems across records.
pub fn validate_dataset(records: &[ConversationRecord]) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    if records.is_empty() {
        problems.push("dataset contains no records".to_string());
    }
    for (index, record) in records.iter().enumerate() {
        problems.extend(validate_record(record, index));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}
