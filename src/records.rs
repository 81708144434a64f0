//! In-memory record shapes exchanged with external components.
//!
//! These are the only I/O boundaries of the core: the document shape
//! consumed by the context resolver, the prediction shape any external
//! program-generation component must satisfy, and the per-turn gold
//! annotations. All are plain serde records; the core neither reads nor
//! writes files.

use serde::{Deserialize, Serialize};

/// One financial report: a table (row 0 = column headers, column 0 of
/// each later row = row label) plus surrounding prose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub table: Vec<Vec<String>>,
    #[serde(default)]
    pub pre_text: Vec<String>,
    #[serde(default)]
    pub post_text: Vec<String>,
}

/// What an external answer-generation component produces for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub program: String,
    pub answer: f64,
}

/// One conversation turn: the question asked, the gold annotation, and
/// the candidate prediction to judge against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    #[serde(default)]
    pub question: String,
    pub gold_program: String,
    pub gold_answer: f64,
    pub prediction: PredictionRecord,
}

/// A full multi-turn conversation over one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub document: DocumentRecord,
    pub turns: Vec<TurnRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_record_wire_shape() {
        let json = r#"{ "program": "divide(#0, const_100)", "answer": -0.0894 }"#;
        let record: PredictionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.program, "divide(#0, const_100)");
        assert_eq!(record.answer, -0.0894);
    }

    #[test]
    fn document_text_fields_default_to_empty() {
        let json = r#"{ "table": [["", "2020"], ["sales", "10"]] }"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert!(record.pre_text.is_empty());
        assert!(record.post_text.is_empty());
        assert_eq!(record.table.len(), 2);
    }
}
