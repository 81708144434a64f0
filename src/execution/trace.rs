//! The append-only arena of operation results.

/// Ordered sequence of results, one per executed operation, indexed
/// globally from 0 across all turns of a conversation.
///
/// Entries are never overwritten. Back-references hold positions into
/// this arena, so monotonically increasing indices guarantee a turn can
/// only see results that were produced before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTrace {
    values: Vec<f64>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Appends another trace's entries after this one's, preserving
    /// order. Used by the turn manager to fold a turn's results into
    /// the conversation's cumulative trace.
    pub fn extend_from(&mut self, other: &ExecutionTrace) {
        self.values.extend_from_slice(&other.values);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_stay_stable_across_extension() {
        let mut cumulative = ExecutionTrace::new();
        cumulative.push(-8.94);

        let mut turn = ExecutionTrace::new();
        turn.push(-0.0894);
        turn.push(1.0);

        cumulative.extend_from(&turn);
        assert_eq!(cumulative.len(), 3);
        assert_eq!(cumulative.get(0), Some(-8.94));
        assert_eq!(cumulative.get(1), Some(-0.0894));
        assert_eq!(cumulative.last(), Some(1.0));
        assert_eq!(cumulative.get(3), None);
    }
}
