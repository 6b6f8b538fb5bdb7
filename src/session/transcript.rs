/// Caller-owned accumulation of incremental recognition or translation results
///
/// Final results are appended to the committed text; a partial result replaces
/// the previous partial until the final for that utterance arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptAccumulator {
    committed: String,
    pending: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one result and return the full text as it currently reads
    pub fn apply(&mut self, is_final: bool, text: &str) -> String {
        if is_final {
            self.committed.push_str(text);
            self.pending.clear();
        } else {
            self.pending = text.to_string();
        }
        self.text()
    }

    /// Committed text followed by the pending partial
    pub fn text(&self) -> String {
        format!("{}{}", self.committed, self.pending)
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_replaces_partial() {
        let mut acc = TranscriptAccumulator::new();
        acc.apply(false, "He");
        let text = acc.apply(false, "Hell");

        assert_eq!(text, "Hell");
        assert_eq!(acc.committed(), "");
        assert_eq!(acc.pending(), "Hell");
    }

    #[test]
    fn test_final_commits_and_clears_pending() {
        let mut acc = TranscriptAccumulator::new();
        acc.apply(false, "He");
        let text = acc.apply(true, "Hello");

        assert_eq!(text, "Hello");
        assert_eq!(acc.pending(), "");
    }

    #[test]
    fn test_utterances_concatenate() {
        let mut acc = TranscriptAccumulator::new();
        acc.apply(true, "Hello. ");
        acc.apply(false, "Wor");

        assert_eq!(acc.text(), "Hello. Wor");

        acc.apply(true, "World.");
        assert_eq!(acc.text(), "Hello. World.");
        assert_eq!(acc.committed(), "Hello. World.");
    }

    #[test]
    fn test_empty() {
        let acc = TranscriptAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.text(), "");
    }
}
