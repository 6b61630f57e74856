//! Instruction pairing for asymmetric retrieval encoding.
//!
//! Documents and queries go through the same model but are conditioned on
//! different instructions, so the two sides of a retrieval pair land in
//! compatible regions of the embedding space.

/// Instruction paired with corpus documents at encode time.
pub const DOC_INSTRUCTION: &str = "Represent the document for retrieval: ";

/// Instruction paired with search queries at encode time.
pub const QUERY_INSTRUCTION: &str =
    "Represent the question for retrieving supporting documents: ";

/// Which side of a retrieval pair a batch belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Corpus side; paired with [`DOC_INSTRUCTION`].
    Document,
    /// Search side; paired with [`QUERY_INSTRUCTION`].
    Query,
}

impl RequestKind {
    /// Instruction text for this side.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Document => DOC_INSTRUCTION,
            Self::Query => QUERY_INSTRUCTION,
        }
    }
}

/// A text together with the instruction the model conditions on.
#[derive(Clone, Debug, PartialEq)]
pub struct InstructionPair {
    /// Encode-time instruction.
    pub instruction: &'static str,
    /// Raw text to embed.
    pub text: String,
}

/// Pair every text in a batch with the instruction for `kind`.
///
/// Output order matches input order.
pub fn pair_with_instruction(kind: RequestKind, texts: &[String]) -> Vec<InstructionPair> {
    let instruction = kind.instruction();
    texts
        .iter()
        .map(|text| InstructionPair {
            instruction,
            text: text.clone(),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_differ_per_kind() {
        assert_ne!(RequestKind::Document.instruction(), RequestKind::Query.instruction());
    }

    #[test]
    fn instructions_end_with_separator() {
        // The model expects "<instruction>: <text>"; the trailing space is
        // part of the instruction.
        assert!(DOC_INSTRUCTION.ends_with(": "));
        assert!(QUERY_INSTRUCTION.ends_with(": "));
    }

    #[test]
    fn pairing_preserves_order() {
        let texts = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let pairs = pair_with_instruction(RequestKind::Document, &texts);
        assert_eq!(pairs.len(), 3);
        for (pair, text) in pairs.iter().zip(&texts) {
            assert_eq!(&pair.text, text);
            assert_eq!(pair.instruction, DOC_INSTRUCTION);
        }
    }

    #[test]
    fn query_pairing_uses_query_instruction() {
        let texts = vec!["what is rust".to_string()];
        let pairs = pair_with_instruction(RequestKind::Query, &texts);
        assert_eq!(pairs[0].instruction, QUERY_INSTRUCTION);
    }

    #[test]
    fn empty_batch_pairs_to_empty() {
        assert!(pair_with_instruction(RequestKind::Query, &[]).is_empty());
    }
}
