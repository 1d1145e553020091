//! Intent detection for incoming customer messages.

use crate::draft::OrderDraft;

/// What the customer wants to do with the current draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Commit the draft as an order
    Confirm,
    /// Throw the draft away
    Cancel,
    /// Keep talking
    Continue,
}

/// Capability that turns a message into an [`Intent`]
pub trait IntentClassifier: Send + Sync {
    fn detect_intent(&self, text: &str, draft: &OrderDraft) -> Intent;
}

/// Case-insensitive substring matching on two keywords
///
/// "confirm" matches "confirmo", "Confirmar", ...
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    confirm_keyword: String,
    cancel_keyword: String,
}

impl KeywordClassifier {
    pub fn new(confirm_keyword: &str, cancel_keyword: &str) -> Self {
        Self {
            confirm_keyword: confirm_keyword.trim().to_lowercase(),
            cancel_keyword: cancel_keyword.trim().to_lowercase(),
        }
    }
}

impl IntentClassifier for KeywordClassifier {
    fn detect_intent(&self, text: &str, draft: &OrderDraft) -> Intent {
        let text = text.to_lowercase();

        // Cancel wins when both keywords show up
        if !self.cancel_keyword.is_empty() && text.contains(&self.cancel_keyword) {
            return Intent::Cancel;
        }

        if !self.confirm_keyword.is_empty()
            && text.contains(&self.confirm_keyword)
            && draft.is_committable()
        {
            return Intent::Confirm;
        }

        Intent::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_products() -> OrderDraft {
        let mut draft = OrderDraft::default();
        draft.add_product(7, "AI Virtual Assistant", 2);
        draft
    }

    #[test]
    fn test_confirm_keyword_variants() {
        let classifier = KeywordClassifier::new("confirm", "cancel");
        let draft = draft_with_products();

        assert_eq!(classifier.detect_intent("confirmo", &draft), Intent::Confirm);
        assert_eq!(classifier.detect_intent("Sí, CONFIRMAR", &draft), Intent::Confirm);
        assert_eq!(classifier.detect_intent("quiero 2 más", &draft), Intent::Continue);
    }

    #[test]
    fn test_confirm_on_empty_draft_is_ignored() {
        let classifier = KeywordClassifier::new("confirm", "cancel");
        assert_eq!(
            classifier.detect_intent("confirmo", &OrderDraft::default()),
            Intent::Continue
        );
    }

    #[test]
    fn test_cancel_wins_over_confirm() {
        let classifier = KeywordClassifier::new("confirm", "cancel");
        let draft = draft_with_products();
        assert_eq!(
            classifier.detect_intent("no confirmo, mejor cancelar", &draft),
            Intent::Cancel
        );
    }

    #[test]
    fn test_keywords_are_normalized() {
        let classifier = KeywordClassifier::new("  Confirm ", "CANCEL");
        let draft = draft_with_products();
        assert_eq!(classifier.detect_intent("confirmed", &draft), Intent::Confirm);
        assert_eq!(classifier.detect_intent("Cancelo", &draft), Intent::Cancel);
    }
}
