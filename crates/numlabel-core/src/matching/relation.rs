use std::sync::Arc;

use crate::annotation::SentenceView;
use crate::fuzzy::{FuzzyMatcher, StrsimMatcher};

/// Decides whether a sentence plausibly expresses the target relation.
///
/// `tokens` is the sentence text with coreferent mentions of the entity
/// replaced by the entity string. Implementations must be pure.
pub trait RelationMatcher: Send + Sync {
    fn matches(&self, tokens: &[String], sentence: &dyn SentenceView, entity: &str) -> bool;
}

impl<F> RelationMatcher for F
where
    F: Fn(&[String], &dyn SentenceView, &str) -> bool + Send + Sync,
{
    fn matches(&self, tokens: &[String], sentence: &dyn SentenceView, entity: &str) -> bool {
        self(tokens, sentence, entity)
    }
}

/// Stop words (never evidence of an entity mention).
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
}

/// Accepts a sentence when some non-stop-word token is the entity itself or
/// scores above `threshold` on token-set ratio against it.
pub struct EntityMentionMatcher {
    matcher: Arc<dyn FuzzyMatcher>,
    threshold: u8,
}

impl EntityMentionMatcher {
    #[must_use]
    pub fn new(matcher: Arc<dyn FuzzyMatcher>, threshold: u8) -> Self {
        Self { matcher, threshold }
    }
}

impl Default for EntityMentionMatcher {
    fn default() -> Self {
        Self::new(Arc::new(StrsimMatcher::new()), 85)
    }
}

impl RelationMatcher for EntityMentionMatcher {
    fn matches(&self, tokens: &[String], _sentence: &dyn SentenceView, entity: &str) -> bool {
        tokens
            .iter()
            .filter(|token| !is_stop_word(token))
            .any(|token| {
                token == entity || self.matcher.token_set_ratio(entity, token) > self.threshold
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotatedSentence;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_entity_mention_matcher() {
        let sentence = AnnotatedSentence::from_text("unused");
        let matcher = EntityMentionMatcher::default();

        assert!(matcher.matches(&words("Mečíř won in 1985"), &sentence, "Mečíř"));
        assert!(matcher.matches(
            &words("then Miloslav Mečíř won"),
            &sentence,
            "Miloslav Mečíř"
        ));
        assert!(!matcher.matches(&words("Lendl won in 1985"), &sentence, "Mečíř"));
    }

    #[test]
    fn test_stop_words_never_match() {
        let sentence = AnnotatedSentence::from_text("unused");
        let matcher = EntityMentionMatcher::default();

        // "of" is a word of the entity, so it would score 100 on token-set ratio
        assert!(!matcher.matches(&words("one of many"), &sentence, "Bank of America"));
        assert!(matcher.matches(&words("the Bank said"), &sentence, "Bank of America"));
    }

    #[test]
    fn test_placeholder_matches_exactly() {
        let sentence = AnnotatedSentence::from_text("unused");
        let matcher = EntityMentionMatcher::new(Arc::new(StrsimMatcher::new()), 100);

        assert!(matcher.matches(&words("The Who played"), &sentence, "played"));
    }

    #[test]
    fn test_closure_as_matcher() {
        let sentence = AnnotatedSentence::from_text("a b");
        let matcher = |tokens: &[String], _: &dyn SentenceView, _: &str| tokens.len() > 1;

        assert!(RelationMatcher::matches(&matcher, &words("a b"), &sentence, "x"));
        assert!(!RelationMatcher::matches(&matcher, &words("a"), &sentence, "x"));
    }

    #[test]
    fn test_is_stop_word_ignores_case() {
        assert!(is_stop_word("The"));
        assert!(!is_stop_word("Mečíř"));
    }
}
