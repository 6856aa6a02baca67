use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::matches::{Match, MatchSet, Target};
use super::relation::{EntityMentionMatcher, RelationMatcher};
use super::resolver::CorefResolver;
use crate::annotation::{CorefChain, DocumentView, NerTag, SentenceView};
use crate::config::MatchingConfig;
use crate::fuzzy::{FuzzyMatcher, StrsimMatcher};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub sentences_scanned: usize,
    pub sentences_matched: usize,
    pub coref_tokens: usize,
    pub lexical_hits: usize,
    pub chain_resolved: bool,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct ScanOutput<'d> {
    pub matches: MatchSet<'d>,
    pub stats: ScanStats,
}

/// Result of scanning one sentence.
#[derive(Debug, Clone)]
pub struct SentenceScan<'d> {
    /// Token texts with each run of coreferent tokens collapsed into one copy
    /// of the entity string.
    pub tokens: Vec<String>,
    pub coref_positions: Vec<usize>,
    pub entity_positions: Vec<usize>,
    pub matched: Option<Match<'d>>,
}

/// Finds sentences of a document that plausibly state a fact about a target
/// entity, and records the numbers and dates in them.
pub struct UtteranceFinder {
    fuzzy: Arc<dyn FuzzyMatcher>,
    relation_matcher: Option<Box<dyn RelationMatcher>>,
    default_relation: EntityMentionMatcher,
    config: MatchingConfig,
}

impl UtteranceFinder {
    #[must_use]
    pub fn new() -> Self {
        let fuzzy: Arc<dyn FuzzyMatcher> = Arc::new(StrsimMatcher::new());
        let config = MatchingConfig::default();
        Self {
            default_relation: EntityMentionMatcher::new(
                Arc::clone(&fuzzy),
                config.entity_threshold,
            ),
            fuzzy,
            relation_matcher: None,
            config,
        }
    }

    #[must_use]
    pub fn with_fuzzy_matcher(mut self, fuzzy: Arc<dyn FuzzyMatcher>) -> Self {
        self.fuzzy = fuzzy;
        self.rebuild_default_relation();
        self
    }

    #[must_use]
    pub fn with_relation_matcher(mut self, matcher: Box<dyn RelationMatcher>) -> Self {
        self.relation_matcher = Some(matcher);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: MatchingConfig) -> Self {
        self.config = config;
        self.rebuild_default_relation();
        self
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    fn rebuild_default_relation(&mut self) {
        self.default_relation =
            EntityMentionMatcher::new(Arc::clone(&self.fuzzy), self.config.entity_threshold);
    }

    fn relation(&self) -> &dyn RelationMatcher {
        self.relation_matcher
            .as_deref()
            .unwrap_or(&self.default_relation)
    }

    pub fn resolver(&self) -> CorefResolver {
        CorefResolver::new(Arc::clone(&self.fuzzy), self.config.coref_threshold)
    }

    pub fn find_utterances<'d>(
        &self,
        document: &'d dyn DocumentView,
        target: &Target,
    ) -> MatchSet<'d> {
        self.scan(document, target).matches
    }

    pub fn scan<'d>(&self, document: &'d dyn DocumentView, target: &Target) -> ScanOutput<'d> {
        let start = Instant::now();
        let chain = self.resolver().find_chain(document, &target.entity);

        let scans = self.scan_all(document, chain, target);

        let mut stats = ScanStats {
            chain_resolved: chain.is_some(),
            ..ScanStats::default()
        };
        let mut matches = MatchSet::new();

        for scan in scans {
            stats.sentences_scanned += 1;
            stats.coref_tokens += scan.coref_positions.len();
            stats.lexical_hits += scan.entity_positions.len();
            if let Some(m) = scan.matched {
                stats.sentences_matched += 1;
                matches.insert(m);
            }
        }

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            entity = %target.entity,
            relation = %target.relation,
            scanned = stats.sentences_scanned,
            matched = stats.sentences_matched,
            chain = stats.chain_resolved,
            "Scanned document"
        );

        ScanOutput { matches, stats }
    }

    #[cfg(not(feature = "parallel"))]
    fn scan_all<'d>(
        &self,
        document: &'d dyn DocumentView,
        chain: Option<&CorefChain>,
        target: &Target,
    ) -> Vec<SentenceScan<'d>> {
        document
            .sentences()
            .enumerate()
            .map(|(index, sentence)| self.scan_sentence(sentence, index, chain, target))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn scan_all<'d>(
        &self,
        document: &'d dyn DocumentView,
        chain: Option<&CorefChain>,
        target: &Target,
    ) -> Vec<SentenceScan<'d>> {
        use rayon::prelude::*;

        (0..document.sentence_count())
            .into_par_iter()
            .filter_map(|index| {
                document
                    .sentence(index)
                    .map(|sentence| self.scan_sentence(sentence, index, chain, target))
            })
            .collect()
    }

    fn is_entity_token(&self, entity: &str, text: &str) -> bool {
        self.fuzzy.token_set_ratio(entity, text) > self.config.entity_threshold
            || entity.split_whitespace().any(|word| word == text)
    }

    /// Scans one sentence against an already resolved chain.
    pub fn scan_sentence<'d>(
        &self,
        sentence: &'d dyn SentenceView,
        sentence_index: usize,
        chain: Option<&CorefChain>,
        target: &Target,
    ) -> SentenceScan<'d> {
        let entity = target.entity.as_str();
        let mut tokens = Vec::with_capacity(sentence.len());
        let mut coref_positions = Vec::new();
        let mut entity_positions = Vec::new();
        let mut in_coref = false;

        for (i, token) in sentence.tokens().enumerate() {
            if chain.is_some_and(|c| c.covers(sentence_index, i)) {
                coref_positions.push(i);
                if !in_coref {
                    tokens.push(entity.to_string());
                    in_coref = true;
                }
            } else {
                if self.is_entity_token(entity, &token.text) {
                    entity_positions.push(i);
                }
                in_coref = false;
                tokens.push(token.text.clone());
            }
        }

        let matched = if self.relation().matches(&tokens, sentence, entity) {
            let (numbers, dates) = candidate_positions(sentence);
            tracing::trace!(
                sentence = sentence_index,
                numbers = numbers.len(),
                dates = dates.len(),
                "Sentence matched"
            );
            Some(
                Match::new(sentence, sentence_index, target)
                    .with_numbers(numbers)
                    .with_dates(dates)
                    .with_coref_entities(coref_positions.clone())
                    .with_entities(entity_positions.clone()),
            )
        } else {
            None
        };

        SentenceScan {
            tokens,
            coref_positions,
            entity_positions,
            matched,
        }
    }
}

impl Default for UtteranceFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Positions of tokens with a resolved value: (numbers, dates).
fn candidate_positions(sentence: &dyn SentenceView) -> (Vec<usize>, Vec<usize>) {
    let mut numbers = Vec::new();
    let mut dates = Vec::new();

    for (i, token) in sentence.tokens().enumerate() {
        if !token.has_value() {
            continue;
        }
        if token.ner == NerTag::Date {
            dates.push(i);
        } else if token.ner.is_numeric() {
            numbers.push(i);
        }
    }

    (numbers, dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotatedDocument, AnnotatedSentence, Mention, Token};

    fn decimal(text: &str) -> crate::annotation::Decimal {
        text.parse().unwrap()
    }

    fn coref_document() -> AnnotatedDocument {
        AnnotatedDocument::new()
            .with_sentence(AnnotatedSentence::from_text("Miloslav Mečíř is a tennis player"))
            .with_sentence(AnnotatedSentence::new(vec![
                Token::word("The"),
                Token::word("Slovak"),
                Token::word("player"),
                Token::word("won"),
                Token::new("in", NerTag::Outside),
                Token::new("1985", NerTag::Date).with_value(decimal("1985")),
            ]))
            .with_sentence(AnnotatedSentence::from_text("Nobody else was there"))
            .with_chain(
                CorefChain::new(7, "Miloslav Mečíř")
                    .with_mention(Mention::new(1, 1, 3))
                    .with_mention(Mention::new(2, 1, 4)),
            )
    }

    #[test]
    fn test_coref_run_collapses_to_one_placeholder() {
        let doc = coref_document();
        let finder = UtteranceFinder::new();
        let target = Target::new("Mečíř", "won");
        let chain = finder.resolver().find_chain(&doc, &target.entity);

        let scan = finder.scan_sentence(doc.sentence(1).unwrap(), 1, chain, &target);

        assert_eq!(scan.tokens, vec!["Mečíř", "won", "in", "1985"]);
        assert_eq!(scan.coref_positions, vec![0, 1, 2]);
        assert!(scan.entity_positions.is_empty());

        let m = scan.matched.unwrap();
        assert_eq!(m.date_positions, vec![5]);
        assert!(m.number_positions.is_empty());
    }

    #[test]
    fn test_scan_document_with_chain() {
        let doc = coref_document();
        let output = UtteranceFinder::new().scan(&doc, &Target::new("Mečíř", "won"));

        assert!(output.stats.chain_resolved);
        assert_eq!(output.stats.sentences_scanned, 3);
        assert_eq!(output.stats.sentences_matched, 2);
        assert_eq!(output.stats.coref_tokens, 5);

        let indices: Vec<usize> = output.matches.iter().map(|m| m.sentence_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_lexical_match_by_entity_word() {
        let doc = AnnotatedDocument::new()
            .with_sentence(AnnotatedSentence::from_text("Diego scored 3 goals"));
        let finder = UtteranceFinder::new();
        let target = Target::new("Diego Maradona", "goals");

        let scan = finder.scan_sentence(doc.sentence(0).unwrap(), 0, None, &target);

        assert_eq!(scan.entity_positions, vec![0]);
        assert_eq!(scan.tokens, vec!["Diego", "scored", "3", "goals"]);
    }

    #[test]
    fn test_only_valued_numeric_tags_are_candidates() {
        let sentence = AnnotatedSentence::new(vec![
            Token::new("Mečíř", NerTag::Person),
            Token::new("19th", NerTag::Ordinal).with_value(decimal("19")),
            Token::new("50", NerTag::Percent).with_value(decimal("50")),
            Token::new("many", NerTag::Number),
            Token::new("1985", NerTag::Date).with_value(decimal("1985")),
        ]);

        let (numbers, dates) = candidate_positions(&sentence);
        assert_eq!(numbers, vec![2]);
        assert_eq!(dates, vec![4]);
    }

    #[test]
    fn test_custom_relation_matcher() {
        let doc = coref_document();
        let reject_all = |_: &[String], _: &dyn SentenceView, _: &str| false;
        let finder = UtteranceFinder::new().with_relation_matcher(Box::new(reject_all));

        let output = finder.scan(&doc, &Target::new("Mečíř", "won"));

        assert!(output.matches.is_empty());
        assert_eq!(output.stats.sentences_scanned, 3);
    }

    #[test]
    fn test_empty_document() {
        let doc = AnnotatedDocument::new();
        let matches = UtteranceFinder::new().find_utterances(&doc, &Target::new("Mečíř", "won"));
        assert!(matches.is_empty());
    }

    #[test]
    fn test_config_threshold_reaches_default_matcher() {
        let doc = AnnotatedDocument::new()
            .with_sentence(AnnotatedSentence::from_text("Mecir won"));
        let target = Target::new("Mečíř", "won");

        assert!(UtteranceFinder::new().find_utterances(&doc, &target).is_empty());

        let lenient = UtteranceFinder::new()
            .with_config(MatchingConfig::default().with_entity_threshold(30));
        assert_eq!(lenient.find_utterances(&doc, &target).len(), 1);
    }
}
