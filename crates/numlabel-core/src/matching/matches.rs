use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::annotation::{SentenceView, Token};

/// Entity and relation of a known fact being looked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub entity: String,
    pub relation: String,
}

impl Target {
    #[must_use]
    pub fn new(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            relation: relation.into(),
        }
    }
}

/// Address of a sentence, used as the identity of a [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentenceKey(usize);

impl SentenceKey {
    fn of(sentence: &dyn SentenceView) -> Self {
        Self(std::ptr::addr_of!(*sentence).cast::<()>() as usize)
    }
}

/// A sentence judged to discuss the target, with candidate positions.
///
/// Two matches are equal when they borrow the same sentence; positions,
/// entity and relation do not take part in equality.
#[derive(Clone)]
pub struct Match<'a> {
    sentence: &'a dyn SentenceView,
    pub sentence_index: usize,
    pub entity: String,
    pub relation: String,
    pub number_positions: Vec<usize>,
    pub date_positions: Vec<usize>,
    pub coref_entity_positions: Vec<usize>,
    pub entity_positions: Vec<usize>,
}

impl<'a> Match<'a> {
    #[must_use]
    pub fn new(sentence: &'a dyn SentenceView, sentence_index: usize, target: &Target) -> Self {
        Self {
            sentence,
            sentence_index,
            entity: target.entity.clone(),
            relation: target.relation.clone(),
            number_positions: Vec::new(),
            date_positions: Vec::new(),
            coref_entity_positions: Vec::new(),
            entity_positions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_numbers(mut self, positions: Vec<usize>) -> Self {
        self.number_positions = positions;
        self
    }

    #[must_use]
    pub fn with_dates(mut self, positions: Vec<usize>) -> Self {
        self.date_positions = positions;
        self
    }

    #[must_use]
    pub fn with_coref_entities(mut self, positions: Vec<usize>) -> Self {
        self.coref_entity_positions = positions;
        self
    }

    #[must_use]
    pub fn with_entities(mut self, positions: Vec<usize>) -> Self {
        self.entity_positions = positions;
        self
    }

    pub fn sentence(&self) -> &'a dyn SentenceView {
        self.sentence
    }

    pub fn key(&self) -> SentenceKey {
        SentenceKey::of(self.sentence)
    }

    pub fn token(&self, position: usize) -> Option<&'a Token> {
        self.sentence.token(position)
    }

    pub fn text(&self) -> String {
        self.sentence
            .tokens()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl PartialEq for Match<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Match<'_> {}

impl std::hash::Hash for Match<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("sentence_index", &self.sentence_index)
            .field("entity", &self.entity)
            .field("relation", &self.relation)
            .field("number_positions", &self.number_positions)
            .field("date_positions", &self.date_positions)
            .field("coref_entity_positions", &self.coref_entity_positions)
            .field("entity_positions", &self.entity_positions)
            .finish_non_exhaustive()
    }
}

/// Matches deduplicated by sentence, in insertion order. The first match
/// inserted for a sentence is kept.
#[derive(Debug, Clone, Default)]
pub struct MatchSet<'a> {
    matches: Vec<Match<'a>>,
    seen: HashSet<SentenceKey>,
}

impl<'a> MatchSet<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a match for the same sentence is already present.
    pub fn insert(&mut self, m: Match<'a>) -> bool {
        if !self.seen.insert(m.key()) {
            return false;
        }
        self.matches.push(m);
        true
    }

    pub fn contains(&self, m: &Match<'_>) -> bool {
        self.seen.contains(&m.key())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match<'a>> {
        self.matches.iter()
    }

    pub fn extend(&mut self, other: MatchSet<'a>) {
        for m in other.matches {
            self.insert(m);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Match<'a>> {
        self.matches
    }
}

impl<'a> FromIterator<Match<'a>> for MatchSet<'a> {
    fn from_iter<I: IntoIterator<Item = Match<'a>>>(iter: I) -> Self {
        let mut set = Self::new();
        for m in iter {
            set.insert(m);
        }
        set
    }
}

impl<'s, 'a> IntoIterator for &'s MatchSet<'a> {
    type Item = &'s Match<'a>;
    type IntoIter = std::slice::Iter<'s, Match<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl<'a> IntoIterator for MatchSet<'a> {
    type Item = Match<'a>;
    type IntoIter = std::vec::IntoIter<Match<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotatedSentence;

    #[test]
    fn test_same_sentence_collapses() {
        let sentence = AnnotatedSentence::from_text("Mečíř won 3 titles");
        let target = Target::new("Mečíř", "titles");

        let a = Match::new(&sentence, 0, &target).with_entities(vec![0]);
        let b = Match::new(&sentence, 0, &target).with_entities(vec![0, 3]);
        assert_eq!(a, b);

        let set: MatchSet<'_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().entity_positions, vec![0]);
    }

    #[test]
    fn test_equal_text_different_sentences_stay_distinct() {
        let first = AnnotatedSentence::from_text("Mečíř won");
        let second = AnnotatedSentence::from_text("Mečíř won");
        let target = Target::new("Mečíř", "won");

        let mut set = MatchSet::new();
        assert!(set.insert(Match::new(&first, 0, &target)));
        assert!(set.insert(Match::new(&second, 1, &target)));
        assert!(!set.insert(Match::new(&first, 0, &Target::new("Mečíř", "lost"))));

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().relation, "won");
    }

    #[test]
    fn test_match_text() {
        let sentence = AnnotatedSentence::from_text("Mečíř won in 1985");
        let m = Match::new(&sentence, 0, &Target::new("Mečíř", "won"));
        assert_eq!(m.text(), "Mečíř won in 1985");
        assert_eq!(m.token(3).unwrap().text, "1985");
    }
}
