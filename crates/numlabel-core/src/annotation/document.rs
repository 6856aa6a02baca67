use serde::{Deserialize, Serialize};

use super::{CorefChain, DependencyEdge, DocumentView, ParseTree, SentenceView, Token};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub tokens: Vec<Token>,
    #[serde(default, alias = "basicDependencies", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseTree>,
}

impl AnnotatedSentence {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            dependencies: Vec::new(),
            parse: None,
        }
    }

    /// Untagged sentence from whitespace-separated words.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace().map(Token::word).collect())
    }

    #[must_use]
    pub fn with_dependency(mut self, edge: DependencyEdge) -> Self {
        self.dependencies.push(edge);
        self
    }

    #[must_use]
    pub fn with_parse(mut self, tree: ParseTree) -> Self {
        self.parse = Some(tree);
        self
    }

    fn validate(&self) -> Result<()> {
        let len = self.tokens.len();
        for edge in &self.dependencies {
            for index in [edge.governor, edge.dependent] {
                if index > len {
                    return Err(Error::TokenOutOfRange { index, len });
                }
            }
        }
        Ok(())
    }
}

impl SentenceView for AnnotatedSentence {
    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &Token> + '_> {
        Box::new(self.tokens.iter())
    }

    fn dependencies(&self) -> Box<dyn Iterator<Item = &DependencyEdge> + '_> {
        Box::new(self.dependencies.iter())
    }

    fn parse_tree(&self) -> Option<&ParseTree> {
        self.parse.as_ref()
    }
}

/// In-memory document, typically loaded from annotations stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub sentences: Vec<AnnotatedSentence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corefs: Vec<CorefChain>,
}

impl AnnotatedDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sentence(mut self, sentence: AnnotatedSentence) -> Self {
        self.sentences.push(sentence);
        self
    }

    #[must_use]
    pub fn with_chain(mut self, chain: CorefChain) -> Self {
        self.corefs.push(chain);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks that dependency edges and mentions point inside the document.
    pub fn validate(&self) -> Result<()> {
        for sentence in &self.sentences {
            sentence.validate()?;
        }

        for mention in self.corefs.iter().flat_map(|c| c.mentions.iter()) {
            let sentence = mention
                .sentence_index
                .checked_sub(1)
                .and_then(|i| self.sentences.get(i))
                .ok_or(Error::TokenOutOfRange {
                    index: mention.sentence_index,
                    len: self.sentences.len(),
                })?;

            let len = sentence.tokens.len();
            if mention.start_index == 0 || mention.start_index > mention.end_index {
                return Err(Error::TokenOutOfRange {
                    index: mention.start_index,
                    len,
                });
            }
            if mention.end_index > len + 1 {
                return Err(Error::TokenOutOfRange {
                    index: mention.end_index,
                    len,
                });
            }
        }

        Ok(())
    }
}

impl DocumentView for AnnotatedDocument {
    fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    fn sentence(&self, index: usize) -> Option<&dyn SentenceView> {
        self.sentences.get(index).map(|s| s as &dyn SentenceView)
    }

    fn sentences(&self) -> Box<dyn Iterator<Item = &dyn SentenceView> + '_> {
        Box::new(self.sentences.iter().map(|s| s as &dyn SentenceView))
    }

    fn coref_chains(&self) -> Box<dyn Iterator<Item = &CorefChain> + '_> {
        Box::new(self.corefs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Mention, NerTag};

    const JSON: &str = r#"{
        "sentences": [
            {
                "tokens": [
                    {"word": "Mečíř", "ner": "PERSON"},
                    {"word": "won", "ner": "O"},
                    {"word": "in", "ner": "O"},
                    {
                        "word": "1985",
                        "ner": "DATE",
                        "numericCompositeValue": 1985,
                        "normalizedNER": "1985"
                    }
                ],
                "basicDependencies": [
                    {"governor": 0, "dependent": 2, "dep": "ROOT"},
                    {"governor": 2, "dependent": 1, "dep": "nsubj"},
                    {"governor": 2, "dependent": 4, "dep": "nmod:in"}
                ],
                "parse": "(ROOT (S (NP (NNP Mečíř)) (VP (VBD won) (PP (IN in) (NP (CD 1985))))))"
            }
        ],
        "corefs": [
            {
                "id": 1,
                "representative": "Mečíř",
                "mentions": [{"sentNum": 1, "startIndex": 1, "endIndex": 2}]
            }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let doc = AnnotatedDocument::from_json(JSON).unwrap();

        assert_eq!(doc.sentence_count(), 1);
        let sentence = doc.sentence(0).unwrap();
        assert_eq!(sentence.len(), 4);
        assert_eq!(sentence.token(0).unwrap().text, "Mečíř");
        assert_eq!(sentence.token(3).unwrap().ner, NerTag::Date);
        assert_eq!(
            sentence.token(3).unwrap().numeric_composite_value.as_ref().unwrap().as_str(),
            "1985"
        );
        assert_eq!(sentence.dependencies().count(), 3);
        assert_eq!(sentence.parse_tree().unwrap().noun_phrases(), vec!["Mečíř", "1985"]);
        assert_eq!(doc.coref_chains().next().unwrap().mentions[0], Mention::new(1, 1, 2));
    }

    #[test]
    fn test_iterators_restart() {
        let doc = AnnotatedDocument::from_json(JSON).unwrap();
        assert_eq!(doc.sentences().count(), 1);
        assert_eq!(doc.sentences().count(), 1);

        let sentence = doc.sentence(0).unwrap();
        assert_eq!(sentence.tokens().count(), sentence.tokens().count());
    }

    #[test]
    fn test_json_round_trip_keeps_decimal_text() {
        let doc = AnnotatedDocument::new().with_sentence(AnnotatedSentence::new(vec![
            Token::new("2,000,000.53", NerTag::Money).with_value("2000000.53".parse().unwrap()),
        ]));

        let restored = AnnotatedDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_validate_rejects_out_of_range_edges() {
        let doc = AnnotatedDocument::new().with_sentence(
            AnnotatedSentence::from_text("two words")
                .with_dependency(DependencyEdge::new(1, 3, "amod")),
        );

        assert!(matches!(
            doc.validate(),
            Err(Error::TokenOutOfRange { index: 3, len: 2 })
        ));
    }

    #[test]
    fn test_validate_rejects_dangling_mentions() {
        let doc = AnnotatedDocument::new()
            .with_sentence(AnnotatedSentence::from_text("He left"))
            .with_chain(CorefChain::new(1, "He").with_mention(Mention::new(2, 1, 2)));

        assert!(doc.validate().is_err());
    }
}
