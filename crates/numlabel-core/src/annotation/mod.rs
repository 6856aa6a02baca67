//! Read-only view of an annotated corpus.
//!
//! Tokenization, tagging, parsing and coreference are produced elsewhere; this
//! module only describes what the matching code consumes. Sentences and
//! documents are exposed through [`SentenceView`] and [`DocumentView`] so the
//! matcher never depends on how an annotation backend stores its collections.

mod document;
mod shared;
mod tree;

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use document::{AnnotatedDocument, AnnotatedSentence};
pub use shared::{AnnotationSource, SharedPipeline};
pub use tree::{ParseTree, TreeParseError};

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),
    #[error("Annotation engine unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NerTag {
    // Named entities
    Person,
    Location,
    Organization,
    Misc,
    City,
    StateOrProvince,
    Country,
    Nationality,
    Religion,
    Title,
    Ideology,
    CriminalCharge,
    CauseOfDeath,
    Email,
    Url,
    Handle,

    // Numeric
    Number,
    Money,
    Percent,
    Ordinal,

    // Temporal
    Date,
    Time,
    Duration,
    Set,

    #[default]
    #[serde(rename = "O")]
    Outside,
}

impl NerTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Location => "LOCATION",
            Self::Organization => "ORGANIZATION",
            Self::Misc => "MISC",
            Self::City => "CITY",
            Self::StateOrProvince => "STATE_OR_PROVINCE",
            Self::Country => "COUNTRY",
            Self::Nationality => "NATIONALITY",
            Self::Religion => "RELIGION",
            Self::Title => "TITLE",
            Self::Ideology => "IDEOLOGY",
            Self::CriminalCharge => "CRIMINAL_CHARGE",
            Self::CauseOfDeath => "CAUSE_OF_DEATH",
            Self::Email => "EMAIL",
            Self::Url => "URL",
            Self::Handle => "HANDLE",
            Self::Number => "NUMBER",
            Self::Money => "MONEY",
            Self::Percent => "PERCENT",
            Self::Ordinal => "ORDINAL",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Duration => "DURATION",
            Self::Set => "SET",
            Self::Outside => "O",
        }
    }

    /// Tags whose tokens become number candidates.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Money | Self::Percent)
    }

    #[must_use]
    pub fn is_numeric_or_date(&self) -> bool {
        self.is_numeric() || matches!(self, Self::Date)
    }
}

impl std::fmt::Display for NerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NerTag {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSON" => Ok(Self::Person),
            "LOCATION" => Ok(Self::Location),
            "ORGANIZATION" => Ok(Self::Organization),
            "MISC" => Ok(Self::Misc),
            "CITY" => Ok(Self::City),
            "STATE_OR_PROVINCE" => Ok(Self::StateOrProvince),
            "COUNTRY" => Ok(Self::Country),
            "NATIONALITY" => Ok(Self::Nationality),
            "RELIGION" => Ok(Self::Religion),
            "TITLE" => Ok(Self::Title),
            "IDEOLOGY" => Ok(Self::Ideology),
            "CRIMINAL_CHARGE" => Ok(Self::CriminalCharge),
            "CAUSE_OF_DEATH" => Ok(Self::CauseOfDeath),
            "EMAIL" => Ok(Self::Email),
            "URL" => Ok(Self::Url),
            "HANDLE" => Ok(Self::Handle),
            "NUMBER" => Ok(Self::Number),
            "MONEY" => Ok(Self::Money),
            "PERCENT" => Ok(Self::Percent),
            "ORDINAL" => Ok(Self::Ordinal),
            "DATE" => Ok(Self::Date),
            "TIME" => Ok(Self::Time),
            "DURATION" => Ok(Self::Duration),
            "SET" => Ok(Self::Set),
            "O" => Ok(Self::Outside),
            _ => Err(crate::Error::InvalidNerTag(s.to_string())),
        }
    }
}

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("valid decimal pattern"));

/// Exact decimal text of a value resolved by the annotation backend.
///
/// The text is kept verbatim and only converted to `f64` when a consumer asks
/// for it, so precision is lost at comparison time rather than at load time.
/// Past roughly 15 significant digits the `f64` form is an approximation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Decimal(String);

impl Decimal {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }

    /// True when the value has no fractional part and no exponent.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        if self.0.contains(['e', 'E']) {
            return false;
        }
        match self.0.split_once('.') {
            Some((_, fraction)) => fraction.bytes().all(|b| b == b'0'),
            None => true,
        }
    }

    /// Integer part of an integral value, if it fits in an `i128`.
    #[must_use]
    pub fn to_i128(&self) -> Option<i128> {
        if !self.is_integral() {
            return None;
        }
        let whole = self.0.split_once('.').map_or(self.0.as_str(), |(w, _)| w);
        whole.parse().ok()
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for Decimal {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if DECIMAL.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(AnnotationError::InvalidDecimal(s.to_string()))
        }
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(serde_json::Number),
            Text(String),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Number(n) => n.to_string(),
            Repr::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(alias = "word")]
    pub text: String,
    #[serde(default)]
    pub ner: NerTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_composite_value: Option<Decimal>,
    /// Normalized form of a temporal or numeric expression, e.g. `1985-03-02`.
    #[serde(default, alias = "normalizedNER", skip_serializing_if = "Option::is_none")]
    pub normalized_ner: Option<String>,
}

impl Token {
    #[must_use]
    pub fn new(text: impl Into<String>, ner: NerTag) -> Self {
        Self {
            text: text.into(),
            ner,
            numeric_composite_value: None,
            normalized_ner: None,
        }
    }

    #[must_use]
    pub fn word(text: impl Into<String>) -> Self {
        Self::new(text, NerTag::Outside)
    }

    #[must_use]
    pub fn with_value(mut self, value: Decimal) -> Self {
        self.numeric_composite_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_normalized(mut self, normalized: impl Into<String>) -> Self {
        self.normalized_ner = Some(normalized.into());
        self
    }

    pub fn has_value(&self) -> bool {
        self.numeric_composite_value.is_some()
    }
}

/// Labeled dependency between two tokens, 1-based. Index 0 is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub governor: usize,
    pub dependent: usize,
    #[serde(alias = "dep")]
    pub relation: String,
}

impl DependencyEdge {
    #[must_use]
    pub fn new(governor: usize, dependent: usize, relation: impl Into<String>) -> Self {
        Self {
            governor,
            dependent,
            relation: relation.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.governor == self.dependent
    }

    /// Label without its subtype, so `compound:prt` reads as `compound`.
    pub fn base_relation(&self) -> &str {
        self.relation
            .split_once(':')
            .map_or(self.relation.as_str(), |(base, _)| base)
    }
}

/// Coreference mention; sentence and token indices are 1-based, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    #[serde(alias = "sentNum")]
    pub sentence_index: usize,
    pub start_index: usize,
    pub end_index: usize,
}

impl Mention {
    #[must_use]
    pub fn new(sentence_index: usize, start_index: usize, end_index: usize) -> Self {
        Self {
            sentence_index,
            start_index,
            end_index,
        }
    }

    /// Whether this mention covers `token` of `sentence`, both 0-based.
    pub fn covers(&self, sentence: usize, token: usize) -> bool {
        self.sentence_index == sentence + 1
            && (self.start_index..self.end_index).contains(&(token + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorefChain {
    pub id: u32,
    #[serde(alias = "representativeMention")]
    pub representative: String,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl CorefChain {
    #[must_use]
    pub fn new(id: u32, representative: impl Into<String>) -> Self {
        Self {
            id,
            representative: representative.into(),
            mentions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mention(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }

    pub fn covers(&self, sentence: usize, token: usize) -> bool {
        self.mentions.iter().any(|m| m.covers(sentence, token))
    }
}

/// One annotated sentence. Every method must be restartable: calling an
/// iterator method again yields the full sequence again.
pub trait SentenceView: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token at a 0-based position.
    fn token(&self, index: usize) -> Option<&Token>;

    fn tokens(&self) -> Box<dyn Iterator<Item = &Token> + '_>;

    fn dependencies(&self) -> Box<dyn Iterator<Item = &DependencyEdge> + '_>;

    fn parse_tree(&self) -> Option<&ParseTree> {
        None
    }
}

pub trait DocumentView: Send + Sync {
    fn sentence_count(&self) -> usize;

    fn sentence(&self, index: usize) -> Option<&dyn SentenceView>;

    fn sentences(&self) -> Box<dyn Iterator<Item = &dyn SentenceView> + '_>;

    /// Chains in the order the annotation backend enumerates them.
    fn coref_chains(&self) -> Box<dyn Iterator<Item = &CorefChain> + '_>;
}
