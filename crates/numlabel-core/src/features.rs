//! Weak labels for numbers and dates found in matched sentences.
//!
//! Each candidate value is compared against the known target: dates must be
//! equal, numbers must fall within a relative tolerance.

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compound::{compound, runs};
use crate::config::MatchingConfig;
use crate::matching::{Match, MatchSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Date(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Number,
    Date,
}

impl FeatureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            _ => Err(crate::Error::InvalidFeatureKind(s.to_string())),
        }
    }
}

/// Unlabeled feature: one number or date position of a match with its
/// resolved value and, for dates, the calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub sentence_index: usize,
    pub position: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    pub values: Vec<Value>,
}

/// Labeled training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub sentence_index: usize,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    pub value: Value,
    pub class: u8,
}

impl Feature {
    pub fn is_positive(&self) -> bool {
        self.class == 1
    }
}

/// Tolerance comparison `(value, target, threshold) -> matches`.
pub type Comparator = fn(f64, f64, f64) -> bool;

/// Relative error against the mean of both values.
#[allow(clippy::float_cmp)]
pub fn relative_mean_match(value: f64, target: f64, threshold: f64) -> bool {
    if value == target {
        return true;
    }
    let mean = ((value + target) / 2.0).abs();
    (value - target).abs() / mean < threshold
}

/// Relative error against the magnitude of `value`.
#[allow(clippy::float_cmp)]
pub fn relative_reference_match(value: f64, target: f64, threshold: f64) -> bool {
    if value == target {
        return true;
    }
    (value - target).abs() / value.abs() < threshold
}

impl Match<'_> {
    /// Number positions then date positions, each with its resolved value and,
    /// for dates, the calendar date it normalizes to.
    ///
    /// Positions whose token has no resolved value are skipped. Phrases come
    /// from widening all candidate positions over `compound_relations`.
    pub fn candidates<S: AsRef<str>>(&self, compound_relations: &[S]) -> Vec<Candidate> {
        let sentence = self.sentence();
        let mut seeds = vec![false; sentence.len()];
        for &p in self.number_positions.iter().chain(&self.date_positions) {
            if let Some(flag) = seeds.get_mut(p) {
                *flag = true;
            }
        }
        let phrases = runs(&compound(sentence, seeds, compound_relations));

        let numbers = self
            .number_positions
            .iter()
            .map(|&p| (FeatureKind::Number, p));
        let dates = self.date_positions.iter().map(|&p| (FeatureKind::Date, p));

        numbers
            .chain(dates)
            .filter_map(|(kind, position)| self.candidate(kind, position, &phrases))
            .collect()
    }

    fn candidate(
        &self,
        kind: FeatureKind,
        position: usize,
        phrases: &[Range<usize>],
    ) -> Option<Candidate> {
        let token = self.token(position)?;
        let value = token.numeric_composite_value.as_ref()?;

        // The resolved value stands for the whole expression; the token's own
        // text ("5" in "5 thousand") is never read as a number.
        let mut values = vec![Value::Number(value.to_f64())];
        if kind == FeatureKind::Date {
            if let Some(date) = token.normalized_ner.as_deref().and_then(parse_date) {
                values.push(Value::Date(date));
            }
        }
        values.retain(|v| v.as_f64().map_or(true, f64::is_finite));

        let phrase = phrases.iter().find(|run| run.contains(&position)).map(|run| {
            run.clone()
                .filter_map(|i| self.token(i))
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        });

        Some(Candidate {
            kind,
            sentence_index: self.sentence_index,
            position,
            text: token.text.clone(),
            phrase,
            values,
        })
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Turns matches and a known target value into labeled features.
#[derive(Debug, Clone)]
pub struct Labeler {
    threshold: f64,
    comparator: Comparator,
    compound_relations: Vec<String>,
}

impl Labeler {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&MatchingConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.relative_threshold,
            comparator: relative_mean_match,
            compound_relations: config.compound_relations.clone(),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, kind: FeatureKind, value: &Value, target: &Value) -> u8 {
        let positive = match (kind, value, target) {
            (FeatureKind::Date, _, _) => value == target,
            (FeatureKind::Number, Value::Number(v), Value::Number(t)) => {
                (self.comparator)(*v, *t, self.threshold)
            }
            (FeatureKind::Number, _, _) => false,
        };
        u8::from(positive)
    }

    /// One feature per (match, position, value), in match order.
    pub fn label<'m, 'a: 'm, I>(&self, matches: I, target: &Value) -> Vec<Feature>
    where
        I: IntoIterator<Item = &'m Match<'a>>,
    {
        let mut features = Vec::new();

        for m in matches {
            for candidate in m.candidates(self.compound_relations.as_slice()) {
                if candidate.values.is_empty() {
                    tracing::trace!(
                        position = candidate.position,
                        "Skipping candidate without values"
                    );
                    continue;
                }
                for value in &candidate.values {
                    features.push(Feature {
                        kind: candidate.kind,
                        sentence_index: candidate.sentence_index,
                        position: candidate.position,
                        phrase: candidate.phrase.clone(),
                        value: *value,
                        class: self.classify(candidate.kind, value, target),
                    });
                }
            }
        }

        tracing::debug!(
            features = features.len(),
            positive = features.iter().filter(|f| f.is_positive()).count(),
            target_value = %target,
            "Labeled features"
        );

        features
    }
}

impl Default for Labeler {
    fn default() -> Self {
        Self::new()
    }
}

/// Labels `matches` against `target` with the relative-mean comparator.
pub fn matches_to_features(matches: &MatchSet<'_>, target: &Value, threshold: f64) -> Vec<Feature> {
    Labeler::new().with_threshold(threshold).label(matches, target)
}
