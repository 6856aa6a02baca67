use serde::{Deserialize, Serialize};

use crate::compound::default_relations;
use crate::error::{Error, Result};

/// Thresholds and relation labels used when matching and labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Partial-ratio score a coreference chain's representative mention must
    /// exceed to be taken as the target entity.
    pub coref_threshold: u8,
    /// Token-set-ratio score a token must exceed to count as an entity mention.
    pub entity_threshold: u8,
    /// Relative error under which a number is labeled as the target.
    pub relative_threshold: f64,
    /// Dependency labels followed when widening tags to phrases.
    pub compound_relations: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            coref_threshold: 85,
            entity_threshold: 85,
            relative_threshold: 0.15,
            compound_relations: default_relations(),
        }
    }
}

impl MatchingConfig {
    /// Defaults overridden by `NUMLABEL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("NUMLABEL_COREF_THRESHOLD") {
            config.coref_threshold = parse_var("NUMLABEL_COREF_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("NUMLABEL_ENTITY_THRESHOLD") {
            config.entity_threshold = parse_var("NUMLABEL_ENTITY_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("NUMLABEL_RELATIVE_THRESHOLD") {
            config.relative_threshold = parse_var("NUMLABEL_RELATIVE_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("NUMLABEL_COMPOUND_RELATIONS") {
            config.compound_relations = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_coref_threshold(mut self, threshold: u8) -> Self {
        self.coref_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_entity_threshold(mut self, threshold: u8) -> Self {
        self.entity_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_relative_threshold(mut self, threshold: f64) -> Self {
        self.relative_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_compound_relations(mut self, relations: Vec<String>) -> Self {
        self.compound_relations = relations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.coref_threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "coref_threshold must be at most 100, got {}",
                self.coref_threshold
            )));
        }
        if self.entity_threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "entity_threshold must be at most 100, got {}",
                self.entity_threshold
            )));
        }
        if !self.relative_threshold.is_finite() || self.relative_threshold <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "relative_threshold must be positive, got {}",
                self.relative_threshold
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key}: cannot parse '{value}'")))
}
