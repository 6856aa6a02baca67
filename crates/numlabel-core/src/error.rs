use thiserror::Error;

use crate::annotation::{AnnotationError, TreeParseError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Annotation failed: {0}")]
    Annotation(#[from] AnnotationError),

    #[error("Invalid parse tree: {0}")]
    ParseTree(#[from] TreeParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid NER tag: {0}")]
    InvalidNerTag(String),

    #[error("Invalid feature kind: {0}")]
    InvalidFeatureKind(String),

    #[error("Token index {index} out of range for sentence of {len} tokens")]
    TokenOutOfRange { index: usize, len: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
