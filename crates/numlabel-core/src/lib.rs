pub mod annotation;
pub mod compound;
pub mod config;
pub mod error;
pub mod features;
pub mod fuzzy;
pub mod matching;
pub mod numeric;

pub use annotation::{
    AnnotatedDocument, AnnotatedSentence, AnnotationError, AnnotationSource, CorefChain, Decimal,
    DependencyEdge, DocumentView, Mention, NerTag, ParseTree, SentenceView, SharedPipeline, Token,
};
pub use compound::{chunk, chunk_num, compound, COMPOUND_RELATIONS};
pub use config::MatchingConfig;
pub use error::{Error, Result};
pub use features::{
    matches_to_features, relative_mean_match, relative_reference_match, Candidate, Comparator,
    Feature, FeatureKind, Labeler, Value,
};
pub use fuzzy::{FuzzyMatcher, StrsimMatcher};
pub use matching::{
    CorefResolver, EntityMentionMatcher, Match, MatchSet, RelationMatcher, ScanOutput, ScanStats,
    Target, UtteranceFinder,
};
pub use numeric::{num, strnum, Number};
