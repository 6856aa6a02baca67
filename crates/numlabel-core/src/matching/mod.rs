mod matches;
mod relation;
mod resolver;
mod scanner;

pub use matches::{Match, MatchSet, SentenceKey, Target};
pub use relation::{is_stop_word, EntityMentionMatcher, RelationMatcher, STOP_WORDS};
pub use resolver::CorefResolver;
pub use scanner::{ScanOutput, ScanStats, SentenceScan, UtteranceFinder};
