use std::sync::Arc;

use crate::annotation::{CorefChain, DocumentView};
use crate::fuzzy::{FuzzyMatcher, StrsimMatcher};

/// Picks the coreference chain that refers to the target entity.
pub struct CorefResolver {
    matcher: Arc<dyn FuzzyMatcher>,
    threshold: u8,
}

impl CorefResolver {
    #[must_use]
    pub fn new(matcher: Arc<dyn FuzzyMatcher>, threshold: u8) -> Self {
        Self { matcher, threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn similarity_score(&self, chain: &CorefChain, entity: &str) -> u8 {
        self.matcher.partial_ratio(&chain.representative, entity)
    }

    /// First chain, in the document's enumeration order, whose representative
    /// mention scores above the threshold. Later chains are not examined even
    /// if they would score higher.
    pub fn find_chain<'d>(
        &self,
        document: &'d dyn DocumentView,
        entity: &str,
    ) -> Option<&'d CorefChain> {
        let found = document
            .coref_chains()
            .find(|chain| self.similarity_score(chain, entity) > self.threshold);

        match found {
            Some(chain) => tracing::debug!(
                chain = chain.id,
                representative = %chain.representative,
                entity,
                "Resolved coreference chain"
            ),
            None => tracing::debug!(entity, "No coreference chain for entity"),
        }

        found
    }
}

impl Default for CorefResolver {
    fn default() -> Self {
        Self::new(Arc::new(StrsimMatcher::new()), 85)
    }
}

impl std::fmt::Debug for CorefResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorefResolver")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
