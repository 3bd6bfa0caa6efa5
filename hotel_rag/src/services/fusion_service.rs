use crate::models::{Intent, SearchResult};

/// Merges baseline and semantic results under the intent gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFusion;

impl ResultFusion {
    /// Baseline first, then semantic, for intents that use semantic search;
    /// baseline alone otherwise. Entities found by both paths appear twice.
    pub fn combine(
        intent: Intent,
        baseline: Vec<SearchResult>,
        semantic: Vec<SearchResult>,
    ) -> Vec<SearchResult> {
        if !intent.uses_semantic_search() {
            return baseline;
        }

        let mut combined = baseline;
        combined.extend(semantic);
        combined
    }
}
