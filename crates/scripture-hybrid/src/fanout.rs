use anyhow::{Context, Result};
use tracing::debug;

use scripture_core::traits::Retriever;
use scripture_core::types::{ScoredVerse, SearchMethod, SearchType};

/// A collaborator hit tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedHit {
    pub method: SearchMethod,
    pub hit: ScoredVerse,
}

/// The retrieval collaborators a query can be dispatched to.
pub struct Strategies<'a> {
    pub literal: &'a dyn Retriever,
    pub fuzzy: &'a dyn Retriever,
    pub semantic: &'a dyn Retriever,
    pub topic: &'a dyn Retriever,
}

impl<'a> Strategies<'a> {
    fn get(&self, method: SearchMethod) -> &'a dyn Retriever {
        match method {
            SearchMethod::Exact => self.literal,
            SearchMethod::Fuzzy => self.fuzzy,
            SearchMethod::Semantic => self.semantic,
            SearchMethod::Topic => self.topic,
        }
    }
}

/// Strategies invoked for a selector, in arrival order. `all` does not
/// include `topic`.
pub fn methods_for(search_type: SearchType) -> &'static [SearchMethod] {
    match search_type {
        SearchType::Exact => &[SearchMethod::Exact],
        SearchType::Fuzzy => &[SearchMethod::Fuzzy],
        SearchType::Semantic => &[SearchMethod::Semantic],
        SearchType::Topic => &[SearchMethod::Topic],
        SearchType::All => &[SearchMethod::Exact, SearchMethod::Fuzzy, SearchMethod::Semantic],
    }
}

/// Calls each applicable strategy once and concatenates the tagged hits.
/// The first collaborator error aborts the whole query.
pub fn fan_out(
    strategies: &Strategies<'_>,
    query: &str,
    search_type: SearchType,
    limit: Option<usize>,
) -> Result<Vec<TaggedHit>> {
    let mut tagged = Vec::new();
    for &method in methods_for(search_type) {
        let hits = strategies
            .get(method)
            .retrieve(query, limit)
            .with_context(|| format!("{method} search failed"))?;
        debug!(%method, hits = hits.len(), "strategy returned");
        tagged.extend(hits.into_iter().map(|hit| TaggedHit { method, hit }));
    }
    Ok(tagged)
}
