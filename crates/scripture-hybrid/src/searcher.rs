use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use scripture_core::config::Settings;
use scripture_core::error::Result;
use scripture_core::ingest::{discover_sources, read_document};
use scripture_core::traits::{Retriever, VerseStore};
use scripture_core::types::{SearchRequest, SearchResult, SearchType};
use scripture_fuzzy::FuzzySearcher;
use scripture_vector::{EmbedProvider, EmbeddingCache, SemanticSearcher, ThemeSearch};

use crate::categorize::CategorizedResults;
use crate::fanout::{fan_out, Strategies};
use crate::fusion::{fuse, normalize};
use crate::translations::TranslationRegistry;

/// Either the flat fused list or its book/chapter grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseBody {
    Results(Vec<SearchResult>),
    CategorizedResults(CategorizedResults),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub search_type: SearchType,
    pub total_results: usize,
    /// Seconds spent in fan-out, fusion and grouping.
    pub execution_time: f64,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl SearchResponse {
    /// Results in response order, whichever body shape was requested.
    pub fn results(&self) -> Vec<&SearchResult> {
        match &self.body {
            ResponseBody::Results(list) => list.iter().collect(),
            ResponseBody::CategorizedResults(grouped) => grouped.flatten(),
        }
    }
}

/// Store, fuzzy engine and semantic engine behind one search call.
///
/// `initialize` imports source documents when the store is empty, then
/// loads the corpus into both engines (embeddings via the cache). Searching
/// before initialising initialises lazily.
pub struct ScriptureSearcher<S> {
    store: S,
    fuzzy: FuzzySearcher,
    semantic: SemanticSearcher,
    translations: TranslationRegistry,
    settings: Settings,
    initialized: bool,
}

impl<S: VerseStore + Retriever> ScriptureSearcher<S> {
    pub fn new(store: S, provider: Box<dyn EmbedProvider>, settings: Settings) -> Self {
        let cache = EmbeddingCache::new(&settings.data.cache_dir).with_batch_size(settings.embedding.batch_size);
        Self::with_cache(store, provider, cache, settings)
    }

    pub fn with_cache(store: S, provider: Box<dyn EmbedProvider>, cache: EmbeddingCache, settings: Settings) -> Self {
        Self {
            store,
            fuzzy: FuzzySearcher::new(settings.search.fuzzy_cutoff),
            semantic: SemanticSearcher::with_cache(provider, cache, settings.search.semantic_threshold),
            translations: TranslationRegistry::default(),
            settings,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool { self.initialized }
    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn store(&self) -> &S { &self.store }

    /// Imports every source document when the store is empty, or always with
    /// `force_reload`, then loads the corpus into both engines. All documents
    /// are parsed before the store is touched and swapped in as one unit, so
    /// a bad document leaves the previous corpus in place. On error the
    /// searcher is left uninitialised.
    pub fn initialize(&mut self, force_reload: bool) -> Result<()> {
        if self.initialized && !force_reload {
            debug!("already initialized");
            return Ok(());
        }
        self.initialized = false;
        if force_reload || self.store.verse_count()? == 0 {
            self.import_sources()?;
        }
        self.load_corpus(false)?;
        self.initialized = true;
        info!("scripture search initialized");
        Ok(())
    }

    /// Recomputes every verse embedding regardless of the cache state.
    pub fn rebuild_embeddings(&mut self) -> Result<()> {
        self.initialized = false;
        self.load_corpus(true)?;
        self.initialized = true;
        Ok(())
    }

    fn import_sources(&mut self) -> Result<()> {
        let sources = discover_sources(Path::new(&self.settings.data.data_dir))?;
        let mut docs = Vec::with_capacity(sources.len());
        for source in sources {
            let doc = read_document(&source.path)?;
            docs.push((source.translation, doc));
        }
        let written = self
            .store
            .replace_all(&docs)
            .with_context(|| format!("importing {} source documents", docs.len()))?;
        info!(translations = docs.len(), verses = written, "imported source documents");
        self.translations = TranslationRegistry::default();
        for (translation, _) in docs {
            self.translations.record(translation);
        }
        Ok(())
    }

    fn load_corpus(&mut self, force_recompute: bool) -> Result<()> {
        let verses = self.store.all_verses(None)?;
        if verses.is_empty() {
            warn!("verse corpus is empty");
        }
        self.fuzzy.load(&verses);
        self.semantic.load(&verses, force_recompute)?;
        Ok(())
    }

    pub fn search(&mut self, request: &SearchRequest) -> Result<SearchResponse> {
        if !self.initialized {
            self.initialize(false)?;
        }
        let start = Instant::now();
        let theme = ThemeSearch(&self.semantic);
        let strategies = Strategies {
            literal: &self.store,
            fuzzy: &self.fuzzy,
            semantic: &self.semantic,
            topic: &theme,
        };
        let hits = fan_out(&strategies, &request.query, request.search_type, request.bound())?;
        let results = fuse(normalize(hits, self.settings.search.score_scale), request.bound(), request.include_scores);
        let total_results = results.len();
        let body = if request.categorize {
            ResponseBody::CategorizedResults(CategorizedResults::new(results))
        } else {
            ResponseBody::Results(results)
        };
        let execution_time = start.elapsed().as_secs_f64();
        debug!(query = %request.query, search_type = %request.search_type, total_results, execution_time, "search complete");
        Ok(SearchResponse {
            query: request.query.clone(),
            search_type: request.search_type,
            total_results,
            execution_time,
            body,
        })
    }

    /// Sorted translation tags; falls back to the store when nothing was
    /// imported in this session.
    pub fn available_translations(&mut self) -> Result<Vec<String>> {
        if !self.initialized {
            self.initialize(false)?;
        }
        Ok(self.translations.list(&self.store)?)
    }
}
