//! scripture-vector
//!
//! Verse embeddings and semantic search: the on-disk embedding cache keyed by
//! provider identity, and a cosine-similarity searcher built on it.

pub mod cache;
pub mod embed_provider;
pub mod search;

pub use cache::{cache_file_name, CacheReport, CacheState, EmbeddingCache, LoadedEmbeddings};
pub use embed_provider::{local::LocalProvider, EmbedProvider};
pub use search::{cosine_similarity, SemanticSearcher, ThemeSearch, VectorIndex};
