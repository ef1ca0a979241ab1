use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use scripture_core::config::{EmbeddingBackend, Settings};
use scripture_core::error::Error;
use scripture_core::ingest::BibleDocument;
use scripture_core::types::{SearchMethod, SearchRequest, SearchType};
use scripture_hybrid::{ResponseBody, ScriptureSearcher};
use scripture_store::SqliteStore;
use scripture_vector::{cache_file_name, EmbedProvider, LocalProvider};

fn kjv() -> Value {
    json!({"books": [
        {"name": "Genesis", "chapters": [{"chapter": 1, "name": "Genesis 1", "verses": [
            {"verse": 1, "name": "Genesis 1:1", "text": "In the beginning God created the heaven and the earth."},
            {"verse": 3, "name": "Genesis 1:3", "text": "And God said, Let there be light: and there was light."}
        ]}]},
        {"name": "John", "chapters": [{"chapter": 3, "name": "John 3", "verses": [
            {"verse": 16, "name": "John 3:16", "text": "For God so loved the world, that he gave his only begotten Son."}
        ]}]},
        {"name": "1 John", "chapters": [{"chapter": 4, "name": "1 John 4", "verses": [
            {"verse": 8, "name": "1 John 4:8", "text": "He that loveth not knoweth not God; for God is love."}
        ]}]}
    ]})
}

fn asv() -> Value {
    json!({"books": [
        {"name": "Psalms", "chapters": [{"chapter": 23, "name": "Psalms 23", "verses": [
            {"verse": 1, "name": "Psalms 23:1", "text": "Jehovah is my shepherd; I shall not want."}
        ]}]}
    ]})
}

fn write_sources(dir: &Path, docs: &[(&str, Value)]) {
    fs::create_dir_all(dir).expect("data dir");
    for (tag, doc) in docs {
        fs::write(dir.join(format!("{tag}.json")), doc.to_string()).expect("write source");
    }
}

fn settings(tmp: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.data.data_dir = tmp.path().join("data").to_string_lossy().into_owned();
    settings.data.cache_dir = tmp.path().join("cache").to_string_lossy().into_owned();
    settings.embedding.backend = EmbeddingBackend::Hash;
    settings.embedding.dim = 384;
    settings
}

fn searcher(tmp: &TempDir) -> ScriptureSearcher<SqliteStore> {
    write_sources(&tmp.path().join("data"), &[("kjv", kjv()), ("asv", asv())]);
    let settings = settings(tmp);
    let provider = LocalProvider::from_settings(&settings.embedding).expect("provider");
    let store = SqliteStore::open_in_memory().expect("store");
    ScriptureSearcher::new(store, Box::new(provider), settings)
}

#[test]
fn first_search_initializes_lazily() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    assert!(!s.is_initialized());

    let response = s.search(&SearchRequest::new("light").search_type(SearchType::Exact)).expect("search");
    assert!(s.is_initialized());
    assert_eq!(s.store().verse_count().expect("count"), 5);
    assert!(tmp.path().join("cache").join(cache_file_name("hash:d384")).exists());

    assert_eq!(response.total_results, 1);
    let results = response.results();
    assert_eq!(results[0].verse.name, "Genesis 1:3");
    assert_eq!(results[0].score, Some(20.0));
    assert_eq!(results[0].rank, Some(20.0));
    assert_eq!(results[0].search_method, SearchMethod::Exact);
}

#[test]
fn categorized_response_shape() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    let response = s.search(&SearchRequest::new("light").search_type(SearchType::Exact)).expect("search");
    assert!(matches!(response.body, ResponseBody::CategorizedResults(_)));

    let value = serde_json::to_value(&response).expect("json");
    assert_eq!(value["query"], "light");
    assert_eq!(value["search_type"], "exact");
    assert_eq!(value["total_results"], 1);
    assert!(value["execution_time"].as_f64().expect("seconds") >= 0.0);
    assert!(value.get("results").is_none());
    let bucket = &value["categorized_results"]["Genesis"]["Genesis 1"];
    assert_eq!(bucket[0]["name"], "Genesis 1:3");
    assert_eq!(bucket[0]["translation"], "kjv");
}

#[test]
fn flat_response_without_scores() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    let request = SearchRequest::new("God").search_type(SearchType::Exact).categorize(false).include_scores(false);
    let response = s.search(&request).expect("search");
    assert_eq!(response.total_results, 4);

    let value = serde_json::to_value(&response).expect("json");
    assert!(value.get("categorized_results").is_none());
    let results = value["results"].as_array().expect("results");
    assert_eq!(results.len(), 4);
    for r in results {
        assert!(r.get("score").is_none());
        assert!(r.get("rank").is_none());
        assert_eq!(r["search_method"], "exact");
    }
}

#[test]
fn limit_zero_is_unbounded() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    let bounded = s.search(&SearchRequest::new("God").search_type(SearchType::Exact).limit(2)).expect("bounded");
    assert_eq!(bounded.total_results, 2);
    let unbounded = s.search(&SearchRequest::new("God").search_type(SearchType::Exact).limit(0)).expect("unbounded");
    assert_eq!(unbounded.total_results, 4);
    let negative = s.search(&SearchRequest::new("God").search_type(SearchType::Exact).limit(-3)).expect("negative");
    assert_eq!(negative.total_results, 4);
}

#[test]
fn combined_search_deduplicates_across_strategies() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    let response = s.search(&SearchRequest::new("God is love").limit(0).categorize(false)).expect("search");
    let results = response.results();
    assert_eq!(results[0].verse.name, "1 John 4:8");
    assert_eq!(results[0].score, Some(100.0));
    assert_eq!(results[0].search_method, SearchMethod::Fuzzy);

    let mut ids: Vec<i64> = results.iter().map(|r| r.id()).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total, "each verse appears once");
}

#[test]
fn topic_search_tags_semantic_hits_as_topic() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    let request = SearchRequest::new("the beginning of heaven and earth").search_type(SearchType::Topic).categorize(false);
    let response = s.search(&request).expect("topic");
    let results = response.results();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.search_method == SearchMethod::Topic));
    assert_eq!(results[0].verse.name, "Genesis 1:1");
    assert!(results.iter().all(|r| r.score_or_zero() >= 0.5 && r.score_or_zero() <= 1.0 + 1e-6));
}

#[test]
fn translations_come_from_import_or_store() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    assert_eq!(s.available_translations().expect("translations"), ["asv", "kjv"]);

    let tmp2 = TempDir::new().expect("tmp");
    let settings = settings(&tmp2);
    let mut store = SqliteStore::open_in_memory().expect("store");
    let doc: BibleDocument = serde_json::from_value(kjv()).expect("doc");
    store.import_bible(&doc, "kjv").expect("import");
    let provider = LocalProvider::from_settings(&settings.embedding).expect("provider");
    let mut preloaded = ScriptureSearcher::new(store, Box::new(provider), settings);
    assert_eq!(preloaded.available_translations().expect("translations"), ["kjv"]);
}

#[test]
fn force_reload_reimports_without_duplicates() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    s.initialize(false).expect("init");
    s.initialize(true).expect("reload");
    assert_eq!(s.store().verse_count().expect("count"), 5);

    fs::remove_file(tmp.path().join("data").join("asv.json")).expect("remove");
    s.initialize(true).expect("reload without asv");
    assert_eq!(s.store().verse_count().expect("count"), 4);
    assert_eq!(s.available_translations().expect("translations"), ["kjv"]);
    s.rebuild_embeddings().expect("rebuild");
    let response = s.search(&SearchRequest::new("light").search_type(SearchType::Exact)).expect("search");
    assert_eq!(response.total_results, 1);
}

#[test]
fn failed_reload_keeps_previous_corpus() {
    let tmp = TempDir::new().expect("tmp");
    let mut s = searcher(&tmp);
    s.initialize(false).expect("init");
    fs::write(tmp.path().join("data").join("0_broken.json"), "{not json").expect("write");

    assert!(s.initialize(true).is_err());
    assert!(!s.is_initialized());
    assert_eq!(s.store().verse_count().expect("count"), 5);

    let response = s.search(&SearchRequest::new("light").search_type(SearchType::Exact)).expect("search");
    assert_eq!(response.total_results, 1);
    assert!(s.is_initialized());
}

#[test]
fn missing_sources_fail_initialization() {
    let tmp = TempDir::new().expect("tmp");
    let settings = settings(&tmp);
    let provider = LocalProvider::from_settings(&settings.embedding).expect("provider");
    let mut s = ScriptureSearcher::new(SqliteStore::open_in_memory().expect("store"), Box::new(provider), settings);
    let err = s.search(&SearchRequest::new("love")).expect_err("no data dir");
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!s.is_initialized());
}

#[test]
fn empty_corpus_returns_empty_results() {
    let tmp = TempDir::new().expect("tmp");
    write_sources(&tmp.path().join("data"), &[("empty", json!({"books": []}))]);
    let settings = settings(&tmp);
    let provider = LocalProvider::from_settings(&settings.embedding).expect("provider");
    let mut s = ScriptureSearcher::new(SqliteStore::open_in_memory().expect("store"), Box::new(provider), settings);
    let response = s.search(&SearchRequest::new("love")).expect("search");
    assert_eq!(response.total_results, 0);
    let value = serde_json::to_value(&response).expect("json");
    assert_eq!(value["categorized_results"], json!({}));
}

#[test]
fn invalid_selector_is_rejected() {
    let err = "bogus".parse::<SearchType>().expect_err("invalid");
    assert!(matches!(err, Error::InvalidSearchType(ref s) if s == "bogus"));
}

/// Hash embeddings that refuse one query.
struct Flaky(LocalProvider);

impl EmbedProvider for Flaky {
    fn embedder_id(&self) -> &str { self.0.embedder_id() }
    fn dim(&self) -> usize { self.0.dim() }
    fn max_len(&self) -> usize { self.0.max_len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t == "boom") {
            return Err(anyhow!("embedding backend crashed"));
        }
        self.0.embed_batch(texts)
    }
}

#[test]
fn provider_failure_propagates_from_search() {
    let tmp = TempDir::new().expect("tmp");
    write_sources(&tmp.path().join("data"), &[("kjv", kjv())]);
    let settings = settings(&tmp);
    let provider = Flaky(LocalProvider::from_settings(&settings.embedding).expect("provider"));
    let mut s = ScriptureSearcher::new(SqliteStore::open_in_memory().expect("store"), Box::new(provider), settings);

    let err = s.search(&SearchRequest::new("boom")).expect_err("semantic failure");
    assert!(matches!(err, Error::Collaborator(_)));
    let msg = format!("{:#}", anyhow::Error::from(err));
    assert!(msg.contains("embedding backend crashed"), "{msg}");

    assert!(s.search(&SearchRequest::new("boom").search_type(SearchType::Exact)).is_ok());
}
