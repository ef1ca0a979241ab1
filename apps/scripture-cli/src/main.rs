//! `scripture`: search scripture by literal text, fuzzy similarity and meaning.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scripture_core::config::{Config, Settings};
use scripture_core::types::{SearchRequest, SearchType};
use scripture_hybrid::ScriptureSearcher;
use scripture_store::SqliteStore;
use scripture_vector::LocalProvider;

mod render;

#[derive(Parser)]
#[command(name = "scripture", version, about)]
struct Cli {
    /// Directory containing `<translation>.json` files.
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<String>,

    /// SQLite database file.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Directory for embedding cache files.
    #[arg(long, global = true)]
    cache_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search verses.
    Search {
        /// Query text; multiple words are joined with spaces.
        #[arg(required = true)]
        query: Vec<String>,

        /// exact, fuzzy, semantic, topic or all.
        #[arg(short = 't', long = "type", default_value = "all")]
        search_type: SearchType,

        /// Maximum results; 0 or less returns everything.
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Print the response as JSON.
        #[arg(short, long)]
        json: bool,

        /// Show relevance scores.
        #[arg(short, long)]
        scores: bool,

        /// List results without grouping by book and chapter.
        #[arg(long)]
        no_categorize: bool,

        #[arg(long)]
        no_color: bool,
    },

    /// Import source documents and build the embedding cache.
    Init {
        /// Drop the database contents and import every document again.
        #[arg(long)]
        force: bool,

        /// Recompute embeddings even when the cache is valid.
        #[arg(long)]
        reembed: bool,
    },

    /// List imported translations.
    Translations,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("scripture=info,candle_core=warn,candle_nn=warn,candle_transformers=warn,tokenizers=warn")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    match cli.command {
        Command::Search { query, search_type, limit, json, scores, no_categorize, no_color } => {
            if no_color {
                console::set_colors_enabled(false);
            }
            let request = SearchRequest::new(query.join(" "))
                .search_type(search_type)
                .limit(limit.unwrap_or(settings.search.default_limit))
                .categorize(!no_categorize)
                .include_scores(scores || json);
            let mut searcher = open_searcher(settings)?;
            let response = searcher.search(&request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                render::print_response(&response, scores);
            }
        }
        Command::Init { force, reembed } => {
            let db_path = settings.data.db_path.clone();
            let mut searcher = open_searcher(settings)?;
            searcher.initialize(force)?;
            if reembed {
                searcher.rebuild_embeddings()?;
            }
            println!("Database initialized at {db_path}");
            println!("Available translations: {}", searcher.available_translations()?.join(", "));
        }
        Command::Translations => {
            let mut searcher = open_searcher(settings)?;
            for tag in searcher.available_translations()? {
                println!("{tag}");
            }
        }
    }
    Ok(())
}

/// Config files and `APP_*` variables, then command-line overrides.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Config::load()?.settings()?;
    settings.apply_overrides(
        &std::env::current_dir()?,
        cli.data_dir.as_deref(),
        cli.db.as_deref(),
        cli.cache_dir.as_deref(),
    );
    Ok(settings)
}

fn open_searcher(settings: Settings) -> Result<ScriptureSearcher<SqliteStore>> {
    let store = SqliteStore::open(Path::new(&settings.data.db_path))?;
    let provider = LocalProvider::from_settings(&settings.embedding)?;
    info!(db = %settings.data.db_path, "opening searcher");
    Ok(ScriptureSearcher::new(store, Box::new(provider), settings))
}
