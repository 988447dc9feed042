use std::env;

use tracing_subscriber::EnvFilter;

use ragdb_core::config::{Config, StoreConfig};
use ragdb_core::traits::IndexStore;
use ragdb_core::types::SearchQuery;
use ragdb_opensearch::OpenSearchStore;

/// Lexical-only query straight through the store, bypassing the retriever.
/// Works with the embedding service down.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [top_k]", args[0]);
        eprintln!("Example: {} 'lithium battery' 10", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let top_k = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    let config = Config::load()?;
    let store_cfg: StoreConfig = config.section("opensearch");
    println!("🔍 ragdb-search-only\n====================");
    println!("Query: {}", query_text);
    println!("Index: {} @ {}", store_cfg.index, store_cfg.url());

    let store = OpenSearchStore::connect(&store_cfg).await?;
    let hits = store
        .search(&SearchQuery::Match { text: query_text.clone() }, top_k)
        .await?;

    println!("\n🔍 Found {} results for: \"{}\"", hits.len(), query_text);
    for (i, hit) in hits.iter().enumerate() {
        let title = hit.document.title.as_deref().unwrap_or("-");
        let snippet: String = hit.document.content.chars().take(160).collect();
        println!("\n  {}. score={:.4}  id={}  title={}", i + 1, hit.score, hit.id, title);
        println!("     📝 {}", snippet);
    }
    Ok(())
}
