use std::env;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use ragdb_core::config::{expand_path, Config, EmbeddingConfig, IngestConfig, SearchConfig, StoreConfig};
use ragdb_core::data_processor::{ChunkingConfig, DataProcessor};
use ragdb_core::traits::IndexStore;
use ragdb_core::types::{BulkReport, Degradation, SearchMode};
use ragdb_embed::{default_embedder, probe_dimension};
use ragdb_opensearch::OpenSearchStore;
use ragdb_retrieval::{format_context, HybridRetriever};

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|search|iterative> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => ingest(&config, &args).await?,
        "search" => search(&config, &args).await?,
        "iterative" => iterative(&config, &args).await?,
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn ingest(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let data_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
        let dir: String = config.get("data.raw_dir").unwrap_or_else(|_| "./data".to_string());
        expand_path(dir)
    });
    let store_cfg: StoreConfig = config.section("opensearch");
    let embed_cfg: EmbeddingConfig = config.section("embedding");
    let ingest_cfg: IngestConfig = config.section("ingest");

    println!("ragdb ingest\n============");
    println!("Data directory: {}", data_dir.display());
    println!("Index: {} @ {}", store_cfg.index, store_cfg.url());

    let processor = DataProcessor::with_config(ChunkingConfig {
        max_tokens: ingest_cfg.max_tokens,
        overlap_percent: ingest_cfg.overlap_percent,
    });
    let docs = processor.process_directory(&data_dir)?;
    if docs.is_empty() {
        println!("Nothing to ingest.");
        return Ok(());
    }
    println!("Prepared {} documents", docs.len());

    let embedder = default_embedder(&embed_cfg);
    let dimension = probe_dimension(embedder.as_ref()).await?;
    println!("Embedding dimension: {}", dimension);

    let store = OpenSearchStore::connect(&store_cfg).await?;
    store.create_index(dimension).await?;

    let retriever = HybridRetriever::new(store, embedder);
    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut report = BulkReport::default();
    for batch in docs.chunks(ingest_cfg.batch_size.max(1)) {
        report.absorb(retriever.ingest(batch).await?);
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("ingest complete");
    println!("✅ Ingested {} documents ({} failed)", report.indexed, report.failed);
    Ok(())
}

async fn search(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let mode: SearchMode = args.first().map_or("hybrid", String::as_str).parse()?;
    let query = args.get(1).cloned().unwrap_or_else(|| {
        eprintln!("Usage: ragdb search <lexical|semantic|hybrid> \"<query>\" [top_k]");
        std::process::exit(1)
    });
    let store_cfg: StoreConfig = config.section("opensearch");
    let embed_cfg: EmbeddingConfig = config.section("embedding");
    let search_cfg: SearchConfig = config.section("search");
    let top_k = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(search_cfg.top_k);

    let store = OpenSearchStore::connect(&store_cfg).await?;
    let retriever = HybridRetriever::new(store, default_embedder(&embed_cfg));

    let outcome = retriever.search_mode(mode, &query, top_k).await;
    match &outcome.degraded {
        Some(Degradation::LexicalFallback { reason }) => {
            println!("⚠️  fell back to lexical search: {}", reason);
        }
        Some(Degradation::Unavailable { reason }) => {
            println!("⚠️  search unavailable: {}", reason);
        }
        None => {}
    }

    println!("\n🔍 Found {} results for: \"{}\"", outcome.hits.len(), query);
    for (i, hit) in outcome.hits.iter().enumerate() {
        let title = hit.document.title.as_deref().unwrap_or(&hit.id);
        let snippet: String = hit.document.content.chars().take(120).collect();
        println!("\n  {}. score={:.4}  [{}]  {}", i + 1, hit.score, hit.document.kind.label(), title);
        println!("     📝 {}", snippet);
    }
    if !outcome.hits.is_empty() {
        println!("\n📄 Context for generation:\n\n{}", format_context(&outcome.hits));
    }
    Ok(())
}

async fn iterative(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let query = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: ragdb iterative \"<query>\" [steps] [top_k]");
        std::process::exit(1)
    });
    let store_cfg: StoreConfig = config.section("opensearch");
    let embed_cfg: EmbeddingConfig = config.section("embedding");
    let search_cfg: SearchConfig = config.section("search");
    let steps = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(search_cfg.refinement_steps);
    let top_k = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(search_cfg.top_k);

    let store = OpenSearchStore::connect(&store_cfg).await?;
    let retriever = HybridRetriever::new(store, default_embedder(&embed_cfg));

    let outcome = retriever.iterative(&query, steps, top_k).await?;
    if let Some(Degradation::Unavailable { reason }) = &outcome.degraded {
        println!("⚠️  stopped early: {}", reason);
    }
    println!("\n🔍 Accumulated {} results over up to {} steps", outcome.hits.len(), steps);
    for (i, hit) in outcome.hits.iter().enumerate() {
        let title = hit.document.title.as_deref().unwrap_or(&hit.id);
        println!("\n  {}. score={:.4}  {}", i + 1, hit.score, title);
        println!("     found by: \"{}\"", hit.query);
    }
    Ok(())
}
