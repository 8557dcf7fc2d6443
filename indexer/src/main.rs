use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use cinedex_core::lsh::{LshParams, MinHashLsh};
use cinedex_core::persist::IndexPaths;
use cinedex_core::tokenizer::normalize_field;
use cinedex_core::{Document, Field, InvertedIndex, Scoring, SearchEngine};

#[derive(Parser)]
#[command(name = "cinedex-indexer")]
#[command(about = "Build and query the movie-metadata search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all index files from a crawled JSON corpus
    Build {
        /// Crawled corpus (JSON array of movie records)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Index only the first N records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run a query against a built index
    Search {
        /// Index directory
        #[arg(long)]
        index: PathBuf,
        /// Query text
        #[arg(long)]
        query: String,
        /// Scoring method: a SMART pair such as lnc.ltc, or OkapiBM25
        #[arg(long, default_value = "lnc.ltc")]
        method: String,
        /// Field weight as field=value (repeatable); defaults to 1.0
        /// for stars, genres and summaries
        #[arg(long = "weight", value_parser = parse_weight)]
        weights: Vec<(Field, f64)>,
        /// Use the approximate tiered index instead of the full one
        #[arg(long, default_value_t = false)]
        unsafe_ranking: bool,
        /// Maximum number of results (omit for no truncation)
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Detect near-duplicate summaries with MinHash/LSH
    Dedup {
        /// Crawled corpus (JSON array of movie records)
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 100)]
        num_hashes: usize,
        #[arg(long, default_value_t = 10)]
        bands: usize,
        #[arg(long, default_value_t = 10)]
        rows_per_band: usize,
        /// Fixed permutation seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Analyze only the first N records
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_weight(s: &str) -> Result<(Field, f64), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got {s:?}"))?;
    let field: Field = field.parse().map_err(|e| format!("{e}"))?;
    let value: f64 = value.parse().map_err(|e| format!("invalid weight: {e}"))?;
    Ok((field, value))
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, limit } => build(&input, &output, limit),
        Commands::Search { index, query, method, weights, unsafe_ranking, max_results } => {
            search(&index, &query, &method, weights, unsafe_ranking, max_results)
        }
        Commands::Dedup { input, num_hashes, bands, rows_per_band, seed, limit } => {
            dedup(&input, num_hashes, bands, rows_per_band, seed, limit)
        }
    }
}

fn read_corpus(input: &PathBuf, limit: Option<usize>) -> Result<Vec<Document>> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut documents: Vec<Document> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", input.display()))?;
    if let Some(limit) = limit {
        documents.truncate(limit);
    }
    Ok(documents)
}

fn build(input: &PathBuf, output: &PathBuf, limit: Option<usize>) -> Result<()> {
    let start = std::time::Instant::now();
    let mut documents = read_corpus(input, limit)?;
    tracing::info!(documents = documents.len(), "read crawled corpus");

    for document in &mut documents {
        document.stars = normalize_field(&document.stars);
        document.genres = normalize_field(&document.genres);
        document.summaries = normalize_field(&document.summaries);
    }

    let mut engine = SearchEngine::new(InvertedIndex::build(documents));
    let stamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    engine.set_created_at(stamp);
    engine.store(&IndexPaths::new(output))?;

    tracing::info!(
        documents = engine.metadata().document_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        output = %output.display(),
        "index build complete"
    );
    Ok(())
}

fn search(
    index: &PathBuf,
    query: &str,
    method: &str,
    weights: Vec<(Field, f64)>,
    unsafe_ranking: bool,
    max_results: Option<usize>,
) -> Result<()> {
    let scoring: Scoring = method.parse()?;
    let weights: HashMap<Field, f64> = if weights.is_empty() {
        Field::ALL.into_iter().map(|f| (f, 1.0)).collect()
    } else {
        weights.into_iter().collect()
    };

    let engine = SearchEngine::load(&IndexPaths::new(index))?;
    let start = std::time::Instant::now();
    let results = engine.search(query, scoring, &weights, !unsafe_ranking, max_results);
    let elapsed = start.elapsed();

    if results.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (rank, (id, score)) in results.iter().enumerate() {
        let title = engine
            .index()
            .get(id)
            .map(|d| d.title.as_str())
            .unwrap_or("<unknown>");
        println!("{:>3}. {score:>10.4}  {id}  {title}", rank + 1);
    }
    tracing::info!(hits = results.len(), elapsed_ms = elapsed.as_millis() as u64, "search done");
    Ok(())
}

fn dedup(
    input: &PathBuf,
    num_hashes: usize,
    bands: usize,
    rows_per_band: usize,
    seed: Option<u64>,
    limit: Option<usize>,
) -> Result<()> {
    if bands * rows_per_band != num_hashes {
        bail!("bands * rows-per-band must equal num-hashes ({bands} * {rows_per_band} != {num_hashes})");
    }
    let documents = read_corpus(input, limit)?;
    let texts: Vec<String> = documents.iter().map(|d| d.summaries.join(" ")).collect();

    let lsh = MinHashLsh::new(LshParams {
        num_hashes,
        shingle_size: 2,
        bands,
        rows_per_band,
        seed,
    });
    let buckets = lsh.detect(&texts);
    let candidate_buckets = buckets.values().filter(|docs| docs.len() > 1).count();
    let score = lsh.evaluate(&buckets, &texts);

    println!("documents:          {}", texts.len());
    println!("buckets:            {}", buckets.len());
    println!("candidate buckets:  {candidate_buckets}");
    println!("detection score:    {score:.3}");
    Ok(())
}
