use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use bookqa_core::config::Config;
use bookqa_core::ChunkStore;
use bookqa_embed::default_embedder;
use bookqa_hybrid::Engine;

#[derive(Parser)]
#[command(name = "bookqa-indexer")]
#[command(about = "Embed a chunk file and write the dense and lexical indexes")]
#[command(version)]
struct Args {
    /// One chunk per line, or a JSON array of {id, text} passages [default: data.chunks_path]
    chunks: Option<PathBuf>,

    /// Where to write dense/ and lexical/ [default: data.index_dir]
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write the chunks as a JSON passage file (book.json)
    #[arg(long)]
    write_json: Option<PathBuf>,

    /// Build the dense index only
    #[arg(long)]
    no_lexical: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut settings = Config::load().context("loading configuration")?.settings()?;
    if args.no_lexical {
        settings.retrieval.use_lexical = false;
    }
    let chunks_path = args.chunks.unwrap_or_else(|| settings.data.chunks_path());
    let out_dir = args.out.unwrap_or_else(|| settings.data.index_dir());

    println!("bookqa indexer\n==============");
    println!("Chunks: {}", chunks_path.display());
    println!("Output: {}", out_dir.display());

    let chunks = ChunkStore::load(&chunks_path)?;
    if let Some(json_path) = &args.write_json {
        chunks.write_json(json_path)?;
        println!("📝 Wrote {} passages to {}", chunks.len(), json_path.display());
    }

    let embedder = default_embedder(&settings.embedding)?;
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("embedding");
    let engine = Engine::build(&settings, embedder, chunks, |done, _| pb.set_position(done as u64))?;
    pb.finish_with_message("embedded");

    engine.save(&out_dir)?;
    println!("\n✅ Indexing completed successfully!");
    println!("📊 {} chunks, {} dimensions", engine.dense().len(), engine.dense().dim().unwrap_or(0));
    if let Some(lexical) = engine.lexical() {
        println!("📊 {} documents in the lexical index", lexical.num_docs());
    }
    println!("\n💡 Ask a question with: cargo run --bin bookqa -- ask '<question>'");
    Ok(())
}
