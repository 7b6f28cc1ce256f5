use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookqa_core::config::Config;
use bookqa_core::ChunkStore;
use bookqa_embed::default_embedder;
use bookqa_hybrid::engine::{DENSE_DIR, LEXICAL_DIR};
use bookqa_hybrid::{Answer, Engine};
use bookqa_text::LexicalIndex;
use bookqa_vector::{read_meta, DenseIndex};

#[derive(Parser)]
#[command(name = "bookqa")]
#[command(about = "Answer questions from an indexed book")]
#[command(version)]
struct Cli {
    /// Index directory written by bookqa-indexer [default: data.index_dir]
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question, or start an interactive session when none is given
    Ask {
        query: Option<String>,

        /// Candidate chunks per index [default: retrieval.top_k]
        #[arg(short, long)]
        k: Option<usize>,

        /// Print each sentence's similarity score
        #[arg(long)]
        scores: bool,
    },

    /// Show how many embeddings are stored and the first few vectors
    Inspect {
        #[arg(short, long, default_value = "3")]
        n: usize,
    },

    /// Raw lexical hits for a query
    Lexical {
        query: String,

        #[arg(short, long, default_value = "10")]
        k: usize,

        /// Only exact phrase matches
        #[arg(long)]
        phrase: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Config::load().context("loading configuration")?.settings()?;
    let index_dir = cli.index_dir.unwrap_or_else(|| settings.data.index_dir());

    match cli.command {
        Commands::Ask { query, k, scores } => {
            let chunks = ChunkStore::load(&settings.data.chunks_path())?;
            let embedder = default_embedder(&settings.embedding)?;
            let engine = Engine::open(&settings, embedder, chunks, &index_dir)?;
            let k = k.unwrap_or(settings.retrieval.top_k);
            match query {
                Some(query) => ask(&engine, &query, k, scores)?,
                None => interactive(&engine, k, scores)?,
            }
        }
        Commands::Inspect { n } => inspect(&index_dir.join(DENSE_DIR), n)?,
        Commands::Lexical { query, k, phrase } => {
            let index = LexicalIndex::open(&index_dir.join(LEXICAL_DIR))?;
            let hits = if phrase { index.search_phrase(&query, k)? } else { index.search(&query, k)? };
            println!("🔍 Found {} results for: \"{}\"", hits.len(), query);
            for (i, (id, score)) in hits.iter().enumerate() {
                let text = index.document(*id)?.map(|d| d.text).unwrap_or_default();
                println!("\n  {}. score={:.4}  id={}", i + 1, score, id);
                println!("     {}", preview(&text, 200));
            }
        }
    }
    Ok(())
}

fn ask(engine: &Engine, query: &str, k: usize, scores: bool) -> anyhow::Result<()> {
    if scores {
        let scored = engine.retrieve_scored(query, k)?;
        if scored.is_empty() {
            println!("⚠️  No relevant answer found.\n💡 {}", engine.fallback(query));
        }
        for (i, s) in scored.iter().enumerate() {
            println!("{}. [{:.4}] {}", i + 1, s.score, s.text);
        }
        return Ok(());
    }

    match engine.answer(query, k)? {
        Answer::Sentences(sentences) => {
            println!("\n✅ Top answers:");
            for (i, s) in sentences.iter().enumerate() {
                println!("{}. {}\n", i + 1, s);
            }
        }
        Answer::Fallback(line) => println!("⚠️  No relevant answer found.\n💡 {line}"),
    }
    Ok(())
}

fn interactive(engine: &Engine, k: usize, scores: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n❓ Enter your question (or type 'exit' to quit): ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?;
        let query = query.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }
        ask(engine, query, k, scores)?;
    }
    println!("👋 Bye.");
    Ok(())
}

fn inspect(dense_dir: &Path, n: usize) -> anyhow::Result<()> {
    let meta = read_meta(dense_dir)?;
    let index = DenseIndex::load(dense_dir)?;
    println!("📊 Stored embeddings: {}", index.len());
    println!("   dimension: {}  built: {}", meta.dim, meta.built_at);
    for id in 0..n.min(index.len()) {
        if let Some(v) = index.vector(id) {
            let head: Vec<String> = v.iter().take(8).map(|x| format!("{x:.4}")).collect();
            println!("   [{id}] [{}{}]", head.join(", "), if v.len() > 8 { ", ..." } else { "" });
        }
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars { format!("{head}...") } else { head }
}
