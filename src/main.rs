use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod analytics_db;
pub mod cli;
pub mod content;
pub mod data_dir;
pub mod engine;
pub mod error;
pub mod matching;
pub mod mcp;
pub mod reasoning;
pub mod scoring;
pub mod tokenize;

use analytics_db::AnalyticsDb;
use cli::{Cli, Command};
use content::ContentStore;
use data_dir::DataDir;
use engine::{AnswerEngine, AnswerResult, AnswerStatus};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("FAQMATCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Ask(args) => {
            let faq_dir = data_dir::resolve_faq_dir(cli.faq_dir.as_deref())?;
            let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
            cmd_ask(&faq_dir, &data_dir, &args)?;
        }
        Command::List(args) => {
            let faq_dir = data_dir::resolve_faq_dir(cli.faq_dir.as_deref())?;
            cmd_list(&faq_dir, args.json)?;
        }
        Command::Stats(args) => {
            let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
            cmd_stats(&data_dir, &args)?;
        }
        Command::Mcp(args) => {
            let faq_dir = data_dir::resolve_faq_dir(cli.faq_dir.as_deref())?;
            let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
            mcp::run_mcp(&faq_dir, data_dir, args.threshold)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

fn cmd_ask(
    faq_dir: &std::path::Path,
    data_dir: &DataDir,
    args: &cli::AskArgs,
) -> error::Result<()> {
    let store = Arc::new(ContentStore::open(faq_dir)?);
    let engine = AnswerEngine::with_threshold(store, args.threshold);

    let result = engine.answer(&args.query);

    let analytics = AnalyticsDb::open(&data_dir.analytics_db())?;
    if let Err(e) = analytics.log_interaction(&result.record(&args.query)) {
        tracing::warn!(error = %e, "failed to log interaction");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_answer_human(&result);
    }
    Ok(())
}

fn print_answer_human(result: &AnswerResult) {
    match result.status {
        AnswerStatus::Success => {
            if let Some(answer) = &result.answer {
                println!("{answer}");
            }
            println!();
            println!(
                "source: {}  score: {:.2}",
                result.source_file.as_deref().unwrap_or("?"),
                result.score
            );
            println!("reasoning: {}", result.reasoning);
        }
        AnswerStatus::NoAnswer => {
            println!(
                "I cannot answer this question based on the available FAQ content. \
                 Please contact customer support for assistance."
            );
            println!();
            println!("reasoning: {}", result.reasoning);
        }
        AnswerStatus::Error => {
            eprintln!("Error: {}", result.reasoning);
        }
    }
}

fn cmd_list(faq_dir: &std::path::Path, json: bool) -> error::Result<()> {
    let store = ContentStore::open(faq_dir)?;
    let snapshot = store.snapshot();

    if json {
        let files: Vec<serde_json::Value> = snapshot
            .files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "filename": f.filename,
                    "category": f.category,
                    "qaCount": f.entries.len(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "totalFiles": snapshot.files.len(),
            "totalQaPairs": snapshot.total_entries(),
            "files": files,
        });
        println!("{}", serde_json::to_string(&out)?);
    } else {
        for f in &snapshot.files {
            println!("{}\t{}\t{} pairs", f.filename, f.category, f.entries.len());
        }
        println!(
            "\n{} file(s), {} Q&A pair(s)",
            snapshot.files.len(),
            snapshot.total_entries()
        );
    }
    Ok(())
}

fn cmd_stats(data_dir: &DataDir, args: &cli::StatsArgs) -> error::Result<()> {
    let analytics = AnalyticsDb::open(&data_dir.analytics_db())?;
    let summary = analytics.summary()?;
    let file_stats = analytics.file_stats()?;
    let recent = analytics.recent(args.recent)?;

    if args.json {
        let out = serde_json::json!({
            "summary": summary,
            "fileStats": file_stats,
            "recent": recent,
        });
        println!("{}", serde_json::to_string(&out)?);
        return Ok(());
    }

    println!("Interactions: {}", summary.total_interactions);
    println!(
        "  success: {}  no_answer: {}  error: {}",
        summary.successful, summary.no_answer, summary.errors
    );
    println!("Success rate: {:.1}%", summary.success_rate);

    if !file_stats.is_empty() {
        println!("\nPer-file hits:");
        for s in &file_stats {
            println!(
                "  {}: {} total, {} answered",
                s.filename, s.total_queries, s.successful_queries
            );
        }
    }

    if !recent.is_empty() {
        println!("\nRecent queries:");
        for r in &recent {
            println!("  [{}] {}", r.status, r.query_text);
        }
    }
    Ok(())
}
