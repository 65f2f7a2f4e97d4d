//! # Kanoon Main Driver
//!
//! ## Purpose
//! Command-line entry point for the legal question-answering assistant.
//! Provides corpus ingestion, vector index building, and interactive
//! question answering over the stored corpus.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file, command line arguments, environment variables
//! - **Output**: Ingestion statistics, index build reports, composed answers
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Apply environment overrides and initialize logging
//! 3. Dispatch to the requested subcommand

use clap::{Arg, ArgMatches, Command};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kanoon_search::{
    config::Config,
    errors::{KanoonError, Result},
    ingestion::IngestionPipeline,
    store::DocumentStore,
    vector::{self, FastEmbedder},
    LegalAssistant,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("error [{}]: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = Command::new("kanoon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Legal question answering over an Indian-law corpus")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .subcommand(
            Command::new("ingest").about("Load JSON corpus files into the document store"),
        )
        .subcommand(
            Command::new("build-index")
                .about("Embed the stored corpus and write the vector index"),
        )
        .subcommand(
            Command::new("ask")
                .about("Answer a legal question against the stored corpus")
                .arg(
                    Arg::new("question")
                        .value_name("QUESTION")
                        .help("The question to answer")
                        .required(true),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .ok_or_else(|| KanoonError::Config {
            message: "missing config argument".to_string(),
        })?;
    let config = Config::from_file(config_path)?;

    init_logging(&config);
    info!("Configuration loaded from: {}", config_path);

    match matches.subcommand() {
        Some(("ingest", _)) => run_ingest(&config),
        Some(("build-index", _)) => run_build_index(&config),
        Some(("ask", sub)) => run_ask(&config, sub),
        _ => unreachable!("subcommand_required"),
    }
}

/// Initialize logging and tracing
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_ingest(config: &Config) -> Result<()> {
    let store = Arc::new(DocumentStore::open(&config.storage)?);
    let pipeline = IngestionPipeline::new(store, config.ingestion.data_dir.clone());
    let stats = pipeline.run()?;
    println!(
        "Ingested {} documents from {} file(s) ({} skipped)",
        stats.documents_inserted, stats.files_loaded, stats.files_skipped
    );
    Ok(())
}

fn run_build_index(config: &Config) -> Result<()> {
    let store = DocumentStore::open(&config.storage)?;
    let embedder = FastEmbedder::new(config.embedding.clone());
    let count = vector::build_index(
        &store,
        &embedder,
        &config.embedding.index_path,
        config.embedding.batch_size,
    )?;
    println!(
        "Embedded {} documents into {}",
        count,
        config.embedding.index_path.display()
    );
    Ok(())
}

fn run_ask(config: &Config, sub: &ArgMatches) -> Result<()> {
    let question = sub
        .get_one::<String>("question")
        .ok_or_else(|| KanoonError::Config {
            message: "missing question argument".to_string(),
        })?;

    let assistant = LegalAssistant::open(config.clone())?;
    println!("{}", assistant.ask(question));
    Ok(())
}
