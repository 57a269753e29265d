// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use paper_rag::utils::logging::{format_error, format_info, format_step, format_success, format_warning};
use paper_rag::{
    Config, EmbeddingClient, EvaluationSession, FeedbackReport, HealthCheck, HealthReport,
    IngestionJob, JsonExporter, LanceDbClient, QueryResult, SchemaManager, Validator,
    embedding::provider_from_config, generation::model_from_config,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const ABSTRACT_PREVIEW_CHARS: usize = 300;

#[derive(Parser)]
#[command(name = "paper_rag")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Similar-paper retrieval and AI feedback using LanceDB", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and store every paper in the papers directory
    Ingest {
        #[arg(long, value_name = "DIR")]
        papers_dir: Option<PathBuf>,
    },

    /// Number of stored papers
    Count,

    /// Nearest stored papers for a query or a draft file
    Search {
        /// Query text
        query: Option<String>,

        #[arg(short, long, value_name = "FILE", conflicts_with = "query")]
        file: Option<PathBuf>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Summarize the nearest papers and generate feedback for a draft
    Evaluate {
        /// Plain-text draft to evaluate
        input: PathBuf,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Check store connectivity and provider credentials
    Verify,

    /// Delete one stored paper by id
    Remove { id: String },

    /// Drop the papers table
    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    paper_rag::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Paper RAG");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using environment and defaults",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Ingest { papers_dir } => {
            cmd_ingest(config, papers_dir, cli.color).await?;
        }
        Commands::Count => {
            cmd_count(&config).await?;
        }
        Commands::Search { query, file, limit } => {
            cmd_search(&config, query, file, limit).await?;
        }
        Commands::Evaluate {
            input,
            output,
            pretty,
        } => {
            cmd_evaluate(&config, &input, output, pretty).await?;
        }
        Commands::Verify => {
            cmd_verify(&config).await?;
        }
        Commands::Remove { id } => {
            cmd_remove(&config, &id).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(&config, confirm).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<LanceDbClient> {
    let client = LanceDbClient::new(config.store.clone())
        .await
        .context("Failed to open LanceDB store")?;

    if !client.ping().await? {
        error!("Cannot connect to LanceDB");
        return Err(anyhow::anyhow!("Store connection failed"));
    }

    Ok(client)
}

async fn cmd_ingest(mut config: Config, papers_dir: Option<PathBuf>, color: bool) -> Result<()> {
    if let Some(dir) = papers_dir {
        config.ingest.papers_dir = dir;
    }
    info!("Ingesting papers from {}", config.ingest.papers_dir.display());

    let client = open_store(&config).await?;
    let embedder =
        Arc::new(EmbeddingClient::from_config(&config).context("Failed to set up embeddings")?);

    let job = IngestionJob::new(config, client, embedder).with_progress(color);
    let stats = job.run().await.context("Ingestion failed")?;

    stats.print_summary();
    if stats.files_failed > 0 {
        println!(
            "{}",
            format_warning(&format!("{} files failed; see the log for details", stats.files_failed))
        );
    }

    Ok(())
}

async fn cmd_count(config: &Config) -> Result<()> {
    let client = open_store(config).await?;
    let count = client.count().await;
    println!("{}", format_info(&format!("Stored papers: {}", count)));
    Ok(())
}

async fn cmd_search(
    config: &Config,
    query: Option<String>,
    file: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<()> {
    let text = match (query, file) {
        (Some(query), _) => query,
        (None, Some(path)) => read_input(&path)?,
        (None, None) => return Err(anyhow::anyhow!("Provide a query or --file")),
    };
    Validator::validate_content_not_empty(&text)?;

    let client = open_store(config).await?;
    let embedder = EmbeddingClient::from_config(config).context("Failed to set up embeddings")?;

    let top_n = limit.unwrap_or(config.retrieval.top_n);
    let embedding = embedder.embed(&text).await.context("Failed to embed query")?;
    let results = client
        .query(&embedding, top_n)
        .await
        .context("Vector search failed")?;

    if results.is_empty() {
        println!("\nNo stored papers found.\n");
        println!("Try:");
        println!("  - Running `paper_rag ingest` first");
        println!("  - Checking store.uri and store.table_name");
        return Ok(());
    }

    print_similar(&results);
    Ok(())
}

async fn cmd_evaluate(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let user_text = read_input(input)?;

    let mut session = EvaluationSession::from_config(config)
        .await
        .context("Failed to start evaluation session")?;

    println!("{}", format_step(1, 2, "Retrieving and summarizing similar papers"));
    let report = session
        .evaluate(&user_text)
        .await
        .context("Evaluation failed")?;

    println!("{}", format_step(2, 2, "Feedback ready"));
    print_report(&report);

    if let Some(dir) = output {
        let exporter = JsonExporter::new(dir)?;
        let path = exporter.export_report(&report, pretty)?;
        println!(
            "{}",
            format_success(&format!("Report written to {}", path.display()))
        );
    }

    info!(
        "Evaluation {} finished in {:.2}s with {} generative requests",
        session.session_id(),
        start_time.elapsed().as_secs_f64(),
        session.orchestrator().requests_sent()
    );
    Ok(())
}

async fn cmd_verify(config: &Config) -> Result<()> {
    let mut checks = Vec::new();

    let started = Instant::now();
    match LanceDbClient::new(config.store.clone()).await {
        Ok(client) => match client.ping().await {
            Ok(_) => {
                checks.push(HealthCheck::healthy(
                    "store",
                    Some(config.store.uri.clone()),
                    started.elapsed(),
                ));

                let started = Instant::now();
                let check = match SchemaManager::new(&client).verify_schema().await {
                    Ok(true) => HealthCheck::healthy(
                        "papers table",
                        Some(format!("{} papers", client.count().await)),
                        started.elapsed(),
                    ),
                    Ok(false) => HealthCheck::degraded(
                        "papers table",
                        "Table not created yet; run `ingest`".to_string(),
                        started.elapsed(),
                    ),
                    Err(e) => {
                        HealthCheck::unhealthy("papers table", e.to_string(), started.elapsed())
                    }
                };
                checks.push(check);
            }
            Err(e) => checks.push(HealthCheck::unhealthy("store", e.to_string(), started.elapsed())),
        },
        Err(e) => checks.push(HealthCheck::unhealthy("store", e.to_string(), started.elapsed())),
    }

    let started = Instant::now();
    checks.push(match provider_from_config(&config.embedding) {
        Ok(provider) => HealthCheck::healthy(
            "embedding",
            Some(format!("{} ({})", provider.name(), config.embedding.model)),
            started.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("embedding", e.to_string(), started.elapsed()),
    });

    let started = Instant::now();
    checks.push(match model_from_config(&config.generation) {
        Ok(model) => HealthCheck::healthy(
            "generation",
            Some(format!("{} ({})", model.name(), config.generation.model)),
            started.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("generation", e.to_string(), started.elapsed()),
    });

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION"));
    println!("{}", report.format());

    if !report.is_healthy() {
        return Err(anyhow::anyhow!("Verification failed"));
    }
    Ok(())
}

async fn cmd_remove(config: &Config, id: &str) -> Result<()> {
    let client = open_store(config).await?;
    client
        .remove(id)
        .await
        .with_context(|| format!("Failed to remove paper {}", id))?;
    println!("{}", format_success(&format!("Removed paper {}", id)));
    Ok(())
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_error("This will delete all stored papers. Use --confirm to proceed")
        );
        return Ok(());
    }

    warn!("Resetting store - all papers will be lost");

    let client = open_store(config).await?;
    SchemaManager::new(&client)
        .drop_all_tables()
        .await
        .context("Failed to drop tables")?;

    println!("{}", format_success("Store reset complete"));
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    Validator::validate_input_file(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Validator::validate_content_not_empty(&text)?;
    Ok(text)
}

fn print_similar(results: &QueryResult) {
    println!("\n{}", "Similar papers".bold());
    println!("{}", "=".repeat(80));

    for (idx, paper) in results.iter().enumerate() {
        println!("\n{}", paper.format_summary(idx + 1, ABSTRACT_PREVIEW_CHARS));
    }

    println!("\n{}", "=".repeat(80));
}

fn print_report(report: &FeedbackReport) {
    let results = QueryResult::new(report.similar_papers.clone());
    print_similar(&results);

    println!("\n{}", "Summaries".bold());
    for summary in &report.summaries {
        println!("\n{} {}", "▸".cyan(), summary.title.bold());
        println!("{}", summary.summary.trim());
    }

    for failure in &report.failures {
        println!(
            "\n{}",
            format_warning(&format!("No summary for {}: {}", failure.title, failure.error))
        );
    }

    println!("\n{}", "Feedback".bold());
    println!("{}", "=".repeat(80));
    println!("{}", report.feedback.trim());
    println!("{}", "=".repeat(80));
}
