use data_cadet::config::CadetConfig;
use data_cadet::db::{ingest_csv_directory, SchemaProvider, SqliteExecutor, SqliteSchemaProvider};
use data_cadet::llm::LlmClient;
use data_cadet::{PipelineAnswer, PipelineController};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "data-cadet")]
#[command(about = "Ask questions about your tabular data in plain English")]
#[command(version)]
struct Args {
    /// SQLite database file (or set CADET_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every CSV file in a directory into the database
    Ingest {
        /// Directory holding the CSV files (or set CADET_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Drop all existing tables before loading
        #[arg(long)]
        reset: bool,
    },
    /// Print the schema description the generator sees
    Schema,
    /// Answer a single question and print the result as JSON
    Ask {
        /// The question in natural language
        question: String,
    },
    /// Interactive question loop
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (default_db, default_data_dir) = CadetConfig::storage_from_env();
    let db_path = args.db.unwrap_or(default_db);

    match args.command {
        Commands::Ingest { data_dir, reset } => {
            let data_dir = data_dir.unwrap_or(default_data_dir);
            run_ingest(db_path, data_dir, reset).await
        }
        Commands::Schema => {
            let schema = SqliteSchemaProvider::new(&db_path).describe_schema().await?;
            println!("{}", schema);
            Ok(())
        }
        Commands::Ask { question } => {
            let controller = build_controller(db_path, false)?;
            let answer = controller.answer(&question).await;
            println!("{}", serde_json::to_string_pretty(&answer)?);
            Ok(())
        }
        Commands::Chat => run_chat(db_path).await,
    }
}

async fn run_ingest(db_path: PathBuf, data_dir: PathBuf, reset: bool) -> Result<()> {
    info!("Ingesting {:?} into {:?}", data_dir, db_path);
    let tables = tokio::task::spawn_blocking(move || ingest_csv_directory(&db_path, &data_dir, reset)).await??;

    if tables.is_empty() {
        println!("No CSV files loaded.");
    } else {
        println!("Loaded {} table(s):", tables.len());
        for table in &tables {
            println!("  {} ({} rows)", table.name, table.rows);
        }
    }
    Ok(())
}

/// Fails before any question is asked when the API key is missing.
fn build_controller(db_path: PathBuf, show_progress: bool) -> Result<PipelineController> {
    let mut config = CadetConfig::from_env()?;
    config.db_path = db_path;
    let llm = LlmClient::new(config.llm.clone());
    let executor = SqliteExecutor::new(&config.db_path);
    info!("Using model {} against {:?}", llm.model(), executor.db_path());

    let controller = PipelineController::new(
        Arc::new(llm),
        Arc::new(executor),
        Arc::new(SqliteSchemaProvider::new(&config.db_path)),
    );

    Ok(if show_progress {
        controller.with_observer(|stage| eprintln!("  {}", stage.status_label()))
    } else {
        controller
    })
}

fn print_answer(answer: &PipelineAnswer) {
    println!("\n{}\n", answer.final_answer);
    if !answer.sql_query.is_empty() {
        println!("SQL: {}", answer.sql_query);
    }
    if let Some(spec) = &answer.visualization_spec {
        println!("Chart: {}", spec);
    }
}

async fn run_chat(db_path: PathBuf) -> Result<()> {
    let controller = build_controller(db_path, true)?;

    println!("{}", "=".repeat(60));
    println!(" Data Cadet - ask a question about your data ('exit' to quit)");
    println!("{}", "=".repeat(60));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = controller.answer(question).await;
        print_answer(&answer);
    }

    Ok(())
}
