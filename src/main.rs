//! CogniDB command-line interface.
//!
//! ```bash
//! # One question, human-readable output
//! cognidb --backend postgres --database shop "top 5 customers by revenue"
//!
//! # Raw JSON envelope
//! cognidb --json "how many orders shipped yesterday"
//!
//! # Interactive session
//! cognidb
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sqlformat::{FormatOptions, QueryParams};
use tracing_subscriber::EnvFilter;

use cognidb::services::database::{QueryLanguage, QueryResult, Row};
use cognidb::services::{ClarificationHandler, StdinPrompter};
use cognidb::utils::sanitize_input;
use cognidb::{CogniDb, CogniDbConfig, ConfigOverrides, QueryEnvelope};

/// Ask your database questions in plain language
#[derive(Parser, Debug)]
#[command(name = "cognidb", version, about)]
struct Args {
    /// Backend: mysql, postgres, sqlite, mongodb or rocksdb
    #[arg(short = 'b', long, env = "DB_TYPE")]
    backend: Option<String>,

    /// Server hostname
    #[arg(short = 'H', long, env = "HOST")]
    host: Option<String>,

    /// Server port (defaults to the backend's standard port)
    #[arg(short = 'p', long, env = "PORT")]
    port: Option<u16>,

    /// Database name, or file path for sqlite/rocksdb
    #[arg(short = 'd', long, env = "DATABASE")]
    database: Option<String>,

    /// Username
    #[arg(short = 'U', long, env = "USER")]
    user: Option<String>,

    /// Password
    #[arg(short = 'W', long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// SSL mode: disable, prefer or require
    #[arg(long, env = "DB_SSL_MODE")]
    ssl_mode: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion model
    #[arg(long, env = "COGNIDB_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Print the raw JSON envelope
    #[arg(long)]
    json: bool,

    /// Ask a single question and exit; starts an interactive session otherwise
    question: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.clone(),
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            ssl_mode: self.ssl_mode.clone(),
        }
    }
}

fn main() -> ExitCode {
    init_logging();

    match smol::block_on(run(Args::parse())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = CogniDbConfig::from_env(args.overrides())?;
    let db = CogniDb::connect(&config)
        .await
        .with_context(|| format!("Failed to start {} session", config.backend.display_name()))?;
    let mut clarifier = ClarificationHandler::new(StdinPrompter);

    match &args.question {
        Some(question) => {
            let envelope = ask(&db, &mut clarifier, question).await;
            print_envelope(&db, &envelope, args.json)?;
        }
        None => repl(&db, &mut clarifier, args.json).await?,
    }

    db.close().await?;
    Ok(())
}

async fn ask(
    db: &CogniDb,
    clarifier: &mut ClarificationHandler<StdinPrompter>,
    question: &str,
) -> QueryEnvelope {
    let question = sanitize_input(question);
    db.query_with_clarification(&question, clarifier).await
}

async fn repl(
    db: &CogniDb,
    clarifier: &mut ClarificationHandler<StdinPrompter>,
    json: bool,
) -> Result<()> {
    println!(
        "Connected to {} ({} tables). Type a question, or `exit` to quit.",
        db.backend().display_name(),
        db.schema().len()
    );

    let stdin = io::stdin();
    loop {
        print!("cognidb> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        match question {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        let envelope = ask(db, clarifier, question).await;
        print_envelope(db, &envelope, json)?;
    }
    Ok(())
}

fn print_envelope(db: &CogniDb, envelope: &QueryEnvelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
        return Ok(());
    }

    if let Some(error) = &envelope.error {
        println!("Query failed: {error}");
        return Ok(());
    }
    if let Some(query) = &envelope.sql_query {
        match db.backend().query_language() {
            QueryLanguage::Sql(_) => {
                let formatted =
                    sqlformat::format(query, &QueryParams::None, &FormatOptions::default());
                println!("{formatted}\n");
            }
            QueryLanguage::Operation => println!("{query}\n"),
        }
    }
    if let Some(results) = &envelope.results {
        print_results(results)?;
    }
    Ok(())
}

fn print_results(results: &QueryResult) -> Result<()> {
    match results {
        QueryResult::Rows(rows) => print_rows(rows),
        QueryResult::RowSets(sets) if sets.is_empty() => println!("OK"),
        QueryResult::RowSets(sets) => {
            for (index, rows) in sets.iter().enumerate() {
                println!("-- result set {}", index + 1);
                print_rows(rows);
            }
        }
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        println!("{}", row.to_display_string());
    }
    println!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" });
}
