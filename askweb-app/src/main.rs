use anyhow::{Context, Result};
use askweb_common::observability::{LogConfig, init_logging};
use askweb_common::{PromptStyle, Query};
use askweb_config::{Preferences, PreferencesLoader};
use askweb_tui::{Session, TuiApp};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiring::{build_workflow, check};
mod wiring;

#[derive(Parser, Debug)]
#[command(name = "askweb", version)]
#[command(about = "Ask a local Ollama model, optionally grounded with web search", long_about = None)]
struct Cli {
    /// Question to pre-fill (answered directly with --print)
    query: Option<String>,

    /// Start with web search turned off
    #[arg(long)]
    no_web: bool,

    /// Answer once on stdout instead of opening the terminal UI
    #[arg(long)]
    print: bool,

    /// With --print, also print the web context fed to the model
    #[arg(long, requires = "print")]
    show_context: bool,

    /// Preferences file (default: ~/.config/askweb/askweb.yaml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the Ollama model
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Override the Ollama base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Prompt layout: plain or cited
    #[arg(long, value_name = "STYLE")]
    style: Option<PromptStyle>,

    /// Mirror logs to stderr (not used by the terminal UI)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that Ollama is reachable and list installed models
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Preferences: file, then ASKWEB_* env, then CLI flags.
    let prefs = load_preferences(&cli)?;

    // 2) Logging as configured; the UI owns the terminal so stderr stays quiet there.
    let interactive = cli.command.is_none() && !cli.print;
    let log_path = init_logging(LogConfig {
        app_name: "askweb",
        log_dir: prefs.logging.dir.clone(),
        emit_stderr: cli.verbose && !interactive,
        format: prefs.logging.format,
        default_filter: prefs.logging.filter.clone(),
    })?;
    tracing::info!(log = %log_path.display(), "askweb starting");

    match cli.command {
        Some(Commands::Check) => check(&prefs).await,
        None if cli.print => print_answer(&cli, &prefs).await,
        None => run_tui(&cli, &prefs).await,
    }
}

fn load_preferences(cli: &Cli) -> Result<Preferences> {
    let loader = match &cli.config {
        Some(path) => PreferencesLoader::new().with_file(path),
        None => PreferencesLoader::new().with_default_file(),
    };
    let mut prefs = loader
        .with_override("ollama_model", cli.model.as_deref())
        .with_override("ollama_base_url", cli.base_url.as_deref())
        .load()
        .context("failed to load preferences")?;

    if let Some(style) = cli.style {
        prefs.prompt_style = style;
    }
    if cli.no_web {
        prefs.use_web_search = false;
    }
    Ok(prefs)
}

async fn print_answer(cli: &Cli, prefs: &Preferences) -> Result<()> {
    let query = Query::parse(cli.query.as_deref().unwrap_or_default())?;
    let workflow = build_workflow(prefs)?;

    let outcome = workflow
        .answer(&query, prefs.use_web_search)
        .await
        .context("Failed")?;

    if cli.show_context && !outcome.context.is_empty() {
        println!("{}\n", outcome.context);
    }
    println!("{}", outcome.answer);
    Ok(())
}

async fn run_tui(cli: &Cli, prefs: &Preferences) -> Result<()> {
    let workflow = Arc::new(build_workflow(prefs)?);
    let session = Session::new(cli.query.as_deref(), prefs.use_web_search);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    TuiApp::new(session, workflow, shutdown)?.run().await?;
    tracing::info!("askweb exiting");
    Ok(())
}
