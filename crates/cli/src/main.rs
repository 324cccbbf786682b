//! DRHP Compliance Review CLI
//!
//! Searches the managed DRHP index for excerpts relevant to a query and streams
//! a compliance analysis of them from a language model.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Input;
use drhp::{is_exit_command, TerminalRenderer};
use drhp_core::Config;
use drhp_review::{ReviewPipeline, EMPTY_QUERY_NOTICE};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drhp")]
#[command(about = "DRHP compliance analyzer (AutoRAG + Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show the outgoing search request and raw response
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single review and exit
    Ask {
        /// Query or topic to review
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Prompt for queries until exit (default)
    Interactive,
    /// Print the resolved configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Commands::Config) => {
            println!("{config:#?}");
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { query }) => ask(&config, &query.join(" "), cli.debug).await,
        Some(Commands::Interactive) | None => {
            interactive(&config, cli.debug).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize logging system
///
/// Logs go to stderr so stdout carries only the review itself.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,drhp={level},drhp_core={level},drhp_retrieval={level},drhp_analysis={level},drhp_review={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<ReviewPipeline> {
    config.validate().context("Invalid configuration")?;
    ReviewPipeline::from_config(config).context("Failed to create review clients")
}

/// Run one review, returning a failure exit code on remote errors
async fn ask(config: &Config, query: &str, show_trace: bool) -> Result<ExitCode> {
    let pipeline = build_pipeline(config)?;
    let mut renderer = TerminalRenderer::new(io::stdout(), show_trace);

    let code = match pipeline.run_observed(query, &mut renderer).await {
        Ok(outcome) => {
            renderer.render_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            renderer.render_error(&e);
            ExitCode::FAILURE
        }
    };

    renderer.finish().context("Failed to write output")?;
    Ok(code)
}

/// Prompt loop; errors are shown and the loop continues
async fn interactive(config: &Config, show_trace: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    info!("Interactive session started");
    println!("DRHP Compliance Analyzer (AutoRAG + Gemini AI)");
    println!("Type 'exit' or 'quit' to leave.\n");

    loop {
        let line = match Input::<String>::new()
            .with_prompt("Enter your DRHP-related query or topic")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                debug!("Input closed: {e}");
                break;
            }
        };

        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            println!("{EMPTY_QUERY_NOTICE}");
            continue;
        }

        let mut renderer = TerminalRenderer::new(io::stdout(), show_trace);
        match pipeline.run_observed(&line, &mut renderer).await {
            Ok(outcome) => renderer.render_outcome(&outcome),
            Err(e) => renderer.render_error(&e),
        }
        renderer.finish().context("Failed to write output")?;
        println!();
    }

    info!("Interactive session ended");
    Ok(())
}
