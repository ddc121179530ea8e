use std::{io::IsTerminal, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs, io::AsyncReadExt};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use elisum_core::{
    ClientConfig, HttpFetcher, Orchestrator, PageContext, PageKind, RelayClient, SummaryState,
    config::{RELAY_URL_ENV, TIMEOUT_ENV, parse_timeout_secs},
    format_interaction_readable,
};

#[derive(Parser)]
#[command(name = "elisum")]
#[command(about = "Summarize a YouTube transcript, a Wikipedia article or a text selection")]
struct Cli {
    /// Page URL. YouTube and English Wikipedia pages are extracted, anything else uses the selection
    url: Option<String>,

    /// Selected text to summarize. Read from stdin when piped and no URL is given.
    #[arg(short, long)]
    text: Option<String>,

    /// Rendered HTML of the page, used instead of fetching it (articles only)
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Summarization relay endpoint
    #[arg(long, env = RELAY_URL_ENV)]
    relay_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, env = TIMEOUT_ENV)]
    timeout: Option<String>,

    /// Print the whole interaction as JSON
    #[arg(long)]
    json: bool,

    /// Link transcript timestamps to the matching point in the video
    #[arg(short, long)]
    links: bool,
}

/// Steady spinner for the extract-and-summarize step. Hidden when stdout carries JSON.
fn step_progress(kind: PageKind, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner()
        .with_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")?
                .tick_strings(&["◐", "◓", "◑", "◒", "●"]),
        )
        .with_message(format!("{}...", kind.action_label()));
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.relay_url {
        config.relay_url = url.clone();
    }
    if let Some(raw) = &cli.timeout {
        config.timeout = Some(parse_timeout_secs(TIMEOUT_ENV, raw)?);
    }
    Ok(config)
}

async fn page_context(cli: &Cli) -> Result<PageContext> {
    let html = match &cli.html_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let selection = match &cli.text {
        Some(text) => Some(text.clone()),
        None if cli.url.is_none() && !std::io::stdin().is_terminal() => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read selection from stdin")?;
            Some(buf)
        }
        None => None,
    };

    Ok(PageContext {
        url: cli.url.clone(),
        html,
        selection,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("elisum=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = client_config(&cli)?;
    let client = config.http_client()?;
    let orchestrator = Orchestrator::standard(
        HttpFetcher::new(client.clone()),
        RelayClient::new(client, config.relay_url.clone()),
    )?;

    let page = page_context(&cli).await?;
    let kind = page.kind();

    if !cli.json {
        println!(
            "\n{}  {}\n",
            style("elisum").cyan().bold(),
            style(kind.action_label()).dim()
        );
    }

    debug!(
        %kind,
        relay = %config.relay_url,
        timeout = ?config.timeout,
        has_html = page.html.is_some(),
        "starting interaction"
    );

    let spinner = step_progress(kind, cli.json)?;
    let interaction = match orchestrator.run(&page).await {
        Ok(interaction) => interaction,
        Err(e) => {
            spinner.finish_and_clear();
            debug!(%kind, error = ?e, "extraction failed");
            eprintln!("{} {}", style("Parsing failed:").red().bold(), e);
            std::process::exit(1);
        }
    };

    match &interaction.summary {
        SummaryState::Ready(_) => spinner.finish_with_message(format!(
            "{} Summarized {} text",
            style("✓").green().bold(),
            kind
        )),
        SummaryState::Skipped => spinner.finish_with_message(format!(
            "{} Nothing to summarize {}",
            style("!").yellow().bold(),
            style("(empty text)").dim()
        )),
        SummaryState::Failed(e) => spinner.finish_with_message(format!(
            "{} Summary unavailable: {}",
            style("!").yellow().bold(),
            style(e).dim()
        )),
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&interaction)?);
    } else {
        let links = if cli.links { page.url.as_deref() } else { None };
        println!("\n{}", format_interaction_readable(&interaction, links));
    }

    Ok(())
}
