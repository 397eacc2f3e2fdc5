//! llm-panel - ask a panel of LLMs and let a judge synthesize the answer

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_panel::config::Config;
use llm_panel::llm::Panel;
use llm_panel::progress::SpinnerProgress;
use llm_panel::report::Report;
use llm_panel::session::{install_signal_handler, spawn_stdin_reader, Session, SessionEnd};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ask a single question and exit instead of starting a session
    #[arg(short, long)]
    query: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Always consult the whole panel, even for simple questions
    #[arg(long, default_value_t = false)]
    full: bool,

    /// Do not show the progress spinner
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Print plain, uncolored output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Keys may live in a .env file; real environment variables take precedence
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => tracing::warn!(error = %e, "could not read .env"),
    }

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    let credentials = config
        .resolve_credentials()
        .context("missing provider credentials")?;
    let panel = Panel::new(&config, &credentials)
        .context("failed to set up providers")?
        .always_full(args.full);

    let interactive = atty::is(atty::Stream::Stdout);
    let progress = SpinnerProgress::for_terminal(config.ui.show_progress && !args.no_progress);
    let report = Report::new(config.ui.color && !args.no_color && interactive);
    let shutdown = install_signal_handler();

    let session = Session::new(
        &panel,
        &*progress,
        report,
        config.ui.prompt.clone(),
        shutdown.clone(),
    );
    let mut stdout = std::io::stdout();

    match args.query {
        Some(query) => {
            let query = query.trim();
            if query.is_empty() {
                anyhow::bail!("--query must not be empty");
            }
            session.answer(query, &mut stdout).await?;
        }
        None => {
            let end = session.run(spawn_stdin_reader(), &mut stdout).await?;
            tracing::debug!(?end, "session ended");
            if end == SessionEnd::Interrupted {
                tracing::info!("interrupted by signal");
            }
        }
    }

    shutdown.cancel();
    Ok(())
}
