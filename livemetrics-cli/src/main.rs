mod cli;
mod config;
mod error;
mod output;

use std::io::IsTerminal;
use std::process;
use std::sync::Arc;

use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use live_metrics::{
    DisplayTarget, HttpStatusSource, MemoryBoard, MetricsPoller, PollEvent, TickOutcome,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, Commands, OutputFormat},
    config::AppConfig,
    error::{AppError, Result},
    output::OutputManager,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);

    match args.command {
        Commands::Config { show } => {
            if show {
                println!("{}", config.show()?);
            } else {
                println!("Use --show to display the effective configuration");
            }
        }
        Commands::Once { output } => {
            let dashboard = Dashboard::new(&config)?;
            let outcome = dashboard.poller.refresh_metrics().await;
            if let TickOutcome::Failed { .. } = outcome {
                return Err(AppError::RefreshFailed);
            }
            dashboard.print(output)?;
        }
        Commands::Watch { output } => {
            let dashboard = Dashboard::new(&config)?;
            dashboard.watch(output).await?;
        }
    }

    Ok(())
}

struct Dashboard {
    board: Arc<MemoryBoard>,
    poller: Arc<MetricsPoller>,
    hidden: Vec<DisplayTarget>,
    output: OutputManager,
}

impl Dashboard {
    fn new(config: &AppConfig) -> Result<Self> {
        let poller_config = config.to_poller_config()?;
        let hidden = config.hidden_targets()?;

        let source = HttpStatusSource::new(&config.base_url, &poller_config)?;
        let board = Arc::new(MemoryBoard::with_targets(
            DisplayTarget::ALL
                .into_iter()
                .filter(|target| !hidden.contains(target)),
        ));
        let poller = Arc::new(MetricsPoller::new(
            Arc::new(source),
            board.clone(),
            poller_config,
        )?);

        Ok(Self {
            board,
            poller,
            hidden,
            output: OutputManager::new(std::io::stdout().is_terminal()),
        })
    }

    fn print(&self, format: OutputFormat) -> Result<()> {
        let text = self
            .output
            .format_cards(&self.board.snapshot(), &self.hidden, format)?;
        println!("{}", text.trim_end());
        Ok(())
    }

    async fn watch(&self, format: OutputFormat) -> Result<()> {
        let mut events = self.poller.events().subscribe();
        let handle = self.poller.clone().start();

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Received Ctrl-C, stopping");
                    break;
                }
                event = events.recv() => match event {
                    Ok(PollEvent::Rendered { .. }) => self.print(format)?,
                    Ok(event) => debug!("{}", event.description()),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Fell behind on poller events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        handle.stop().await;
        let stats = self.poller.stats();
        info!(
            ticks = stats.ticks_started,
            rendered = stats.rendered,
            failed = stats.failed,
            no_status = stats.no_status,
            stale = stats.stale,
            "Poller stopped"
        );
        Ok(())
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
    Ok(())
}
