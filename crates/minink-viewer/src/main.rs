/*
[INPUT]:  CLI arguments, optional YAML configuration file, host history, OS shutdown signals
[OUTPUT]: Live log viewer in TUI or plain tail mode with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{Subscriber, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use minink_client::TimeRange;
use minink_viewer::filter::parse_time_bound;
use minink_viewer::history::HostHistory;
use minink_viewer::tail::{TailExit, follow};
use minink_viewer::tui::{LOG_BUFFER_CAPACITY, LogBuffer, LogWriterFactory, TuiOptions, run_tui};
use minink_viewer::{
    FilterState, LiveSessionManager, LogView, NetworkTransport, PlainSink, ViewerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "minink-viewer", version, about = "Live log viewer for minink agents")]
struct Cli {
    /// Agent base URL; repeat or separate with commas
    #[arg(long = "host", value_name = "URL", value_delimiter = ',')]
    hosts: Vec<String>,
    /// Comma separated service names
    #[arg(long, value_name = "CSV")]
    services: Option<String>,
    #[arg(long = "keywords", value_name = "TEXT")]
    message_keywords: Option<String>,
    /// Backlog lower bound (RFC 3339)
    #[arg(long, value_name = "TIME", value_parser = parse_time_bound)]
    since: Option<i64>,
    /// Backlog upper bound (RFC 3339)
    #[arg(long, value_name = "TIME", value_parser = parse_time_bound)]
    until: Option<i64>,
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "no-autoscroll")]
    no_autoscroll: bool,
    /// Neither read nor write the saved host list
    #[arg(long = "no-history")]
    no_history: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print entries as plain lines to stdout
    Tail,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Tui);

    let log_buffer = LogBuffer::handle(LOG_BUFFER_CAPACITY);
    let _log_guard = init_tracing(&args, command, LogWriterFactory::new(log_buffer.clone()))?;

    let config = match &args.config_path {
        Some(path) => ViewerConfig::from_file(path).context("load config")?,
        None => ViewerConfig::default(),
    };
    let history = if args.no_history {
        None
    } else {
        match HostHistory::default_location() {
            Ok(history) => Some(history),
            Err(err) => {
                warn!(error = %err, "host history unavailable");
                None
            }
        }
    };

    let hosts = resolve_hosts(&args, &config, history.as_ref()).await?;
    let filter = FilterState::new(&hosts)
        .context("no usable hosts")?
        .with_services(
            args.services
                .clone()
                .unwrap_or_else(|| config.services.clone()),
        )
        .with_message_keywords(
            args.message_keywords
                .clone()
                .unwrap_or_else(|| config.message_keywords.clone()),
        )
        .with_time_range(TimeRange {
            start: args.since,
            end: args.until,
        });

    if let Some(history) = &history
        && let Err(err) = history.save(filter.hosts()).await
    {
        warn!(error = %err, path = %history.path().display(), "failed to save host history");
    }

    info!(
        hosts = filter.hosts().len(),
        services = %filter.services(),
        message_keywords = %filter.message_keywords(),
        ?command,
        "starting minink-viewer"
    );

    let transport =
        NetworkTransport::with_config(config.client_config()).context("create network client")?;
    let autoscroll = config.autoscroll && !args.no_autoscroll;

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    match command {
        Command::Tui => {
            let manager = LiveSessionManager::new(Arc::new(transport), LogView::default())
                .with_autoscroll(autoscroll);
            let options = TuiOptions {
                filter_debounce: config.filter_debounce(),
            };
            run_tui(manager, filter, options, log_buffer, shutdown)
                .await
                .context("run tui")?;
        }
        Command::Tail => {
            let mut manager =
                LiveSessionManager::new(Arc::new(transport), PlainSink::new(io::stdout()));
            match follow(&mut manager, filter, &shutdown).await {
                TailExit::Shutdown => info!("shutdown signal received"),
                TailExit::Exhausted => info!("all streams closed"),
                TailExit::OutputClosed => info!("stdout closed"),
            }
        }
    }

    Ok(())
}

async fn resolve_hosts(
    args: &Cli,
    config: &ViewerConfig,
    history: Option<&HostHistory>,
) -> Result<Vec<String>> {
    if !args.hosts.is_empty() {
        return Ok(args.hosts.clone());
    }
    if !config.hosts.is_empty() {
        return Ok(config.hosts.clone());
    }
    if let Some(history) = history {
        let saved = history.load().await.context("load host history")?;
        if !saved.is_empty() {
            info!(hosts = saved.len(), "using hosts from history");
            return Ok(saved);
        }
    }
    bail!("no hosts given; pass --host or set hosts in the config file")
}

fn init_tracing(
    args: &Cli,
    command: Command,
    tui_writer: LogWriterFactory,
) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&args.log_level).context("invalid log level")?;

    let (file_writer, guard) = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let result = match command {
        Command::Tui => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(tui_writer))
            .with(file_layer(file_writer))
            .try_init(),
        Command::Tail => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .with(file_layer(file_writer))
            .try_init(),
    };
    result
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn file_layer<S>(writer: Option<NonBlocking>) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer))
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
