//! sonarrctl - Sonarr command line client.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use sonarrctl_api::sonarr::{
    Command, DEFAULT_PAGE_SIZE, Episode, HistoryRecord, Page, QueueRecord, Series, SystemStatus,
};
use sonarrctl_api::{
    Endpoint, HttpMethod, LocalRestClient, Params, Sonarr, SonarrClient, SonarrConfiguration,
    SonarrError,
};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override the config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show Sonarr system status.
    Status,
    /// List series, or show one with `--id`.
    Series(SeriesArgs),
    /// List the episodes of a series.
    Episodes(EpisodesArgs),
    /// List upcoming episodes.
    Calendar(CalendarArgs),
    /// Show the download queue.
    Queue(PageArgs),
    /// Show recent history.
    History(PageArgs),
    /// Show monitored episodes without a file.
    Wanted(PageArgs),
    /// Queue a command, or show one with `--id`.
    Command(CommandArgs),
    /// Inspect or create the config file.
    Config(ConfigCommand),
    /// Raw GET request.
    Get(RawArgs),
    /// Raw POST request.
    Post(RawArgs),
    /// Raw PUT request.
    Put(RawArgs),
    /// Raw DELETE request.
    Delete(RawArgs),
}

/// Arguments for the `series` subcommand.
#[derive(clap::Args)]
struct SeriesArgs {
    /// Sonarr series ID.
    #[arg(long)]
    id: Option<u64>,
}

/// Arguments for the `episodes` subcommand.
#[derive(clap::Args)]
struct EpisodesArgs {
    /// Sonarr series ID.
    #[arg(long, required = true)]
    series_id: u64,
}

/// Arguments for the `calendar` subcommand.
#[derive(clap::Args)]
struct CalendarArgs {
    /// Start date (e.g. "2024-01-01").
    #[arg(long)]
    start: Option<String>,
    /// End date (e.g. "2024-01-07").
    #[arg(long)]
    end: Option<String>,
}

/// Paging arguments for `queue`, `history` and `wanted`.
#[derive(clap::Args)]
struct PageArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Records per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
}

/// Arguments for the `command` subcommand.
#[derive(clap::Args)]
struct CommandArgs {
    /// Command name (e.g. "RssSync", "RefreshSeries").
    #[arg(long, required_unless_present = "id", conflicts_with = "id")]
    name: Option<String>,
    /// Show the status of a queued command.
    #[arg(long)]
    id: Option<u64>,
    /// Extra command field as KEY=VALUE (repeatable).
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective settings (file plus `SONARR_*` overrides).
    Show,
    /// Write a default config file if none exists.
    Init,
}

/// Arguments for the raw request subcommands.
#[derive(clap::Args)]
struct RawArgs {
    /// Path template relative to the base URL (e.g. "api/v3/series/{id}").
    path: String,
    /// Parameter as KEY=VALUE (repeatable). VALUE is parsed as JSON when possible.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,
}

/// Parses a `KEY=VALUE` parameter.
///
/// `VALUE` is read as JSON (`5`, `true`, `[1,2]`) and falls back to a
/// plain string.
///
/// # Errors
///
/// Returns an error if `=` is missing or `KEY` is empty.
fn parse_param(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("invalid parameter '{raw}': expected KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("invalid parameter '{raw}': empty key");
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(String::from(value)));
    Ok((String::from(key), value))
}

/// Collects parsed `--param` pairs into request parameters.
fn to_params(pairs: Vec<(String, Value)>) -> Params {
    pairs.into_iter().collect()
}

/// Loads the effective Sonarr settings for `dir`.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved, the file is
/// unreadable, or an environment override is malformed.
fn load_configuration(dir: Option<&Path>) -> Result<SonarrConfiguration> {
    let path = resolve_config_path(dir)?;
    tracing::debug!(path = %path.display(), "loading config");
    AppConfig::resolve(&path, |key| std::env::var(key).ok())
}

/// Builds the typed client from the effective settings.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the HTTP
/// client fails to build.
#[instrument(skip_all)]
fn build_sonarr(dir: Option<&Path>) -> Result<Sonarr<SonarrClient>> {
    let config = load_configuration(dir)?;
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; set api_key in config.toml or SONARR_API_KEY");
    }
    let api_version = config.api_version.clone();
    let client = SonarrClient::builder()
        .configuration(config)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build Sonarr client")?;
    Ok(Sonarr::new(client, api_version))
}

/// Adds the validation details Sonarr returned to a failed call.
fn describe(err: SonarrError) -> anyhow::Error {
    let messages = err.validation_messages();
    let err = anyhow::Error::new(err);
    if messages.is_empty() {
        err
    } else {
        err.context(messages.join("; "))
    }
}

/// Runs the `status` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_status(dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let status = sonarr.system_status().await.map_err(describe)?;
    print_status(&status);
    Ok(())
}

/// Runs the `series` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_series(args: &SeriesArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    if let Some(id) = args.id {
        let series = sonarr.series_by_id(id).await.map_err(describe)?;
        print_series_details(&series);
    } else {
        let series = sonarr.series().await.map_err(describe)?;
        print_series_list(&series);
    }
    Ok(())
}

/// Runs the `episodes` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_episodes(args: &EpisodesArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let episodes = sonarr.episodes(args.series_id).await.map_err(describe)?;
    print_episodes(&episodes);
    Ok(())
}

/// Runs the `calendar` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_calendar(args: &CalendarArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let episodes = sonarr
        .calendar(args.start.as_deref(), args.end.as_deref())
        .await
        .map_err(describe)?;
    print_episodes(&episodes);
    Ok(())
}

/// Runs the `queue` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_queue(args: &PageArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let page = sonarr
        .queue(args.page, args.page_size)
        .await
        .map_err(describe)?;
    print_queue(&page);
    Ok(())
}

/// Runs the `history` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_history(args: &PageArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let page = sonarr
        .history(args.page, args.page_size)
        .await
        .map_err(describe)?;
    print_history(&page);
    Ok(())
}

/// Runs the `wanted` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_wanted(args: &PageArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let page = sonarr
        .wanted_missing(args.page, args.page_size)
        .await
        .map_err(describe)?;
    tracing::info!(
        "Missing: {} (page {}, {} per page)",
        page.total_records,
        page.page,
        page.page_size
    );
    print_episodes(&page.records);
    Ok(())
}

/// Runs the `command` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all)]
async fn run_command(args: CommandArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let command = match (args.id, args.name) {
        (Some(id), _) => sonarr.command_by_id(id).await,
        (None, Some(name)) => sonarr.run_command(&name, to_params(args.params)).await,
        (None, None) => bail!("either --name or --id is required"),
    }
    .map_err(describe)?;
    print_command(&command);
    Ok(())
}

/// Runs a raw request against `args.path`.
///
/// # Errors
///
/// Returns an error if the client fails to build or the request fails.
#[instrument(skip_all, fields(method = %method))]
async fn run_raw(method: HttpMethod, args: RawArgs, dir: Option<&Path>) -> Result<()> {
    let sonarr = build_sonarr(dir)?;
    let endpoint = Endpoint::new("raw", method, args.path);
    let params = to_params(args.params);
    let client = sonarr.client();
    let body = match method {
        HttpMethod::Get => client.get(&endpoint, params).await,
        HttpMethod::Post => client.post(&endpoint, params).await,
        HttpMethod::Put => client.put(&endpoint, params).await,
        HttpMethod::Delete => client.delete(&endpoint, params).await,
    }
    .map_err(describe)?;
    print_body(body.as_ref())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
fn run_config_show(dir: Option<&Path>) -> Result<()> {
    let config = load_configuration(dir)?;
    print_configuration(&config);
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or written.
fn run_config_init(dir: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() {
        tracing::info!("Config already exists: {}", path.display());
        return Ok(());
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Logs system status.
fn print_status(status: &SystemStatus) {
    tracing::info!(
        "{} {} ({})",
        status.app_name.as_deref().unwrap_or("Sonarr"),
        status.version,
        status.branch.as_deref().unwrap_or("-")
    );
    tracing::info!("OS: {}", status.os_name.as_deref().unwrap_or("-"));
    tracing::info!("Docker: {}", status.is_docker);
    tracing::info!("Started: {}", status.start_time.as_deref().unwrap_or("-"));
}

/// Logs a series table.
fn print_series_list(series: &[Series]) {
    tracing::info!("Total: {}", series.len());
    tracing::info!("ID\tYear\tStatus\t\tMonitored\tTitle");
    for s in series {
        tracing::info!(
            "{}\t{}\t{}\t\t{}\t\t{}",
            s.id,
            s.year.map_or_else(|| String::from("-"), |y| y.to_string()),
            s.status.as_deref().unwrap_or("-"),
            s.monitored,
            s.title,
        );
    }
}

/// Logs one series with its file statistics.
fn print_series_details(series: &Series) {
    tracing::info!("ID: {}", series.id);
    tracing::info!("Title: {}", series.title);
    tracing::info!("Status: {}", series.status.as_deref().unwrap_or("-"));
    tracing::info!("Path: {}", series.path.as_deref().unwrap_or("-"));
    if let Some(stats) = &series.statistics {
        tracing::info!(
            "Seasons: {}, files: {}/{}, size: {} bytes",
            stats.season_count,
            stats.episode_file_count,
            stats.episode_count,
            stats.size_on_disk
        );
    }
}

/// Logs an episode table.
fn print_episodes(episodes: &[Episode]) {
    tracing::info!("Episodes: {}", episodes.len());
    for ep in episodes {
        tracing::info!(
            "  [{}] S{:02}E{:02} {} (air: {}, file: {})",
            ep.series_id,
            ep.season_number,
            ep.episode_number,
            ep.title.as_deref().unwrap_or("-"),
            ep.air_date_utc.as_deref().unwrap_or("-"),
            if ep.has_file { "yes" } else { "no" },
        );
    }
}

/// Logs download progress.
fn print_queue(page: &Page<QueueRecord>) {
    tracing::info!("Queue: {} item(s)", page.total_records);
    for item in &page.records {
        let done = if item.size > 0.0 {
            (item.size - item.size_left) / item.size * 100.0
        } else {
            0.0
        };
        tracing::info!(
            "  {} {:.1}% {} (left: {})",
            item.status.as_deref().unwrap_or("-"),
            done,
            item.title.as_deref().unwrap_or("-"),
            item.time_left.as_deref().unwrap_or("-"),
        );
    }
}

/// Logs history entries.
fn print_history(page: &Page<HistoryRecord>) {
    tracing::info!("History: {} record(s)", page.total_records);
    for record in &page.records {
        tracing::info!(
            "  {} {} {}",
            record.date.as_deref().unwrap_or("-"),
            record.event_type.as_deref().unwrap_or("-"),
            record.source_title.as_deref().unwrap_or("-"),
        );
    }
}

/// Logs a command's state.
fn print_command(command: &Command) {
    tracing::info!(
        "Command {} {}: {}",
        command.id,
        command.name,
        command.status.as_deref().unwrap_or("-")
    );
    if let Some(message) = &command.message {
        tracing::info!("Message: {message}");
    }
}

/// Logs effective settings. The API key is masked.
fn print_configuration(config: &SonarrConfiguration) {
    tracing::info!("URL: {}", config.base_url());
    tracing::info!("API version: {}", config.api_version);
    tracing::info!("Timeout: {}s", config.timeout);
    tracing::info!(
        "API key: {}",
        if config.api_key.is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    );
}

/// Logs a raw response body as pretty JSON.
///
/// # Errors
///
/// Returns an error if the body cannot be serialized.
fn print_body(body: Option<&Value>) -> Result<()> {
    match body {
        Some(value) => {
            let pretty =
                serde_json::to_string_pretty(value).context("failed to format response body")?;
            tracing::info!("{pretty}");
        }
        None => tracing::info!("(no content)"),
    }
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Status => run_status(dir).await,
        Commands::Series(args) => run_series(&args, dir).await,
        Commands::Episodes(args) => run_episodes(&args, dir).await,
        Commands::Calendar(args) => run_calendar(&args, dir).await,
        Commands::Queue(args) => run_queue(&args, dir).await,
        Commands::History(args) => run_history(&args, dir).await,
        Commands::Wanted(args) => run_wanted(&args, dir).await,
        Commands::Command(args) => run_command(args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(dir),
            ConfigSubcommands::Init => run_config_init(dir),
        },
        Commands::Get(args) => run_raw(HttpMethod::Get, args, dir).await,
        Commands::Post(args) => run_raw(HttpMethod::Post, args, dir).await,
        Commands::Put(args) => run_raw(HttpMethod::Put, args, dir).await,
        Commands::Delete(args) => run_raw(HttpMethod::Delete, args, dir).await,
    }
}
