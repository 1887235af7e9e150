//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use kbscrape_core::pipeline::{self, ProgressReporter, ScrapeSummary};
use kbscrape_core::sink::WriterSink;
use kbscrape_shared::{
    AppConfig, LocatorStrategy, ScrapeConfig, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Scrape the Prusa knowledge base into a Markdown file.
#[derive(Parser)]
#[command(
    name = "kbscrape",
    version,
    about = "Scrape the Prusa knowledge base into a single Markdown corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.kbscrape/kbscrape.toml.
    #[arg(long, global = true, env = "KBSCRAPE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch the selected articles and write them as one Markdown document.
    Scrape {
        /// Output file, truncated first. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep images inline. Most are base64 data URIs, so output grows fast.
        #[arg(long)]
        images: bool,

        /// Accepted for compatibility; does not change the output.
        #[arg(long)]
        compress: bool,

        /// Body locator: density or readability.
        #[arg(long)]
        strategy: Option<LocatorStrategy>,

        /// Demote extra H1s, space headings and resolve relative links.
        #[arg(long)]
        canonicalize: bool,

        /// Maximum in-flight page requests.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Pause before each page request, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Print the selected article URLs, one per line, without fetching them.
    Urls {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by every command that builds a URL batch.
#[derive(Args)]
pub(crate) struct SelectionArgs {
    /// Language tag, e.g. `en` or `cs`.
    #[arg(long)]
    lang: Option<String>,

    /// Maximum number of pages. Use 10000 for the whole knowledge base.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Sort by numeric article ID before applying the limit.
    #[arg(long)]
    order_by_id: bool,

    /// Allowed URL path prefixes (comma-separated), e.g. `article,guide`.
    #[arg(long, value_delimiter = ',')]
    content_types: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// documents.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "kbscrape=info",
        1 => "kbscrape=debug",
        _ => "kbscrape=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Scrape {
            output,
            images,
            compress,
            strategy,
            canonicalize,
            concurrency,
            delay_ms,
            selection,
        } => {
            let mut config = scrape_config(config_path, &selection)?;
            config.include_images |= images;
            config.canonicalize |= canonicalize;
            config.compress = compress;
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if let Some(delay_ms) = delay_ms {
                config.delay_ms = delay_ms;
            }
            cmd_scrape(&config, output.as_deref()).await
        }
        Command::Urls { selection } => {
            let config = scrape_config(config_path, &selection)?;
            cmd_urls(&config).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// File values first, then the selection flags on top.
fn scrape_config(path: Option<&Path>, selection: &SelectionArgs) -> Result<ScrapeConfig> {
    let mut config = ScrapeConfig::from(&resolve_config(path)?);
    if let Some(lang) = &selection.lang {
        config.language = lang.clone();
    }
    if let Some(limit) = selection.limit {
        config.limit = limit;
    }
    config.order_by_id |= selection.order_by_id;
    if !selection.content_types.is_empty() {
        config.content_types = selection.content_types.clone();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(config: &ScrapeConfig, output: Option<&Path>) -> Result<()> {
    info!(
        lang = %config.language,
        limit = config.limit,
        output = %output.map_or("<stdout>".into(), |p| p.display().to_string()),
        "scraping knowledge base"
    );

    let reporter = CliProgress::new();
    let summary = match output {
        Some(path) => {
            let mut sink = WriterSink::create(path)?;
            pipeline::run(config, &mut sink, &reporter).await?
        }
        None => {
            let mut sink = WriterSink::stdout();
            pipeline::run(config, &mut sink, &reporter).await?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ScrapeSummary) {
    eprintln!();
    eprintln!("  URLs found: {}", summary.urls_found);
    eprintln!("  Attempted:  {}", summary.attempted);
    eprintln!("  Written:    {}", summary.written);
    eprintln!("  Skipped:    {}", summary.skipped.len());
    for (url, reason) in &summary.skipped {
        eprintln!("    {url}: {reason}");
    }
    eprintln!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    eprintln!();
}

async fn cmd_urls(config: &ScrapeConfig) -> Result<()> {
    let batch = pipeline::catalog(config).await?;
    info!(
        urls = batch.urls.len(),
        rejected_language = batch.rejected_language,
        rejected_type = batch.rejected_type,
        duplicates = batch.duplicates,
        "catalog built"
    );
    for url in &batch.urls {
        println!("{url}");
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner while the sitemap loads, then a bar sized
/// to the batch. Draws to stderr.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn batch_ready(&self, total: usize) {
        self.bar.set_length(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
            self.bar.set_style(style);
        }
    }

    fn page_done(&self, url: &str, written: bool) {
        let mark = if written { "ok" } else { "skipped" };
        self.bar.set_message(format!("{mark} {url}"));
        self.bar.inc(1);
    }

    fn done(&self, _summary: &ScrapeSummary) {
        self.bar.finish_and_clear();
    }
}
