//! End-to-end `scrape` pipeline: sitemap → fetch → strip → locate → render →
//! assemble → sink.
//!
//! A producer task spawns page fetches, bounded by a semaphore, and hands their
//! join handles to the consumer over a bounded channel in batch order. The
//! consumer awaits them one by one, runs the DOM stages synchronously and is
//! the only writer to the sink, so output order always equals batch order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scraper::Html;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use kbscrape_crawler::{BoilerplateStripper, ContentLocator, PageFetcher, for_strategy};
use kbscrape_discovery::UrlBatch;
use kbscrape_markdown::RenderOptions;
use kbscrape_shared::{ExtractedDocument, FetchedPage, KbScrapeError, Result, ScrapeConfig};

use crate::assembler::{assemble, derive_title, render_document};
use crate::sink::DocumentSink;

// ---------------------------------------------------------------------------
// Progress & summary
// ---------------------------------------------------------------------------

/// Result of a `scrape` run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    /// URLs in the batch.
    pub urls_found: usize,
    /// Pages whose fetch completed (successfully or not).
    pub attempted: usize,
    /// Documents written to the sink.
    pub written: usize,
    /// Skipped pages (URL, reason).
    pub skipped: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the batch size is known.
    fn batch_ready(&self, total: usize);
    /// Called after each page, written or skipped.
    fn page_done(&self, url: &str, written: bool);
    /// Called when the run completes.
    fn done(&self, summary: &ScrapeSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn batch_ready(&self, _total: usize) {}
    fn page_done(&self, _url: &str, _written: bool) {}
    fn done(&self, _summary: &ScrapeSummary) {}
}

// ---------------------------------------------------------------------------
// Per-page processing
// ---------------------------------------------------------------------------

/// The synchronous stages applied to one fetched page.
pub struct PageProcessor {
    stripper: BoilerplateStripper,
    locator: Box<dyn ContentLocator>,
    title_suffix: String,
    include_images: bool,
    canonicalize: bool,
}

impl PageProcessor {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            stripper: BoilerplateStripper::default(),
            locator: for_strategy(config.strategy),
            title_suffix: config.site.title_suffix.clone(),
            include_images: config.include_images,
            canonicalize: config.canonicalize,
        }
    }

    /// Turn a fetched page into a document.
    ///
    /// The parsed DOM lives only inside this call.
    #[instrument(skip_all, fields(url = %page.url, locator = self.locator.name()))]
    pub fn process(&self, page: &FetchedPage) -> Result<ExtractedDocument> {
        if !page.is_success() {
            return Err(KbScrapeError::HttpStatus {
                url: page.url.clone(),
                status: page.status,
            });
        }

        let mut doc = Html::parse_document(&page.raw_html);
        let title = derive_title(&doc, &self.title_suffix, &page.url)?;

        let report = self.stripper.strip(&mut doc);
        debug!(removed = report.total(), "boilerplate stripped");

        let fragment = self.locator.locate(&doc, &page.url)?;
        drop(doc);

        let opts = RenderOptions {
            include_images: self.include_images,
            canonicalize: self.canonicalize,
            base_url: Url::parse(&page.url).ok(),
        };
        let body = kbscrape_markdown::render(&fragment, &opts)?;
        if body.trim().is_empty() {
            return Err(KbScrapeError::NoContentFound {
                url: page.url.clone(),
            });
        }

        Ok(assemble(title, &page.url, body))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Fetch and filter the sitemap without processing any page.
#[instrument(skip_all)]
pub async fn catalog(config: &ScrapeConfig) -> Result<UrlBatch> {
    config.validate()?;
    let fetcher = PageFetcher::new(&config.site, config.timeout_secs)?;
    kbscrape_discovery::discover(fetcher.client(), config).await
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

type FetchTask = (String, JoinHandle<Result<FetchedPage>>);

/// Run the full `scrape` pipeline, writing every assembled document to `sink`.
///
/// Page-level failures are logged and skipped; sitemap, ordering, sink and
/// configuration failures abort the run.
#[instrument(skip_all, fields(lang = %config.language, limit = config.limit, strategy = %config.strategy))]
pub async fn run(
    config: &ScrapeConfig,
    sink: &mut dyn DocumentSink,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeSummary> {
    let start = Instant::now();
    config.validate()?;

    if config.compress {
        warn!("whitespace compression has no defined behaviour; output is unchanged");
    }

    let fetcher = PageFetcher::new(&config.site, config.timeout_secs)?;

    // --- Phase 1: Sitemap ---
    progress.phase("Reading sitemap");
    let batch = kbscrape_discovery::discover(fetcher.client(), config).await?;
    let total = batch.urls.len();
    progress.batch_ready(total);

    info!(
        urls = total,
        concurrency = config.concurrency,
        delay_ms = config.delay_ms,
        "starting scrape"
    );

    // --- Phase 2: Fetch (producer) ---
    progress.phase("Fetching articles");
    let (tx, mut rx) = mpsc::channel::<FetchTask>(config.concurrency.max(1));
    let producer = tokio::spawn(produce(
        batch.urls,
        fetcher,
        Arc::new(Semaphore::new(config.concurrency)),
        Duration::from_millis(config.delay_ms),
        tx,
    ));

    // --- Phase 3: Process & write (consumer) ---
    let processor = PageProcessor::from_config(config);
    let mut summary = ScrapeSummary {
        urls_found: total,
        ..ScrapeSummary::default()
    };

    while let Some((url, handle)) = rx.recv().await {
        let fetched = match handle.await {
            Ok(fetched) => fetched,
            Err(e) => Err(KbScrapeError::Network(format!("{url}: fetch task failed: {e}"))),
        };
        summary.attempted += 1;

        match fetched.and_then(|page| processor.process(&page)) {
            Ok(document) => {
                if let Err(e) = sink.write_document(&render_document(&document)) {
                    producer.abort();
                    return Err(e);
                }
                summary.written += 1;
                info!(%url, title = %document.title, "article written");
                progress.page_done(&url, true);
            }
            Err(e) if e.is_page_level() => {
                error!(%url, error = %e, "article skipped");
                summary.skipped.push((url.clone(), e.to_string()));
                progress.page_done(&url, false);
            }
            Err(e) => {
                producer.abort();
                return Err(e);
            }
        }
    }

    if let Err(e) = producer.await {
        warn!(error = %e, "fetch producer ended abnormally");
    }

    sink.finish()?;
    summary.elapsed = start.elapsed();

    info!(
        found = summary.urls_found,
        attempted = summary.attempted,
        written = summary.written,
        skipped = summary.skipped.len(),
        elapsed_ms = summary.elapsed.as_millis(),
        "scrape complete"
    );
    progress.done(&summary);

    Ok(summary)
}

/// Spawn one fetch per URL, in order, holding a permit for each in-flight request.
async fn produce(
    urls: Vec<String>,
    fetcher: PageFetcher,
    permits: Arc<Semaphore>,
    delay: Duration,
    tx: mpsc::Sender<FetchTask>,
) {
    for url in urls {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fetcher = fetcher.clone();
        let task_url = url.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            fetcher.fetch(&task_url).await
        });

        if tx.send((url, handle)).await.is_err() {
            debug!("consumer gone, stopping producer");
            break;
        }
    }
}
