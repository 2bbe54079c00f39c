use crate::assistant::Summarizer;
use crate::config::PollConfig;
use crate::extractor::ArticleExtractor;
use crate::feed::FeedSource;
use crate::notifier::Notifier;
use crate::store::RecordStore;
use crate::types::{Entry, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The perpetual poll cycle: walk every configured source, summarize and
/// deliver each unseen entry, record it, repeat after an idle pause.
pub struct Orchestrator {
    sources: Vec<String>,
    poll: PollConfig,
    store: RecordStore,
    feeds: Arc<dyn FeedSource>,
    extractor: Arc<dyn ArticleExtractor>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        sources: Vec<String>,
        poll: PollConfig,
        store: RecordStore,
        feeds: Arc<dyn FeedSource>,
        extractor: Arc<dyn ArticleExtractor>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sources,
            poll,
            store,
            feeds,
            extractor,
            summarizer,
            notifier,
        }
    }

    /// Runs forever. Returns only on a fatal error; there is no other
    /// termination condition, the process runs until externally killed.
    pub async fn run(&self) -> Result<()> {
        loop {
            info!("Starting poll cycle over {} sources", self.sources.len());
            self.run_cycle().await?;
            info!(
                "Poll cycle complete, idling for {}s",
                self.poll.idle_interval_secs
            );
            tokio::time::sleep(Duration::from_secs(self.poll.idle_interval_secs)).await;
        }
    }

    /// One full pass over all configured sources. No cursor is kept; a
    /// restart re-scans everything and the record store handles dedup.
    pub async fn run_cycle(&self) -> Result<()> {
        for url in &self.sources {
            self.process_source(url).await?;
        }
        Ok(())
    }

    async fn process_source(&self, url: &str) -> Result<()> {
        let entries = self.feeds.fetch(url).await;
        debug!("Source {} yielded {} entries", url, entries.len());

        for entry in entries {
            if self.store.exists(&entry.link).await? {
                debug!("Already recorded, skipping: {}", entry.link);
                continue;
            }

            match self.process_entry(&entry).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping entry {}: {}", entry.link, e);
                }
            }

            tokio::time::sleep(Duration::from_secs(self.poll.entry_throttle_secs)).await;
        }

        Ok(())
    }

    /// Extract, summarize, deliver, record. Delivery failure is inspected
    /// and logged but the record is still written: a flaky chat destination
    /// must not cause the article to be summarized again next cycle.
    async fn process_entry(&self, entry: &Entry) -> Result<()> {
        let article_text = self.extractor.extract(&entry.link).await?;
        let summary = self.summarizer.summarize(&entry.title, &article_text).await?;

        if let Err(e) = self
            .notifier
            .notify(&entry.title, &entry.link, &summary)
            .await
        {
            warn!("Delivery failed for {}, recording anyway: {}", entry.link, e);
        }

        self.store.insert(&entry.link, &entry.title, &summary).await?;
        info!("Summarized and recorded {}", entry.link);
        Ok(())
    }
}
