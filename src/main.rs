use clap::Parser;
use rss_summarizer::{
    AssistantClient, Config, FeedReader, Orchestrator, PageExtractor, RecordStore,
    SlackNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rss-summarizer", about = "Summarizes new RSS articles into a Slack channel")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Starting RSS summarizer");
    let config = Config::load(&args.config)?;
    info!(
        "Watching {} feeds, posting to {}",
        config.rss_urls.len(),
        config.slack_channel
    );

    let store = RecordStore::connect(&config.database_url).await?;

    let feeds = Arc::new(FeedReader::new(config.fetch.clone()));
    let extractor = Arc::new(PageExtractor::new(&config.fetch));
    let summarizer = Arc::new(AssistantClient::new(
        config.assistant.clone(),
        config.openai_key.clone(),
        config.assistant_id.clone(),
    ));
    let notifier = Arc::new(SlackNotifier::new(
        &config.fetch,
        config.slack_token.clone(),
        config.slack_channel.clone(),
    ));

    let orchestrator = Orchestrator::new(
        config.rss_urls.clone(),
        config.poll.clone(),
        store,
        feeds,
        extractor,
        summarizer,
        notifier,
    );

    if args.once {
        orchestrator.run_cycle().await?;
        info!("Single cycle complete");
    } else {
        orchestrator.run().await?;
    }

    Ok(())
}
