pub mod assistant;
pub mod config;
pub mod extractor;
pub mod feed;
pub mod notifier;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use assistant::{AssistantApi, AssistantClient, RunStatus, Summarizer};
pub use config::{AssistantConfig, Config, FetchConfig, PollConfig};
pub use extractor::{ArticleExtractor, PageExtractor};
pub use feed::{FeedReader, FeedSource};
pub use notifier::{Notifier, SlackNotifier};
pub use orchestrator::Orchestrator;
pub use store::RecordStore;
pub use types::*;
