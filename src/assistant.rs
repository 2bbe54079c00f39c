use crate::config::AssistantConfig;
use crate::types::{Result, SummarizerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Produces a summary for one article. The production implementation drives
/// an OpenAI Assistant; tests substitute canned summarizers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, article_text: &str) -> Result<String>;
}

/// Status of an assistant run, collapsed to what the poll loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Queued or in progress; worth checking again.
    Pending,
    Completed,
    /// Terminal without a result, carrying the API's status string.
    Failed(String),
}

impl RunStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "queued" | "in_progress" => RunStatus::Pending,
            "completed" => RunStatus::Completed,
            other => RunStatus::Failed(other.to_string()),
        }
    }
}

/// The thread/run lifecycle of the Assistants API. One implementation per
/// transport; the poll loop above it never touches HTTP directly.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<String>;
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()>;
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String>;
    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus>;
    /// Newest message text in the thread, if any.
    async fn latest_message(&self, thread_id: &str) -> Result<Option<String>>;
}

pub struct OpenAiAssistantApi {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

impl OpenAiAssistantApi {
    pub fn new(api_base: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base,
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Assistant(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantApi {
    async fn create_thread(&self) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, "/threads")
            .json(&json!({}))
            .send()
            .await?;
        let thread: ObjectId = Self::decode(response).await?;
        debug!("Created assistant thread {}", thread.id);
        Ok(thread.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{}/messages", thread_id),
            )
            .json(&json!({ "role": "user", "content": content }))
            .send()
            .await?;
        let _: ObjectId = Self::decode(response).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{}/runs", thread_id),
            )
            .json(&json!({ "assistant_id": assistant_id }))
            .send()
            .await?;
        let run: ObjectId = Self::decode(response).await?;
        debug!("Created run {} on thread {}", run.id, thread_id);
        Ok(run.id)
    }

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{}/runs/{}", thread_id, run_id),
            )
            .send()
            .await?;
        let run: RunObject = Self::decode(response).await?;
        Ok(RunStatus::from_api(&run.status))
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<String>> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{}/messages", thread_id),
            )
            .send()
            .await?;
        let messages: MessageList = Self::decode(response).await?;

        // The API lists messages newest first.
        let text = messages.data.into_iter().next().and_then(|message| {
            message
                .content
                .into_iter()
                .find(|part| part.kind == "text")
                .and_then(|part| part.text)
                .map(|t| t.value)
        });
        Ok(text)
    }
}

/// Builds the summarization prompt, keeping it within the character budget.
/// The title always survives whole; only trailing article text is dropped.
pub fn build_prompt(title: &str, article_text: &str, budget_chars: usize) -> String {
    let mut prompt = format!("Please summarize this article:\n\nTitle: {}\n\n", title);
    let remaining = budget_chars.saturating_sub(prompt.chars().count());
    prompt.extend(article_text.chars().take(remaining));
    prompt
}

pub struct AssistantClient {
    api: Arc<dyn AssistantApi>,
    config: AssistantConfig,
    assistant_id: String,
}

impl AssistantClient {
    pub fn new(config: AssistantConfig, api_key: String, assistant_id: String) -> Self {
        let api = Arc::new(OpenAiAssistantApi::new(config.api_base.clone(), api_key));
        Self {
            api,
            config,
            assistant_id,
        }
    }

    /// Seam for substituting the transport.
    pub fn with_api(
        api: Arc<dyn AssistantApi>,
        config: AssistantConfig,
        assistant_id: String,
    ) -> Self {
        Self {
            api,
            config,
            assistant_id,
        }
    }

    /// Polls the run at a fixed interval until it reaches a terminal status,
    /// giving up after the configured number of checks.
    async fn poll_until_complete(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let mut checks: u32 = 0;
        loop {
            let status = self.api.run_status(thread_id, run_id).await?;
            checks += 1;
            match status {
                RunStatus::Completed => return Ok(()),
                RunStatus::Failed(s) => {
                    return Err(SummarizerError::Assistant(format!(
                        "run {} ended with status {}",
                        run_id, s
                    )));
                }
                RunStatus::Pending => {
                    if checks >= self.config.max_status_checks {
                        warn!(
                            "Run {} still pending after {} checks, giving up",
                            run_id, checks
                        );
                        return Err(SummarizerError::SummarizationTimeout { checks });
                    }
                    tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs))
                        .await;
                }
            }
        }
    }
}

#[async_trait]
impl Summarizer for AssistantClient {
    async fn summarize(&self, title: &str, article_text: &str) -> Result<String> {
        let prompt = build_prompt(title, article_text, self.config.prompt_budget_chars);

        let thread_id = self.api.create_thread().await?;
        self.api.add_message(&thread_id, &prompt).await?;
        let run_id = self.api.create_run(&thread_id, &self.assistant_id).await?;

        self.poll_until_complete(&thread_id, &run_id).await?;

        match self.api.latest_message(&thread_id).await? {
            Some(summary) => Ok(summary),
            None => Err(SummarizerError::Assistant(format!(
                "run {} completed but thread {} has no messages",
                run_id, thread_id
            ))),
        }
    }
}
