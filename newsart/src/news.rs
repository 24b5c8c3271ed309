use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// One news item as delivered by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Headline {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Headline {
    pub fn new(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }

    /// Text to summarize: the description when it has content, otherwise the title.
    /// `None` when both are blank, in which case the headline is skipped.
    /// A blank description falls back to the title instead of skipping the headline.
    pub fn text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .or_else(|| Some(self.title.trim()).filter(|t| !t.is_empty()))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Source of current headlines.
#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_top_headlines(
        &self,
        category: &str,
        language: &str,
        page_size: u32,
    ) -> Result<Vec<Headline>>;
}

/// NewsAPI-compatible top headlines client.
pub struct NewsApiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Newsart/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl HeadlineSource for NewsApiClient {
    async fn fetch_top_headlines(
        &self,
        category: &str,
        language: &str,
        page_size: u32,
    ) -> Result<Vec<Headline>> {
        let url = format!("{}/v2/top-headlines", self.base_url.trim_end_matches('/'));
        let page_size = page_size.to_string();

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("category", category),
                ("language", language),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("news aggregator request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("news aggregator error {}: {}", status, body);
        }

        let body: TopHeadlinesResponse = response
            .json()
            .await
            .context("failed to parse news aggregator response")?;

        if body.status.as_deref() == Some("error") {
            anyhow::bail!(
                "news aggregator error {}: {}",
                body.code.unwrap_or_default(),
                body.message.unwrap_or_default()
            );
        }

        info!(count = body.articles.len(), category, language, "fetched top headlines");
        Ok(body.articles)
    }
}

#[derive(Debug, Deserialize)]
struct TopHeadlinesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Headline>,
}
