use std::time::Duration;

use chrono::Local;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::article::{Article, FeedPayload, ManualArticle, RawArticle};
use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no endpoint configured")]
    NotConfigured,
}

#[derive(Serialize)]
struct ManualRequest<'a> {
    title: &'a str,
    content: &'a str,
    press: &'a str,
    time: String,
}

pub struct Fetcher {
    client: Client,
    url: String,
    manual_url: Option<String>,
}

impl Fetcher {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent("SummaryFeed/0.1")
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            manual_url: config.manual_url.clone(),
        })
    }

    pub fn accepts_manual(&self) -> bool {
        self.manual_url.is_some()
    }

    /// Fetch the latest articles. Any failure is logged and reported as an
    /// empty batch.
    pub async fn fetch_articles(&self, keyword: Option<&str>) -> Vec<Article> {
        match self.try_fetch_articles(keyword).await {
            Ok(articles) => articles,
            Err(e) => {
                error!("Failed to fetch articles from {}: {}", self.url, e);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch_articles(
        &self,
        keyword: Option<&str>,
    ) -> Result<Vec<Article>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(keyword) = keyword {
            request = request.query(&[("keyword", keyword)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let payload = FeedPayload::from_slice(&bytes)?;
        let articles = payload.into_articles(keyword, Local::now());

        info!("Fetched {} articles", articles.len());
        Ok(articles)
    }

    /// Send a manually entered article to the backend for summarization and
    /// return the article it created.
    pub async fn submit_manual(&self, manual: &ManualArticle) -> Result<Article, FetchError> {
        let url = self.manual_url.as_deref().ok_or(FetchError::NotConfigured)?;

        let body = ManualRequest {
            title: &manual.title,
            content: &manual.content,
            press: &manual.press,
            time: manual.display_time(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let raw: RawArticle = serde_json::from_slice(&bytes)?;
        Ok(raw.normalize(0, None, Local::now()))
    }
}
