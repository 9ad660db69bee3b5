// src/ingest/fetch.rs
//! Fetch boundary: turns a source descriptor into a raw response body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::FetchSettings;

/// What to fetch, independent of where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Articles,
    TrendingRepositories {
        created_after: NaiveDate,
        per_page: u32,
    },
    Subreddit {
        name: String,
        limit: u32,
    },
}

#[async_trait]
pub trait RawFetcher: Send + Sync {
    async fn fetch_raw(&self, req: &SourceRequest) -> Result<String>;
}

/// reqwest-backed fetcher. Base URLs come from config so tests can point it at a mock server.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    zenn_base: String,
    github_base: String,
    reddit_base: String,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            zenn_base: trim_base(&cfg.zenn_base),
            github_base: trim_base(&cfg.github_base),
            reddit_base: trim_base(&cfg.reddit_base),
        })
    }

    fn request(&self, req: &SourceRequest) -> reqwest::RequestBuilder {
        match req {
            SourceRequest::Articles => self
                .client
                .get(format!("{}/api/articles", self.zenn_base))
                .query(&[("order", "liked")]),
            SourceRequest::TrendingRepositories {
                created_after,
                per_page,
            } => self
                .client
                .get(format!("{}/search/repositories", self.github_base))
                .query(&[
                    ("q", format!("created:>{}", created_after.format("%Y-%m-%d"))),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", per_page.to_string()),
                ]),
            SourceRequest::Subreddit { name, limit } => self
                .client
                .get(format!("{}/r/{}/hot.json", self.reddit_base, name))
                .query(&[("limit", limit.to_string())]),
        }
    }
}

#[async_trait]
impl RawFetcher for HttpFetcher {
    async fn fetch_raw(&self, req: &SourceRequest) -> Result<String> {
        let resp = self
            .request(req)
            .send()
            .await
            .with_context(|| format!("sending {req:?}"))?
            .error_for_status()
            .with_context(|| format!("upstream status for {req:?}"))?;
        resp.text()
            .await
            .with_context(|| format!("reading body for {req:?}"))
    }
}

fn trim_base(s: &str) -> String {
    s.trim().trim_end_matches('/').to_string()
}
