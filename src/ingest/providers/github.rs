// src/ingest/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::fetch::{RawFetcher, SourceRequest};
use crate::ingest::thumbnail;
use crate::ingest::types::{normalize as normalize_payload, RawPayload, SourceProvider};
use crate::ingest::{clean_text, decode_elements, MAX_ITEMS_PER_SOURCE};
use crate::model::{Source, TrendItem};

const NO_DESCRIPTION: &str = "No description provided";
/// Search window: repositories created within the last week.
const WINDOW_DAYS: i64 = 7;
const PER_PAGE: u32 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    id: u64,
    full_name: String,
    html_url: String,
    owner: Owner,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

pub fn normalize(resp: SearchResponse) -> Vec<TrendItem> {
    decode_elements::<Repo>(Source::Github, resp.items, MAX_ITEMS_PER_SOURCE)
        .into_iter()
        .filter_map(to_item)
        .collect()
}

fn to_item(r: Repo) -> Option<TrendItem> {
    if r.full_name.trim().is_empty() || r.html_url.trim().is_empty() {
        return None;
    }
    let login = r.owner.login.trim().to_string();
    let language = r
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let mut tags = vec![Source::Github.platform_tag().to_string()];
    if let Some(lang) = &language {
        tags.push(lang.clone());
    }

    Some(TrendItem {
        id: Source::Github.item_id(r.id),
        source: Source::Github,
        title: r.full_name.trim().to_string(),
        url: r.html_url.trim().to_string(),
        author: if login.is_empty() {
            "anonymous".to_string()
        } else {
            login.clone()
        },
        author_url: (!login.is_empty()).then(|| format!("https://github.com/{login}")),
        description: Some(
            r.description
                .map(|d| clean_text(&d))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        ),
        score: r.stargazers_count,
        comments_count: r.forks_count,
        tags,
        published_at: r
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default(),
        thumbnail_url: Some(thumbnail::placeholder(
            "#24292e",
            language.as_deref().unwrap_or("Code"),
            24,
            Some("sans-serif"),
        )),
    })
}

/// Most-starred repositories created in the last week.
pub struct GithubProvider {
    fetcher: Arc<dyn RawFetcher>,
}

impl GithubProvider {
    pub fn new(fetcher: Arc<dyn RawFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceProvider for GithubProvider {
    async fn fetch_items(&self) -> Result<Vec<TrendItem>> {
        let req = SourceRequest::TrendingRepositories {
            created_after: (Utc::now() - Duration::days(WINDOW_DAYS)).date_naive(),
            per_page: PER_PAGE,
        };
        let body = self.fetcher.fetch_raw(&req).await?;
        let resp: SearchResponse =
            serde_json::from_str(&body).context("parsing github search response")?;
        Ok(normalize_payload(RawPayload::Repositories(resp)))
    }

    fn source(&self) -> Source {
        Source::Github
    }
}
