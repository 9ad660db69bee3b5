// src/ingest/providers/zenn.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::fetch::{RawFetcher, SourceRequest};
use crate::ingest::thumbnail;
use crate::ingest::types::{normalize as normalize_payload, RawPayload, SourceProvider};
use crate::ingest::{clean_text, decode_elements, MAX_ITEMS_PER_SOURCE};
use crate::model::{Source, TrendItem};

const SITE: &str = "https://zenn.dev";

/// Top-level body of the articles endpoint. Elements are decoded lazily.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleList {
    #[serde(default)]
    pub articles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Article {
    id: u64,
    title: String,
    slug: String,
    #[serde(default)]
    comments_count: u64,
    #[serde(default)]
    liked_count: u64,
    #[serde(default)]
    body_letters_count: u64,
    #[serde(default)]
    article_type: String,
    #[serde(default)]
    emoji: String,
    #[serde(default)]
    published_at: Option<String>,
    user: User,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
    #[serde(default)]
    name: Option<String>,
}

pub fn normalize(list: ArticleList) -> Vec<TrendItem> {
    decode_elements::<Article>(Source::Zenn, list.articles, MAX_ITEMS_PER_SOURCE)
        .into_iter()
        .filter_map(to_item)
        .collect()
}

fn to_item(a: Article) -> Option<TrendItem> {
    let title = clean_text(&a.title);
    let username = a.user.username.trim().to_string();
    if title.is_empty() || username.is_empty() || a.slug.trim().is_empty() {
        return None;
    }

    let is_tech = a.article_type.eq_ignore_ascii_case("tech");
    let author = a
        .user
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(username.as_str())
        .to_string();

    Some(TrendItem {
        id: Source::Zenn.item_id(a.id),
        source: Source::Zenn,
        title,
        url: format!("{SITE}/{username}/articles/{}", a.slug.trim()),
        author,
        author_url: Some(format!("{SITE}/{username}")),
        description: Some(format!(
            "{} {} - {} chars",
            a.emoji,
            if is_tech { "Tech article" } else { "Article" },
            a.body_letters_count
        )),
        score: a.liked_count,
        comments_count: a.comments_count,
        tags: vec![
            Source::Zenn.platform_tag().to_string(),
            if is_tech { "Tech" } else { "Idea" }.to_string(),
        ],
        published_at: a
            .published_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default(),
        thumbnail_url: Some(thumbnail::placeholder("#00B8D4", &a.emoji, 48, None)),
    })
}

/// Most-liked articles, first page.
pub struct ZennProvider {
    fetcher: Arc<dyn RawFetcher>,
}

impl ZennProvider {
    pub fn new(fetcher: Arc<dyn RawFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceProvider for ZennProvider {
    async fn fetch_items(&self) -> Result<Vec<TrendItem>> {
        let body = self.fetcher.fetch_raw(&SourceRequest::Articles).await?;
        let list: ArticleList = serde_json::from_str(&body).context("parsing zenn articles")?;
        Ok(normalize_payload(RawPayload::Articles(list)))
    }

    fn source(&self) -> Source {
        Source::Zenn
    }
}
