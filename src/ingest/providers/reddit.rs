// src/ingest/providers/reddit.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use futures::future::join_all;
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::fetch::{RawFetcher, SourceRequest};
use crate::ingest::thumbnail;
use crate::ingest::types::{normalize as normalize_payload, RawPayload, SourceProvider};
use crate::ingest::{clean_text, decode_elements, truncate_chars};
use crate::model::{Source, TrendItem};

pub const DEFAULT_SUBREDDITS: [&str; 3] = ["programming", "webdev", "javascript"];
/// Posts requested per subreddit.
pub const POSTS_PER_SUBREDDIT: u32 = 10;
const SELFTEXT_PREVIEW_CHARS: usize = 150;
const SITE: &str = "https://www.reddit.com";

#[derive(Debug, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    title: String,
    permalink: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    link_flair_text: Option<String>,
}

/// Normalize one subreddit listing. `subreddit` fills in posts that lack the field.
pub fn normalize(subreddit: &str, listing: Listing) -> Vec<TrendItem> {
    let limit = listing.data.children.len();
    decode_elements::<Child>(Source::Reddit, listing.data.children, limit)
        .into_iter()
        .filter_map(|c| to_item(subreddit, c.data))
        .collect()
}

fn to_item(requested: &str, p: Post) -> Option<TrendItem> {
    let title = clean_text(&p.title);
    if p.id.trim().is_empty() || title.is_empty() || p.permalink.trim().is_empty() {
        return None;
    }
    let subreddit = if p.subreddit.trim().is_empty() {
        requested.to_string()
    } else {
        p.subreddit.trim().to_string()
    };
    let author = if p.author.trim().is_empty() {
        "anonymous".to_string()
    } else {
        p.author.trim().to_string()
    };

    // Preview is cut from the body as posted, markup and line breaks included.
    let description = if p.selftext.trim().is_empty() {
        format!("Posted to r/{subreddit}")
    } else {
        format!("{}...", truncate_chars(&p.selftext, SELFTEXT_PREVIEW_CHARS))
    };

    let mut tags = vec![Source::Reddit.platform_tag().to_string(), subreddit.clone()];
    if let Some(flair) = p
        .link_flair_text
        .map(|f| clean_text(&f))
        .filter(|f| !f.is_empty())
    {
        tags.push(flair);
    }

    let published_at = DateTime::from_timestamp_millis((p.created_utc * 1000.0) as i64)
        .unwrap_or_default();

    Some(TrendItem {
        id: Source::Reddit.item_id(p.id.trim()),
        source: Source::Reddit,
        title,
        url: format!("{SITE}{}", p.permalink.trim()),
        author_url: Some(format!("{SITE}/u/{author}")),
        author,
        description: Some(description),
        score: p.score.max(0) as u64,
        comments_count: p.num_comments,
        tags,
        published_at,
        thumbnail_url: Some(
            p.thumbnail
                .filter(|t| is_absolute_http_url(t))
                .unwrap_or_else(|| {
                    thumbnail::placeholder("#FF4500", "Reddit", 32, Some("sans-serif"))
                }),
        ),
    })
}

/// Reddit uses sentinel strings like "self" or "default" in the thumbnail field.
fn is_absolute_http_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Hot posts from a fixed set of subreddits. One failing subreddit never
/// affects the others.
pub struct RedditProvider {
    fetcher: Arc<dyn RawFetcher>,
    subreddits: Vec<String>,
}

impl RedditProvider {
    pub fn new(fetcher: Arc<dyn RawFetcher>, subreddits: Vec<String>) -> Self {
        Self {
            fetcher,
            subreddits,
        }
    }

    async fn fetch_subreddit(&self, name: &str) -> Result<Vec<TrendItem>> {
        let req = SourceRequest::Subreddit {
            name: name.to_string(),
            limit: POSTS_PER_SUBREDDIT,
        };
        let body = self.fetcher.fetch_raw(&req).await?;
        let listing: Listing = serde_json::from_str(&body)
            .with_context(|| format!("parsing r/{name} listing"))?;
        Ok(normalize_payload(RawPayload::Forum {
            subreddit: name.to_string(),
            listing,
        }))
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    async fn fetch_items(&self) -> Result<Vec<TrendItem>> {
        let results = join_all(self.subreddits.iter().map(|s| self.fetch_subreddit(s))).await;

        let mut out = Vec::new();
        for (name, res) in self.subreddits.iter().zip(results) {
            match res {
                Ok(mut items) => out.append(&mut items),
                Err(e) => {
                    tracing::warn!(error = ?e, subreddit = %name, "subreddit fetch failed");
                    counter!("ingest_provider_errors_total", "source" => "reddit").increment(1);
                }
            }
        }
        Ok(out)
    }

    fn source(&self) -> Source {
        Source::Reddit
    }
}
