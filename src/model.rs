// src/model.rs
//! Unified data model shared by the ingest, filter and sort stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Origin system of an item. Order of `ALL` is the aggregation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Zenn,
    Github,
    Reddit,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Zenn, Source::Github, Source::Reddit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Zenn => "zenn",
            Source::Github => "github",
            Source::Reddit => "reddit",
        }
    }

    /// Display tag every item of this source carries.
    pub fn platform_tag(&self) -> &'static str {
        match self {
            Source::Zenn => "Zenn",
            Source::Github => "GitHub",
            Source::Reddit => "Reddit",
        }
    }

    /// Globally unique item id: `<source>-<local id>`.
    pub fn item_id(&self, local_id: impl fmt::Display) -> String {
        format!("{}-{}", self.as_str(), local_id)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zenn" => Ok(Source::Zenn),
            "github" => Ok(Source::Github),
            "reddit" => Ok(Source::Reddit),
            other => anyhow::bail!("unknown source: {other}"),
        }
    }
}

/// One normalized unit of trending content. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendItem {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub url: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Likes, stars or upvotes. Only comparable within one source, but ranked uniformly.
    pub score: u64,
    pub comments_count: u64,
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// User-chosen inclusion criteria. `Default` restricts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub sources: BTreeSet<Source>,
    pub categories: BTreeSet<String>,
    pub keyword: String,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_score: Option<u64>,
}

impl FilterSpec {
    /// True when at least one clause would restrict the result.
    pub fn is_active(&self) -> bool {
        !self.sources.is_empty()
            || !self.categories.is_empty()
            || !self.keyword.trim().is_empty()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.min_score.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn toggle_source(&mut self, source: Source) {
        if !self.sources.remove(&source) {
            self.sources.insert(source);
        }
    }

    pub fn toggle_category(&mut self, tag: &str) {
        if !self.categories.remove(tag) {
            self.categories.insert(tag.to_string());
        }
    }
}

/// Ordering strategy for the visible collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Descending score.
    #[default]
    Trend,
    /// Descending publish time.
    Recent,
    /// Favorites first, then descending score.
    Favorite,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Trend => "trend",
            SortMode::Recent => "recent",
            SortMode::Favorite => "favorite",
        }
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trend" => Ok(SortMode::Trend),
            "recent" => Ok(SortMode::Recent),
            "favorite" => Ok(SortMode::Favorite),
            other => anyhow::bail!("unknown sort mode: {other}"),
        }
    }
}
