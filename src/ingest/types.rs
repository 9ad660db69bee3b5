// src/ingest/types.rs
use anyhow::Result;

use crate::ingest::providers::{github, reddit, zenn};
use crate::model::{Source, TrendItem};

/// One upstream of the aggregator. Implementations may fail; the aggregator
/// turns a failure into an empty contribution.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<TrendItem>>;
    fn source(&self) -> Source;
}

/// Raw upstream payloads, one variant per source shape.
#[derive(Debug)]
pub enum RawPayload {
    Articles(zenn::ArticleList),
    Repositories(github::SearchResponse),
    Forum {
        subreddit: String,
        listing: reddit::Listing,
    },
}

impl RawPayload {
    pub fn source(&self) -> Source {
        match self {
            RawPayload::Articles(_) => Source::Zenn,
            RawPayload::Repositories(_) => Source::Github,
            RawPayload::Forum { .. } => Source::Reddit,
        }
    }
}

/// Convert a raw payload into items. Never fails: bad elements are dropped.
pub fn normalize(payload: RawPayload) -> Vec<TrendItem> {
    let source = payload.source();
    let items = match payload {
        RawPayload::Articles(list) => zenn::normalize(list),
        RawPayload::Repositories(resp) => github::normalize(resp),
        RawPayload::Forum { subreddit, listing } => reddit::normalize(&subreddit, listing),
    };
    tracing::debug!(source = source.as_str(), items = items.len(), "payload normalized");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_item_carries_the_payload_source() {
        let payload = RawPayload::Forum {
            subreddit: "rust".into(),
            listing: reddit::Listing {
                data: reddit::ListingData {
                    children: vec![json!({"data": {
                        "id": "p1",
                        "title": "Hello",
                        "author": "crab",
                        "permalink": "/r/rust/comments/p1/hello/",
                        "created_utc": 1714550400.0
                    }})],
                },
            },
        };
        assert_eq!(payload.source(), Source::Reddit);
        let items = normalize(payload);
        assert_eq!(items.len(), 1);
        assert!(items.iter().all(|it| it.source == Source::Reddit));
    }

    #[test]
    fn empty_payloads_map_to_their_source() {
        let articles = RawPayload::Articles(zenn::ArticleList::default());
        let repos = RawPayload::Repositories(github::SearchResponse::default());
        assert_eq!(articles.source(), Source::Zenn);
        assert_eq!(repos.source(), Source::Github);
        assert!(normalize(articles).is_empty());
        assert!(normalize(repos).is_empty());
    }
}
