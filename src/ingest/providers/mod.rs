// src/ingest/providers/mod.rs
pub mod github;
pub mod reddit;
pub mod zenn;

use std::sync::Arc;

use crate::ingest::fetch::RawFetcher;
use crate::ingest::types::SourceProvider;

pub use github::GithubProvider;
pub use reddit::RedditProvider;
pub use zenn::ZennProvider;

/// The standard provider set in aggregation order: articles, repositories, forum.
pub fn default_providers(
    fetcher: Arc<dyn RawFetcher>,
    subreddits: Vec<String>,
) -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(ZennProvider::new(fetcher.clone())),
        Arc::new(GithubProvider::new(fetcher.clone())),
        Arc::new(RedditProvider::new(fetcher, subreddits)),
    ]
}
