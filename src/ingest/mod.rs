// src/ingest/mod.rs
pub mod fetch;
pub mod providers;
pub mod thumbnail;
pub mod types;

use crate::ingest::types::SourceProvider;
use crate::model::{Source, TrendItem};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Per-source cap applied to list-shaped payloads.
pub const MAX_ITEMS_PER_SOURCE: usize = 20;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Items normalized per source.");
        describe_counter!(
            "ingest_dropped_total",
            "Upstream elements dropped as malformed."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch+normalize time in milliseconds.");
    });
}

/// Decode HTML entities, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// First `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Decode up to `limit` raw elements one by one; undecodable ones are dropped.
pub(crate) fn decode_elements<T: DeserializeOwned>(
    source: Source,
    raw: Vec<serde_json::Value>,
    limit: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(raw.len().min(limit));
    for (idx, v) in raw.into_iter().take(limit).enumerate() {
        match serde_json::from_value::<T>(v) {
            Ok(el) => out.push(el),
            Err(e) => {
                tracing::debug!(
                    source = source.as_str(),
                    idx,
                    error = %e,
                    "dropping malformed element"
                );
                counter!("ingest_dropped_total", "source" => source.as_str()).increment(1);
            }
        }
    }
    out
}

/// Run one provider, converting any failure into an empty contribution.
pub async fn settle(provider: &dyn SourceProvider) -> Vec<TrendItem> {
    let source = provider.source();
    let t0 = std::time::Instant::now();

    let items = match provider.fetch_items().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, source = source.as_str(), "provider error");
            counter!("ingest_provider_errors_total", "source" => source.as_str()).increment(1);
            Vec::new()
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_fetch_ms", "source" => source.as_str()).record(ms);
    counter!("ingest_items_total", "source" => source.as_str()).increment(items.len() as u64);
    items
}

/// Fetch every provider concurrently and concatenate in provider order.
/// No deduplication; the sort stage decides the final order.
pub async fn aggregate(providers: &[Arc<dyn SourceProvider>]) -> Vec<TrendItem> {
    ensure_metrics_described();

    let per_source = join_all(providers.iter().map(|p| settle(p.as_ref()))).await;

    let total: usize = per_source.iter().map(Vec::len).sum();
    tracing::info!(
        target: "ingest",
        providers = providers.len(),
        items = total,
        "aggregation finished"
    );
    per_source.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_decodes_and_collapses() {
        assert_eq!(clean_text("  Tom &amp; Jerry\n\n&lt;3  "), "Tom & Jerry <3");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }

    #[test]
    fn decode_elements_drops_bad_and_respects_limit() {
        #[derive(serde::Deserialize)]
        struct El {
            n: u32,
        }
        let raw = vec![
            serde_json::json!({"n": 1}),
            serde_json::json!({"n": "nope"}),
            serde_json::json!({"n": 3}),
            serde_json::json!({"n": 4}),
        ];
        let out: Vec<El> = decode_elements(Source::Zenn, raw, 3);
        let ns: Vec<u32> = out.iter().map(|e| e.n).collect();
        assert_eq!(ns, vec![1, 3]);
    }
}
