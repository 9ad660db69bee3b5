// tests/http_fetch.rs
//
// HttpFetcher + providers against a local mock server. Covers URL/query
// mapping, the User-Agent header, upstream errors and per-subreddit isolation.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trend_catchup::config::FetchSettings;
use trend_catchup::ingest::aggregate;
use trend_catchup::ingest::fetch::{HttpFetcher, RawFetcher, SourceRequest};
use trend_catchup::ingest::providers::{default_providers, RedditProvider, ZennProvider};
use trend_catchup::ingest::types::SourceProvider;
use trend_catchup::model::Source;

fn settings(server: &MockServer) -> FetchSettings {
    FetchSettings {
        user_agent: "catchup-test/1.0".into(),
        timeout_secs: 5,
        zenn_base: server.uri(),
        github_base: format!("{}/", server.uri()),
        reddit_base: server.uri(),
    }
}

fn fetcher(server: &MockServer) -> Arc<dyn RawFetcher> {
    Arc::new(HttpFetcher::new(&settings(server)).expect("http client"))
}

fn zenn_body() -> serde_json::Value {
    json!({
        "articles": [
            {
                "id": 101,
                "title": "Ownership in practice",
                "slug": "ownership",
                "comments_count": 3,
                "liked_count": 250,
                "body_letters_count": 5000,
                "article_type": "tech",
                "emoji": "🦀",
                "published_at": "2024-05-01T09:00:00.000+09:00",
                "user": { "username": "ferris", "name": "Ferris" }
            }
        ],
        "next_page": 2
    })
}

fn github_body() -> serde_json::Value {
    json!({
        "total_count": 1,
        "items": [
            {
                "id": 77,
                "full_name": "octo/fast",
                "owner": { "login": "octo" },
                "html_url": "https://github.com/octo/fast",
                "description": null,
                "stargazers_count": 900,
                "forks_count": 40,
                "language": "Rust",
                "created_at": "2024-05-02T10:00:00Z"
            }
        ]
    })
}

fn reddit_body(sub: &str, id: &str) -> serde_json::Value {
    json!({
        "kind": "Listing",
        "data": {
            "children": [
                {
                    "kind": "t3",
                    "data": {
                        "id": id,
                        "title": format!("Hot in {sub}"),
                        "author": "redditor",
                        "subreddit": sub,
                        "score": 42,
                        "num_comments": 7,
                        "created_utc": 1714550400.0,
                        "selftext": "",
                        "permalink": format!("/r/{sub}/comments/{id}/hot/"),
                        "thumbnail": "self"
                    }
                }
            ]
        }
    })
}

#[tokio::test]
async fn zenn_request_sends_order_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("order", "liked"))
        .and(header("user-agent", "catchup-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zenn_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ZennProvider::new(fetcher(&server));
    let items = provider.fetch_items().await.expect("zenn items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "zenn-101");
    assert_eq!(items[0].url, "https://zenn.dev/ferris/articles/ownership");
}

#[tokio::test]
async fn github_request_carries_search_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "desc"))
        .and(query_param("per_page", "30"))
        .and(query_param("q", "created:>2024-04-25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(github_body()))
        .mount(&server)
        .await;

    let f = fetcher(&server);
    let body = f
        .fetch_raw(&SourceRequest::TrendingRepositories {
            created_after: chrono::NaiveDate::from_ymd_opt(2024, 4, 25).unwrap(),
            per_page: 30,
        })
        .await
        .expect("github body");
    assert!(body.contains("octo/fast"));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = ZennProvider::new(fetcher(&server));
    assert!(provider.fetch_items().await.is_err());
}

#[tokio::test]
async fn failing_subreddit_does_not_drop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust/hot.json"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_body("rust", "aa")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/broken/hot.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/golang/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = RedditProvider::new(
        fetcher(&server),
        vec!["rust".into(), "broken".into(), "golang".into()],
    );
    let items = provider.fetch_items().await.expect("reddit never fails as a whole");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "reddit-aa");
    assert_eq!(items[0].tags, vec!["Reddit", "rust"]);
}

#[tokio::test]
async fn default_providers_aggregate_in_source_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zenn_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(github_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/programming/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_body("programming", "p1")))
        .mount(&server)
        .await;

    let providers = default_providers(fetcher(&server), vec!["programming".into()]);
    let items = aggregate(&providers).await;
    let sources: Vec<Source> = items.iter().map(|i| i.source).collect();
    assert_eq!(sources, vec![Source::Zenn, Source::Github, Source::Reddit]);
    assert_eq!(items[1].description.as_deref(), Some("No description provided"));
}
