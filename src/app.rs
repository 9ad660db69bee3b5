// src/app.rs
//! Presentation boundary. Everything a view needs goes through [`TrendApp`]:
//! the current collection, refresh status, view settings (filter + sort)
//! and favorites.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::favorites::FavoritesStore;
use crate::filter::filter_items;
use crate::ingest::types::SourceProvider;
use crate::kv::KvStore;
use crate::model::{FilterSpec, SortMode, TrendItem};
use crate::scheduler::{RefreshOutcome, RefreshScheduler, Snapshot};
use crate::sort::{sort_items, sort_items_by_name};

/// Session-scoped view settings. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub filter: FilterSpec,
    pub sort: SortMode,
}

pub struct TrendApp {
    scheduler: Arc<RefreshScheduler>,
    favorites: Mutex<FavoritesStore>,
    view: RwLock<ViewSettings>,
}

impl TrendApp {
    pub fn new(scheduler: Arc<RefreshScheduler>, favorites: FavoritesStore) -> Self {
        Self {
            scheduler,
            favorites: Mutex::new(favorites),
            view: RwLock::new(ViewSettings::default()),
        }
    }

    /// Scheduler and favorites sharing one key-value store.
    pub fn with_store(providers: Vec<Arc<dyn SourceProvider>>, kv: Arc<dyn KvStore>) -> Self {
        let favorites = FavoritesStore::load(kv.clone());
        let scheduler = Arc::new(RefreshScheduler::new(providers, kv));
        Self::new(scheduler, favorites)
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    pub fn items(&self) -> Arc<Vec<TrendItem>> {
        self.scheduler.items()
    }

    pub fn status(&self) -> Snapshot {
        self.scheduler.snapshot()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.scheduler.refresh().await
    }

    pub fn view(&self) -> ViewSettings {
        self.view.read().expect("view settings poisoned").clone()
    }

    pub fn filter(&self) -> FilterSpec {
        self.view.read().expect("view settings poisoned").filter.clone()
    }

    pub fn set_filter(&self, filter: FilterSpec) {
        self.view.write().expect("view settings poisoned").filter = filter;
    }

    /// In-place edit, e.g. a single toggle.
    pub fn update_filter(&self, edit: impl FnOnce(&mut FilterSpec)) {
        let mut view = self.view.write().expect("view settings poisoned");
        edit(&mut view.filter);
    }

    pub fn reset_filter(&self) {
        self.view.write().expect("view settings poisoned").filter.reset();
    }

    pub fn sort_mode(&self) -> SortMode {
        self.view.read().expect("view settings poisoned").sort
    }

    pub fn set_sort(&self, mode: SortMode) {
        self.view.write().expect("view settings poisoned").sort = mode;
    }

    pub fn toggle_favorite(&self, id: &str) -> bool {
        let now = self
            .favorites
            .lock()
            .expect("favorites mutex poisoned")
            .toggle(id);
        tracing::debug!(id, favorite = now, "favorite toggled");
        now
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites
            .lock()
            .expect("favorites mutex poisoned")
            .is_favorite(id)
    }

    /// Favorite ids in insertion order.
    pub fn favorites(&self) -> Vec<String> {
        self.favorites
            .lock()
            .expect("favorites mutex poisoned")
            .ids()
            .to_vec()
    }

    fn favorite_set(&self) -> HashSet<String> {
        self.favorites
            .lock()
            .expect("favorites mutex poisoned")
            .id_set()
    }

    /// Current collection under the current view settings.
    pub fn visible_items(&self) -> Vec<TrendItem> {
        let view = self.view();
        self.visible_items_with(&view.filter, view.sort)
    }

    /// Same pipeline with explicit settings; the stored view is left alone.
    pub fn visible_items_with(&self, filter: &FilterSpec, sort: SortMode) -> Vec<TrendItem> {
        let items = self.items();
        let favs = self.favorite_set();
        sort_items(&filter_items(&items, filter), sort, &favs)
    }

    /// Sort given by name; an unrecognized name keeps the filtered order.
    pub fn visible_items_by_name(&self, filter: &FilterSpec, sort: &str) -> Vec<TrendItem> {
        let items = self.items();
        let favs = self.favorite_set();
        sort_items_by_name(&filter_items(&items, filter), sort, &favs)
    }

    /// Sorted unique tags across the current collection.
    pub fn available_categories(&self) -> Vec<String> {
        self.items()
            .iter()
            .flat_map(|it| it.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::model::Source;
    use crate::scheduler::RefreshStatus;
    use chrono::{TimeZone, Utc};

    struct Fixed(Source, Vec<TrendItem>);

    #[async_trait::async_trait]
    impl SourceProvider for Fixed {
        async fn fetch_items(&self) -> anyhow::Result<Vec<TrendItem>> {
            Ok(self.1.clone())
        }
        fn source(&self) -> Source {
            self.0
        }
    }

    fn item(source: Source, local: u32, score: u64, tags: &[&str]) -> TrendItem {
        TrendItem {
            id: source.item_id(local),
            source,
            title: format!("{source} item {local}"),
            url: format!("https://example.test/{source}/{local}"),
            author: "someone".into(),
            author_url: None,
            description: None,
            score,
            comments_count: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: Utc.with_ymd_and_hms(2024, 5, local, 0, 0, 0).unwrap(),
            thumbnail_url: None,
        }
    }

    fn app() -> TrendApp {
        let providers: Vec<Arc<dyn SourceProvider>> = vec![
            Arc::new(Fixed(
                Source::Zenn,
                vec![item(Source::Zenn, 1, 5, &["Zenn", "Tech"])],
            )),
            Arc::new(Fixed(
                Source::Github,
                vec![
                    item(Source::Github, 2, 40, &["GitHub", "Rust"]),
                    item(Source::Github, 3, 12, &["GitHub", "Go"]),
                ],
            )),
        ];
        TrendApp::with_store(providers, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn visible_items_follow_view_settings() {
        let app = app();
        assert!(app.visible_items().is_empty());
        assert_eq!(app.refresh().await, RefreshOutcome::Ready(3));
        assert_eq!(app.status().status, RefreshStatus::Ready);

        let ids: Vec<_> = app.visible_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["github-2", "github-3", "zenn-1"]);

        app.set_sort(SortMode::Recent);
        let ids: Vec<_> = app.visible_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["github-3", "github-2", "zenn-1"]);

        app.update_filter(|f| f.toggle_source(Source::Zenn));
        let ids: Vec<_> = app.visible_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["zenn-1"]);

        app.reset_filter();
        assert_eq!(app.visible_items().len(), 3);
        assert_eq!(app.sort_mode(), SortMode::Recent);
    }

    #[tokio::test]
    async fn explicit_settings_do_not_touch_stored_view() {
        let app = app();
        app.refresh().await;
        let spec = FilterSpec {
            min_score: Some(10),
            ..Default::default()
        };
        assert_eq!(app.visible_items_with(&spec, SortMode::Trend).len(), 2);
        assert_eq!(app.filter(), FilterSpec::default());
    }

    #[tokio::test]
    async fn favorite_sort_uses_current_favorites() {
        let app = app();
        app.refresh().await;
        assert!(app.toggle_favorite("zenn-1"));
        app.set_sort(SortMode::Favorite);
        assert_eq!(app.visible_items()[0].id, "zenn-1");
        assert_eq!(app.favorites(), vec!["zenn-1"]);

        assert!(!app.toggle_favorite("zenn-1"));
        assert!(!app.is_favorite("zenn-1"));
        assert_eq!(app.visible_items()[0].id, "github-2");
    }

    #[tokio::test]
    async fn unknown_sort_name_keeps_aggregation_order() {
        let app = app();
        app.refresh().await;
        let ids: Vec<_> = app
            .visible_items_by_name(&FilterSpec::default(), "hottest")
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["zenn-1", "github-2", "github-3"]);
    }

    #[tokio::test]
    async fn categories_are_sorted_and_unique() {
        let app = app();
        assert!(app.available_categories().is_empty());
        app.refresh().await;
        assert_eq!(
            app.available_categories(),
            vec!["GitHub", "Go", "Rust", "Tech", "Zenn"]
        );
    }
}
