// src/api.rs
//! Local JSON API over [`TrendApp`].

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::app::TrendApp;
use crate::model::{FilterSpec, SortMode, Source, TrendItem};
use crate::scheduler::{RefreshOutcome, RefreshStatus};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<TrendApp>,
}

impl AppState {
    pub fn new(app: Arc<TrendApp>) -> Self {
        Self { app }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/items", get(list_items))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .route("/filter", get(get_filter).put(put_filter).delete(reset_filter))
        .route("/sort", get(get_sort).put(put_sort))
        .route("/favorites", get(list_favorites))
        .route("/favorites/{id}", post(toggle_favorite))
        .route("/categories", get(categories))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// 400 with `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0 });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ItemsQuery {
    sources: Option<String>,
    categories: Option<String>,
    keyword: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    min_score: Option<u64>,
    sort: Option<String>,
}

impl ItemsQuery {
    /// Stored filter with every supplied parameter replacing its clause.
    fn apply_to(&self, mut spec: FilterSpec) -> Result<FilterSpec, ApiError> {
        if let Some(raw) = &self.sources {
            spec.sources = split_list(raw)
                .map(|s| s.parse::<Source>().map_err(|e| ApiError(e.to_string())))
                .collect::<Result<BTreeSet<_>, _>>()?;
        }
        if let Some(raw) = &self.categories {
            spec.categories = split_list(raw).map(str::to_string).collect();
        }
        if let Some(k) = &self.keyword {
            spec.keyword = k.clone();
        }
        if let Some(raw) = &self.date_from {
            spec.date_from = Some(parse_ts("date_from", raw)?);
        }
        if let Some(raw) = &self.date_to {
            spec.date_to = Some(parse_ts("date_to", raw)?);
        }
        if self.min_score.is_some() {
            spec.min_score = self.min_score;
        }
        Ok(spec)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_ts(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError(format!("{field}: {e}")))
}

#[derive(Serialize)]
struct ItemView {
    item: TrendItem,
    favorite: bool,
}

#[derive(Serialize)]
struct ItemsResp {
    count: usize,
    items: Vec<ItemView>,
}

async fn list_items(
    State(state): State<AppState>,
    Query(q): Query<ItemsQuery>,
) -> Result<Json<ItemsResp>, ApiError> {
    let view = state.app.view();
    let filter = q.apply_to(view.filter)?;
    let items = match q.sort.as_deref() {
        Some(name) => state.app.visible_items_by_name(&filter, name),
        None => state.app.visible_items_with(&filter, view.sort),
    };

    let favorites = state.app.favorites();
    let items: Vec<ItemView> = items
        .into_iter()
        .map(|item| ItemView {
            favorite: favorites.contains(&item.id),
            item,
        })
        .collect();
    Ok(Json(ItemsResp {
        count: items.len(),
        items,
    }))
}

#[derive(Serialize)]
struct StatusResp {
    status: RefreshStatus,
    error: Option<String>,
    item_count: usize,
    last_refreshed: Option<DateTime<Utc>>,
    refreshing: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    let snap = state.app.status();
    Json(StatusResp {
        status: snap.status,
        error: snap.error,
        item_count: snap.items.len(),
        last_refreshed: snap.last_refreshed,
        refreshing: state.app.scheduler().is_refreshing(),
    })
}

#[derive(Serialize)]
struct RefreshResp {
    outcome: &'static str,
    status: RefreshStatus,
    item_count: usize,
}

/// The cycle runs on its own task so a client disconnect cannot cancel it.
async fn refresh(State(state): State<AppState>) -> Json<RefreshResp> {
    let app = state.app.clone();
    let outcome = match tokio::spawn(async move { app.refresh().await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = ?e, "refresh task did not complete");
            RefreshOutcome::Failed
        }
    };
    let snap = state.app.status();
    tracing::info!(outcome = outcome.as_str(), "manual refresh");
    Json(RefreshResp {
        outcome: outcome.as_str(),
        status: snap.status,
        item_count: snap.items.len(),
    })
}

async fn get_filter(State(state): State<AppState>) -> Json<FilterSpec> {
    Json(state.app.filter())
}

async fn put_filter(
    State(state): State<AppState>,
    Json(spec): Json<FilterSpec>,
) -> Json<FilterSpec> {
    state.app.set_filter(spec);
    Json(state.app.filter())
}

async fn reset_filter(State(state): State<AppState>) -> Json<FilterSpec> {
    state.app.reset_filter();
    Json(state.app.filter())
}

#[derive(Serialize, Deserialize)]
struct SortBody {
    sort: String,
}

async fn get_sort(State(state): State<AppState>) -> Json<SortBody> {
    Json(SortBody {
        sort: state.app.sort_mode().as_str().to_string(),
    })
}

async fn put_sort(
    State(state): State<AppState>,
    Json(body): Json<SortBody>,
) -> Result<Json<SortBody>, ApiError> {
    let mode: SortMode = body.sort.parse().map_err(|e: anyhow::Error| ApiError(e.to_string()))?;
    state.app.set_sort(mode);
    Ok(Json(SortBody {
        sort: mode.as_str().to_string(),
    }))
}

#[derive(Serialize)]
struct FavoritesResp {
    ids: Vec<String>,
}

async fn list_favorites(State(state): State<AppState>) -> Json<FavoritesResp> {
    Json(FavoritesResp {
        ids: state.app.favorites(),
    })
}

#[derive(Serialize)]
struct ToggleResp {
    id: String,
    favorite: bool,
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ToggleResp> {
    let favorite = state.app.toggle_favorite(&id);
    Json(ToggleResp { id, favorite })
}

async fn categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.app.available_categories())
}
