//! # Filter Engine
//! Pure predicate pass over the unified collection. All clauses are ANDed and
//! each one is skipped when its field is unset or empty. Relative order of the
//! input is preserved.

use crate::model::{FilterSpec, TrendItem};

/// Return the items that satisfy every applicable clause of `spec`.
pub fn filter_items(items: &[TrendItem], spec: &FilterSpec) -> Vec<TrendItem> {
    let keyword = normalized_keyword(spec);
    items
        .iter()
        .filter(|it| matches_with_keyword(it, spec, keyword.as_deref()))
        .cloned()
        .collect()
}

/// Single-item form of [`filter_items`].
pub fn matches(item: &TrendItem, spec: &FilterSpec) -> bool {
    matches_with_keyword(item, spec, normalized_keyword(spec).as_deref())
}

fn normalized_keyword(spec: &FilterSpec) -> Option<String> {
    let k = spec.keyword.trim();
    if k.is_empty() {
        None
    } else {
        Some(k.to_lowercase())
    }
}

fn matches_with_keyword(item: &TrendItem, spec: &FilterSpec, keyword: Option<&str>) -> bool {
    // 1) Source membership
    if !spec.sources.is_empty() && !spec.sources.contains(&item.source) {
        return false;
    }

    // 2) Tag intersection (exact match)
    if !spec.categories.is_empty() && !item.tags.iter().any(|t| spec.categories.contains(t)) {
        return false;
    }

    // 3) Keyword: title OR description OR any tag
    if let Some(k) = keyword {
        let in_title = item.title.to_lowercase().contains(k);
        let in_desc = item
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(k));
        let in_tags = item.tags.iter().any(|t| t.to_lowercase().contains(k));
        if !(in_title || in_desc || in_tags) {
            return false;
        }
    }

    // 4-5) Inclusive date bounds
    if spec.date_from.is_some_and(|from| item.published_at < from) {
        return false;
    }
    if spec.date_to.is_some_and(|to| item.published_at > to) {
        return false;
    }

    // 6) Inclusive score floor
    if spec.min_score.is_some_and(|min| item.score < min) {
        return false;
    }

    true
}
