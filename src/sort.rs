//! # Sort Engine
//! Comparator selection over filtered results. Always sorts a copy.

use std::collections::HashSet;

use crate::model::{SortMode, TrendItem};

/// Order `items` by `mode`. The favorites set only matters for [`SortMode::Favorite`].
pub fn sort_items(
    items: &[TrendItem],
    mode: SortMode,
    favorites: &HashSet<String>,
) -> Vec<TrendItem> {
    let mut out = items.to_vec();
    match mode {
        SortMode::Trend => out.sort_by(|a, b| b.score.cmp(&a.score)),
        SortMode::Recent => out.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        SortMode::Favorite => out.sort_by(|a, b| {
            let fa = favorites.contains(&a.id);
            let fb = favorites.contains(&b.id);
            fb.cmp(&fa).then_with(|| b.score.cmp(&a.score))
        }),
    }
    out
}

/// Sort by a mode name as received from a UI. Unknown names leave the order untouched.
pub fn sort_items_by_name(
    items: &[TrendItem],
    mode: &str,
    favorites: &HashSet<String>,
) -> Vec<TrendItem> {
    match mode.parse::<SortMode>() {
        Ok(m) => sort_items(items, m, favorites),
        Err(_) => {
            tracing::debug!(mode, "unknown sort mode, keeping input order");
            items.to_vec()
        }
    }
}
