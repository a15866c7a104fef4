//! Capped, most-recent-first log of what the user searched, viewed and compared.

use chrono::Utc;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::routes::Route;
use crate::{generate_id, CatProfile, HistoryKind, SearchHistoryItem};

pub const HISTORY_LIMIT: usize = 50;

/// An entry before it is stamped with an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub kind: HistoryKind,
    pub query: Option<String>,
    pub product_ids: Vec<String>,
    pub cat_ids: Vec<String>,
}

impl NewHistoryEntry {
    pub fn search(query: impl Into<String>, cat_ids: Vec<String>) -> Self {
        Self {
            kind: HistoryKind::Search,
            query: Some(query.into()),
            product_ids: vec![],
            cat_ids,
        }
    }

    pub fn view(product_id: impl Into<String>, cat_ids: Vec<String>) -> Self {
        Self {
            kind: HistoryKind::View,
            query: None,
            product_ids: vec![product_id.into()],
            cat_ids,
        }
    }

    pub fn compare(product_ids: Vec<String>, cat_ids: Vec<String>) -> Self {
        Self {
            kind: HistoryKind::Compare,
            query: None,
            product_ids,
            cat_ids,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<SearchHistoryItem>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and prepend `entry`, evicting the oldest entries past the limit.
    pub fn append(&mut self, entry: NewHistoryEntry) -> &SearchHistoryItem {
        let item = SearchHistoryItem {
            id: generate_id(),
            kind: entry.kind,
            query: entry.query,
            product_ids: entry.product_ids,
            cat_ids: entry.cat_ids,
            timestamp: Utc::now(),
        };
        self.entries.insert(0, item);
        self.entries.truncate(HISTORY_LIMIT);
        &self.entries[0]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[SearchHistoryItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A history entry with its ids resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    #[serde(flatten)]
    pub item: SearchHistoryItem,
    pub product_labels: Vec<String>,
    pub cat_names: Vec<String>,
    /// Where to go to see this again
    pub route: String,
}

/// Resolve product and cat ids to labels. Ids that no longer resolve are left out.
pub fn describe(item: &SearchHistoryItem, catalog: &Catalog, cats: &[CatProfile]) -> HistoryEntryView {
    let product_labels = item
        .product_ids
        .iter()
        .filter_map(|id| catalog.get(id))
        .map(|p| p.label())
        .collect();
    let cat_names = item
        .cat_ids
        .iter()
        .filter_map(|id| cats.iter().find(|c| &c.id == id))
        .map(|c| c.name.clone())
        .collect();

    HistoryEntryView {
        item: item.clone(),
        product_labels,
        cat_names,
        route: replay_route(item).path(),
    }
}

fn replay_route(item: &SearchHistoryItem) -> Route {
    match item.kind {
        HistoryKind::Search => Route::App {
            search: item.query.clone(),
            product: None,
        },
        HistoryKind::View => Route::App {
            search: None,
            product: item.product_ids.first().cloned(),
        },
        HistoryKind::Compare => Route::Compare {
            ids: item.product_ids.clone(),
        },
    }
}
