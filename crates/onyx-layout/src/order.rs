//! Session-local render order maintained by drag reorders.
//!
//! The order overlays a layout's native widget order. Ids it does not know
//! about fall back to native order after every ordered id; ids it knows that
//! are no longer placed are ignored.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use onyx_core::{WidgetId, splice_move};

/// Ordered widget ids reflecting the latest drag reorders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetOrder {
    ids: Vec<WidgetId>,
}

impl WidgetOrder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an order from ids; repeated ids keep their first position.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = WidgetId>) -> Self {
        let mut order = Self::default();
        for id in ids {
            if !order.ids.contains(&id) {
                order.ids.push(id);
            }
        }
        order
    }

    #[must_use]
    pub fn ids(&self) -> &[WidgetId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|known| known == id)
    }

    /// Forget every id; the next plan uses native order.
    pub fn reset(&mut self) {
        self.ids.clear();
    }

    /// Bring the order in line with the placed ids: drop ids that are gone
    /// and append new ones in native order.
    pub fn reconcile(&mut self, native: &[WidgetId]) {
        self.ids.retain(|id| native.contains(id));
        for id in native {
            if !self.ids.contains(id) {
                self.ids.push(id.clone());
            }
        }
    }

    /// Move `from` to `to`'s position (list splice, not swap).
    ///
    /// Returns `false` and leaves the order untouched when either id is
    /// unknown or both are the same.
    pub fn reorder(&mut self, from: &str, to: &str) -> bool {
        match (self.position(from), self.position(to)) {
            (Some(a), Some(b)) if a != b => splice_move(&mut self.ids, a, b),
            _ => false,
        }
    }

    /// Sort `items` by this order. Known ids come first in order; the rest
    /// keep their relative input order.
    pub fn apply<T>(&self, items: Vec<T>, key: impl Fn(&T) -> &WidgetId) -> Vec<T> {
        if self.ids.is_empty() {
            return items;
        }
        let rank: FxHashMap<&str, usize> = self
            .ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();

        let mut ranked: Vec<(usize, T)> = Vec::with_capacity(items.len());
        let mut unranked: Vec<T> = Vec::new();
        for item in items {
            let idx = rank.get(key(&item).as_str()).copied();
            match idx {
                Some(idx) => ranked.push((idx, item)),
                None => unranked.push(item),
            }
        }
        ranked.sort_by_key(|(idx, _)| *idx);
        ranked
            .into_iter()
            .map(|(_, item)| item)
            .chain(unranked)
            .collect()
    }
}
