//! Layouts and widget placements.
//!
//! A [`Layout`] is a named arrangement of [`WidgetPlacement`]s. The order of
//! `widgets` is the native render order. Placements only reference catalog
//! entries by id; an id missing from the catalog is carried along untouched
//! and skipped at render time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::WidgetId;
use crate::clock::Timestamp;
use crate::size::WidgetSize;

/// Stable layout identifier, unique across a user's layouts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(String);

impl LayoutId {
    /// Id of the seed layout every store starts with.
    pub const DEFAULT: &'static str = "default";

    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayoutId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayoutId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<&str> for LayoutId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One widget's presence inside a layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPlacement {
    /// Widget identifier, unique within the owning layout.
    pub i: WidgetId,
    /// `None` and `Some(true)` both mean visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_override: Option<WidgetSize>,
}

impl WidgetPlacement {
    /// A fresh, visible placement with no size override.
    #[must_use]
    pub fn new(id: impl Into<WidgetId>) -> Self {
        Self {
            i: id.into(),
            visible: Some(true),
            size_override: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: WidgetSize) -> Self {
        self.size_override = Some(size);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible != Some(false)
    }
}

/// A named, ordered collection of widget placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: LayoutId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Seed layouts cannot be renamed or deleted.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub widgets: Vec<WidgetPlacement>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Layout {
    #[must_use]
    pub fn new(id: impl Into<LayoutId>, name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            is_default: false,
            widgets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_widgets(mut self, widgets: impl IntoIterator<Item = WidgetPlacement>) -> Self {
        self.widgets = widgets.into_iter().collect();
        self
    }

    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// The built-in seed layout.
    #[must_use]
    pub fn seed(now: Timestamp) -> Self {
        Self::new(LayoutId::DEFAULT, "Default", now)
            .with_description("Overview of accounts, cash flow and goals")
            .with_widgets(
                [
                    "KPI_INCOME",
                    "KPI_EXPENSES",
                    "KPI_SAVINGS_RATE",
                    "KPI_NET_CHANGE",
                    "NET_WORTH",
                    "MONTHLY_FLOW",
                    "RECENT_TRANSACTIONS",
                    "ACCOUNTS_OVERVIEW",
                    "BUDGET_PROGRESS",
                    "ACTIVE_GOALS",
                ]
                .into_iter()
                .map(WidgetPlacement::new),
            )
            .as_default()
    }

    #[must_use]
    pub fn position(&self, widget: &str) -> Option<usize> {
        self.widgets.iter().position(|p| p.i == *widget)
    }

    #[must_use]
    pub fn placement(&self, widget: &str) -> Option<&WidgetPlacement> {
        self.widgets.iter().find(|p| p.i == *widget)
    }

    pub fn placement_mut(&mut self, widget: &str) -> Option<&mut WidgetPlacement> {
        self.widgets.iter_mut().find(|p| p.i == *widget)
    }

    #[must_use]
    pub fn contains_widget(&self, widget: &str) -> bool {
        self.position(widget).is_some()
    }

    /// Widget ids in native order.
    #[must_use]
    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.widgets.iter().map(|p| p.i.clone()).collect()
    }

    /// Drop later placements that repeat an earlier widget id.
    ///
    /// Returns the number of placements removed.
    pub fn dedupe_widgets(&mut self) -> usize {
        let before = self.widgets.len();
        let mut seen: Vec<WidgetId> = Vec::with_capacity(before);
        self.widgets.retain(|p| {
            if seen.contains(&p.i) {
                false
            } else {
                seen.push(p.i.clone());
                true
            }
        });
        before - self.widgets.len()
    }
}

/// Move the element at `from` so it lands at `to`'s pre-move index.
///
/// List-splice semantics: every element between the two positions shifts by
/// one. Out-of-range indices leave the slice untouched and return `false`.
pub fn splice_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from == to {
        return true;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(layout: &Layout) -> Vec<String> {
        layout.widgets.iter().map(|p| p.i.to_string()).collect()
    }

    #[test]
    fn placement_visibility_defaults_to_visible() {
        let mut placement = WidgetPlacement::new("NET_WORTH");
        assert!(placement.is_visible());
        placement.visible = None;
        assert!(placement.is_visible());
        assert!(!placement.hidden().is_visible());
    }

    #[test]
    fn seed_layout_is_default() {
        let layout = Layout::seed(Timestamp(10));
        assert!(layout.is_default);
        assert_eq!(layout.id, "default");
        assert!(layout.contains_widget("NET_WORTH"));
        assert_eq!(layout.created_at, Timestamp(10));
    }

    #[test]
    fn splice_move_forward_shifts_between() {
        let mut items = vec!['A', 'B', 'C'];
        assert!(splice_move(&mut items, 0, 2));
        assert_eq!(items, vec!['B', 'C', 'A']);
    }

    #[test]
    fn splice_move_backward_shifts_between() {
        let mut items = vec!['B', 'C', 'A'];
        assert!(splice_move(&mut items, 2, 0));
        assert_eq!(items, vec!['A', 'B', 'C']);
    }

    #[test]
    fn splice_move_out_of_range_is_noop() {
        let mut items = vec![1, 2];
        assert!(!splice_move(&mut items, 0, 5));
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut layout = Layout::new("x", "X", Timestamp(0)).with_widgets([
            WidgetPlacement::new("A").with_size(WidgetSize::Full),
            WidgetPlacement::new("B"),
            WidgetPlacement::new("A"),
        ]);
        assert_eq!(layout.dedupe_widgets(), 1);
        assert_eq!(ids(&layout), vec!["A", "B"]);
        assert_eq!(layout.widgets[0].size_override, Some(WidgetSize::Full));
    }

    #[test]
    fn serde_uses_camel_case_wire_names() {
        let layout = Layout::new("l1", "Mine", Timestamp(7))
            .with_widgets([WidgetPlacement::new("A").with_size(WidgetSize::Wide)]);
        let json = serde_json::to_string(&layout).unwrap();
        assert!(json.contains("\"isDefault\":false"));
        assert!(json.contains("\"sizeOverride\":\"wide\""));
        assert!(json.contains("\"createdAt\":7"));
    }

    #[test]
    fn serde_missing_optional_fields_default() {
        let json = r#"{"id": "l2", "name": "Bare", "widgets": [{"i": "NET_WORTH"}]}"#;
        let layout: Layout = serde_json::from_str(json).unwrap();
        assert!(!layout.is_default);
        assert!(layout.description.is_empty());
        assert_eq!(layout.widgets[0].visible, None);
        assert!(layout.widgets[0].is_visible());
    }
}
