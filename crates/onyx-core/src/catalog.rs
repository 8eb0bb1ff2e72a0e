//! Static registry of dashboard widgets.
//!
//! The catalog maps a [`WidgetId`] to its default size, display label, and
//! gallery category. It is built once and never mutated; layouts refer to
//! catalog entries by id only.

use std::borrow::Borrow;
use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::size::WidgetSize;

/// Stable string identifier of a widget, e.g. `NET_WORTH`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for WidgetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for WidgetId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WidgetId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Gallery filter tab a widget belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetCategory {
    Overview,
    Finance,
    Planning,
    Life,
    Insights,
}

impl WidgetCategory {
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::Finance,
        Self::Planning,
        Self::Life,
        Self::Insights,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Finance => "Finance",
            Self::Planning => "Planning",
            Self::Life => "Life",
            Self::Insights => "Insights",
        }
    }
}

/// Static descriptor of one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: WidgetId,
    pub size: WidgetSize,
    pub label: String,
    pub category: WidgetCategory,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(
        id: impl Into<WidgetId>,
        size: WidgetSize,
        label: impl Into<String>,
        category: WidgetCategory,
    ) -> Self {
        Self {
            id: id.into(),
            size,
            label: label.into(),
            category,
        }
    }
}

/// Read-only widget registry.
///
/// Iteration follows registration order, which is also the gallery order.
#[derive(Debug, Clone, Default)]
pub struct WidgetCatalog {
    entries: Vec<CatalogEntry>,
    index: AHashMap<WidgetId, usize>,
}

/// (id, size, label, category) rows of the built-in catalog.
const BUILTIN_WIDGETS: &[(&str, WidgetSize, &str, WidgetCategory)] = &[
    ("KPI_INCOME", WidgetSize::Kpi, "Monthly Income", WidgetCategory::Overview),
    ("KPI_EXPENSES", WidgetSize::Kpi, "Monthly Expenses", WidgetCategory::Overview),
    ("KPI_SAVINGS_RATE", WidgetSize::Kpi, "Savings Rate", WidgetCategory::Overview),
    ("KPI_NET_CHANGE", WidgetSize::Kpi, "Net Change", WidgetCategory::Overview),
    ("NET_WORTH", WidgetSize::Wide, "Net Worth", WidgetCategory::Overview),
    ("MONTHLY_FLOW", WidgetSize::Sidebar, "Monthly Flow", WidgetCategory::Finance),
    ("RECENT_TRANSACTIONS", WidgetSize::Wide, "Recent Transactions", WidgetCategory::Finance),
    ("ACCOUNTS_OVERVIEW", WidgetSize::Sidebar, "Accounts", WidgetCategory::Finance),
    ("BUDGET_PROGRESS", WidgetSize::Half, "Budget Progress", WidgetCategory::Finance),
    ("SPENDING_BY_CATEGORY", WidgetSize::Half, "Spending by Category", WidgetCategory::Finance),
    ("ACTIVE_GOALS", WidgetSize::Half, "Active Goals", WidgetCategory::Planning),
    ("DEBT_PAYOFF", WidgetSize::Half, "Debt Payoff", WidgetCategory::Planning),
    ("CASH_FLOW_FORECAST", WidgetSize::Full, "Cash Flow Forecast", WidgetCategory::Planning),
    ("PANTRY_STATUS", WidgetSize::Half, "Pantry", WidgetCategory::Life),
    ("MEAL_PLAN", WidgetSize::Half, "Meal Plan", WidgetCategory::Life),
    ("UPCOMING_TRIPS", WidgetSize::Sidebar, "Upcoming Trips", WidgetCategory::Life),
    ("AI_INSIGHTS", WidgetSize::Sidebar, "AI Insights", WidgetCategory::Insights),
    ("SPENDING_ANOMALIES", WidgetSize::Half, "Spending Anomalies", WidgetCategory::Insights),
];

impl WidgetCatalog {
    /// Build a catalog from entries; later duplicates of an id are ignored.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            if catalog.index.contains_key(&entry.id) {
                continue;
            }
            catalog.index.insert(entry.id.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    /// The widgets shipped with the dashboard.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_WIDGETS
                .iter()
                .map(|&(id, size, label, category)| CatalogEntry::new(id, size, label, category)),
        )
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&idx| &self.entries[idx])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Catalog default size for `id`, if the widget is known.
    #[must_use]
    pub fn default_size(&self, id: &str) -> Option<WidgetSize> {
        self.get(id).map(|entry| entry.size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one gallery tab; `None` means all tabs.
    pub fn by_category(
        &self,
        category: Option<WidgetCategory>,
    ) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |entry| category.is_none_or(|c| entry.category == c))
    }

    /// Gallery contents: catalog entries not yet placed, filtered by tab.
    pub fn gallery<'a>(
        &'a self,
        placed: &'a [WidgetId],
        category: Option<WidgetCategory>,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.by_category(category)
            .filter(move |entry| !placed.contains(&entry.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contains_known_widgets() {
        let catalog = WidgetCatalog::builtin();
        assert_eq!(catalog.default_size("NET_WORTH"), Some(WidgetSize::Wide));
        assert_eq!(catalog.default_size("MONTHLY_FLOW"), Some(WidgetSize::Sidebar));
        assert_eq!(catalog.default_size("ACTIVE_GOALS"), Some(WidgetSize::Half));
        assert!(!catalog.contains("DOES_NOT_EXIST"));
    }

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = WidgetCatalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_WIDGETS.len());
    }

    #[test]
    fn duplicate_entries_keep_first() {
        let catalog = WidgetCatalog::from_entries([
            CatalogEntry::new("A", WidgetSize::Kpi, "first", WidgetCategory::Finance),
            CatalogEntry::new("A", WidgetSize::Full, "second", WidgetCategory::Life),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("A").unwrap().label, "first");
    }

    #[test]
    fn category_filter_limits_entries() {
        let catalog = WidgetCatalog::builtin();
        assert!(
            catalog
                .by_category(Some(WidgetCategory::Life))
                .all(|e| e.category == WidgetCategory::Life)
        );
        assert_eq!(catalog.by_category(None).count(), catalog.len());
    }

    #[test]
    fn gallery_excludes_placed_widgets() {
        let catalog = WidgetCatalog::builtin();
        let placed = vec![WidgetId::from("NET_WORTH")];
        assert!(catalog.gallery(&placed, None).all(|e| e.id != "NET_WORTH"));
        assert_eq!(catalog.gallery(&placed, None).count(), catalog.len() - 1);
    }

    #[test]
    fn widget_id_compares_with_str() {
        let id = WidgetId::from("NET_WORTH");
        assert_eq!(id, "NET_WORTH");
        assert_eq!(id.to_string(), "NET_WORTH");
    }
}
