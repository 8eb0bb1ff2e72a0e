//! Grid placement: from a layout's placements to an ordered, sized plan.
//!
//! [`plan_grid`] is a pure function. It never fails; anything inconsistent
//! (an id missing from the catalog, a stale order entry) is left out of the
//! plan.
//!
//! ```text
//! placements ──filter──▶ visible/category subset ──order──▶ ordered ──size──▶ GridPlan
//! ```

use serde::{Deserialize, Serialize};

use onyx_core::{
    Breakpoint, GRID_COLUMNS, GridSpan, WidgetCatalog, WidgetCategory, WidgetId, WidgetPlacement,
    WidgetSize,
};

use crate::order::WidgetOrder;
use crate::render::{RenderedWidget, RendererRegistry};

/// Inputs to a plan besides the placements themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridQuery {
    /// Hidden placements stay in the plan, dimmed, while editing.
    pub edit_mode: bool,
    /// Gallery tab filter; `None` shows every category.
    pub category: Option<WidgetCategory>,
}

impl GridQuery {
    #[must_use]
    pub const fn viewing() -> Self {
        Self {
            edit_mode: false,
            category: None,
        }
    }

    #[must_use]
    pub const fn editing() -> Self {
        Self {
            edit_mode: true,
            category: None,
        }
    }

    #[must_use]
    pub const fn with_category(mut self, category: WidgetCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// One renderable widget with its resolved size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub id: WidgetId,
    pub label: String,
    pub category: WidgetCategory,
    /// Effective size: override, else catalog size.
    pub size: WidgetSize,
    pub span: GridSpan,
    /// Hidden placement shown only because edit mode is on.
    pub dimmed: bool,
}

/// Ordered output of [`plan_grid`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlan {
    pub items: Vec<GridItem>,
}

/// A packed row of the plan at some breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<'a> {
    pub items: Vec<&'a GridItem>,
    pub used_columns: u8,
}

impl GridPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GridItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &WidgetId> {
        self.items.iter().map(|item| &item.id)
    }

    /// Pack items into rows greedily, preserving order. An item that does
    /// not fit in the current row starts a new one.
    #[must_use]
    pub fn rows(&self, breakpoint: Breakpoint) -> Vec<GridRow<'_>> {
        let mut rows: Vec<GridRow<'_>> = Vec::new();
        for item in &self.items {
            let width = item.span.at(breakpoint).min(GRID_COLUMNS);
            match rows.last_mut() {
                Some(row) if row.used_columns + width <= GRID_COLUMNS => {
                    row.items.push(item);
                    row.used_columns += width;
                }
                _ => rows.push(GridRow {
                    items: vec![item],
                    used_columns: width,
                }),
            }
        }
        rows
    }

    /// Render every item that has a registered renderer, in plan order.
    ///
    /// `props` reaches each renderer untouched; items without a renderer
    /// are skipped.
    pub fn render<P: ?Sized, O>(
        &self,
        registry: &RendererRegistry<P, O>,
        props: &P,
    ) -> Vec<RenderedWidget<O>> {
        self.items
            .iter()
            .filter_map(|item| {
                let renderer = registry.get(item.id.as_str())?;
                Some(RenderedWidget {
                    id: item.id.clone(),
                    output: renderer.render(item, props),
                })
            })
            .collect()
    }
}

/// Plan the grid for one layout's placements.
#[must_use]
pub fn plan_grid(
    widgets: &[WidgetPlacement],
    catalog: &WidgetCatalog,
    query: GridQuery,
    order: &WidgetOrder,
) -> GridPlan {
    let filtered: Vec<GridItem> = widgets
        .iter()
        .filter_map(|placement| {
            let entry = catalog.get(placement.i.as_str())?;
            let hidden = !placement.is_visible();
            if hidden && !query.edit_mode {
                return None;
            }
            if query.category.is_some_and(|c| c != entry.category) {
                return None;
            }
            let size = placement.size_override.unwrap_or(entry.size);
            Some(GridItem {
                id: placement.i.clone(),
                label: entry.label.clone(),
                category: entry.category,
                size,
                span: size.span(),
                dimmed: hidden,
            })
        })
        .collect();

    GridPlan {
        items: order.apply(filtered, |item| &item.id),
    }
}
