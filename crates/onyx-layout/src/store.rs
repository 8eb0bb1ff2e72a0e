//! The layout store: single source of truth for layouts and the active layout.
//!
//! Every mutation is atomic and leaves these invariants intact:
//!
//! - at least one layout exists;
//! - exactly one layout is active, and it exists;
//! - default layouts are never renamed or deleted;
//! - widget ids are unique within each layout.
//!
//! Invalid requests are not errors. They return
//! [`StoreOutcome::Noop`] with a reason and leave the store untouched.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use onyx_core::{
    Clock, Layout, LayoutId, WidgetCatalog, WidgetId, WidgetPlacement, WidgetSize, splice_move,
};

/// Name given to layouts created with a blank name.
pub const UNTITLED_LAYOUT_NAME: &str = "Untitled Layout";

/// Why a store request left the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreNoopReason {
    UnknownLayout,
    NoActiveLayout,
    InvalidLayoutId,
    DefaultLayoutProtected,
    LastLayout,
    BlankName,
    WidgetAlreadyPresent,
    WidgetNotFound,
    Unchanged,
}

impl fmt::Display for StoreNoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownLayout => "layout does not exist",
            Self::NoActiveLayout => "no active layout",
            Self::InvalidLayoutId => "layout id is empty",
            Self::DefaultLayoutProtected => "default layouts cannot be renamed or deleted",
            Self::LastLayout => "the last remaining layout cannot be deleted",
            Self::BlankName => "layout name is blank",
            Self::WidgetAlreadyPresent => "widget is already placed",
            Self::WidgetNotFound => "widget is not placed in the active layout",
            Self::Unchanged => "request matches current state",
        };
        f.write_str(text)
    }
}

/// Result of one store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Applied,
    Noop(StoreNoopReason),
}

impl StoreOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Owner of all layouts for one user session.
pub struct LayoutStore {
    catalog: Arc<WidgetCatalog>,
    clock: Arc<dyn Clock>,
    layouts: Vec<Layout>,
    active: LayoutId,
    revision: u64,
    id_sequence: u64,
}

impl fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutStore")
            .field("layouts", &self.layouts.len())
            .field("active", &self.active)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl LayoutStore {
    /// Create a store holding only the built-in default layout.
    pub fn new(catalog: Arc<WidgetCatalog>, clock: Arc<dyn Clock>) -> Self {
        let seed = Layout::seed(clock.now());
        let active = seed.id.clone();
        Self {
            catalog,
            clock,
            layouts: vec![seed],
            active,
            revision: 0,
            id_sequence: 0,
        }
    }

    /// Create a store from an explicit layout list.
    ///
    /// The input is repaired rather than rejected: layouts with empty or
    /// repeated ids are dropped, repeated widget ids inside a layout are
    /// collapsed, an empty list is replaced by the seed layout, and a missing
    /// or dangling `active` falls back to the default layout (or the first).
    pub fn with_layouts(
        catalog: Arc<WidgetCatalog>,
        clock: Arc<dyn Clock>,
        layouts: impl IntoIterator<Item = Layout>,
        active: Option<LayoutId>,
    ) -> Self {
        let mut kept: Vec<Layout> = Vec::new();
        for mut layout in layouts {
            if layout.id.is_empty() || kept.iter().any(|l| l.id == layout.id) {
                tracing::debug!(
                    target: "onyx.store",
                    layout_id = %layout.id,
                    "dropping layout with empty or repeated id"
                );
                continue;
            }
            layout.dedupe_widgets();
            kept.push(layout);
        }
        if kept.is_empty() {
            kept.push(Layout::seed(clock.now()));
        }

        let mut store = Self {
            catalog,
            clock,
            active: kept[0].id.clone(),
            layouts: kept,
            revision: 0,
            id_sequence: 0,
        };
        store.active = match active {
            Some(id) if store.layout(id.as_str()).is_some() => id,
            _ => store.fallback_active(),
        };
        store
    }

    // ---------------------------------------------------------------------
    // Read API
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn catalog(&self) -> &Arc<WidgetCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    #[must_use]
    pub fn layout(&self, id: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.id.as_str() == id)
    }

    #[must_use]
    pub fn active_layout_id(&self) -> &LayoutId {
        &self.active
    }

    #[must_use]
    pub fn active_layout(&self) -> Option<&Layout> {
        self.layout(self.active.as_str())
    }

    /// Widget ids placed in the active layout, in native order.
    #[must_use]
    pub fn placed_widget_ids(&self) -> Vec<WidgetId> {
        self.active_layout()
            .map(Layout::widget_ids)
            .unwrap_or_default()
    }

    /// Monotonic count of applied mutations.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Hash over `{id, name, widgets}` of every layout, in list order.
    ///
    /// Timestamps, descriptions and the active id are deliberately left out:
    /// this is the replication fingerprint, not a full state hash.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.layouts.len().hash(&mut hasher);
        for layout in &self.layouts {
            layout.id.hash(&mut hasher);
            layout.name.hash(&mut hasher);
            layout.widgets.hash(&mut hasher);
        }
        hasher.finish()
    }

    // ---------------------------------------------------------------------
    // Layout-level mutations
    // ---------------------------------------------------------------------

    /// Insert or replace a layout by id.
    ///
    /// A replaced layout keeps its list position. A default layout stays
    /// default and keeps its name even if the incoming copy says otherwise.
    pub fn save_layout(&mut self, mut layout: Layout) -> StoreOutcome {
        if layout.id.is_empty() {
            return self.noop("save_layout", StoreNoopReason::InvalidLayoutId);
        }
        let now = self.clock.now();
        layout.dedupe_widgets();
        layout.updated_at = now;

        match self.layouts.iter().position(|l| l.id == layout.id) {
            Some(idx) => {
                let existing = &self.layouts[idx];
                if existing.is_default {
                    layout.is_default = true;
                    layout.name = existing.name.clone();
                }
                if layout.created_at == onyx_core::Timestamp::EPOCH {
                    layout.created_at = existing.created_at;
                }
                tracing::debug!(
                    target: "onyx.store",
                    layout_id = %layout.id,
                    widgets = layout.widgets.len(),
                    "layout replaced"
                );
                self.layouts[idx] = layout;
            }
            None => {
                if layout.created_at == onyx_core::Timestamp::EPOCH {
                    layout.created_at = now;
                }
                tracing::debug!(
                    target: "onyx.store",
                    layout_id = %layout.id,
                    widgets = layout.widgets.len(),
                    "layout appended"
                );
                self.layouts.push(layout);
            }
        }
        self.bump()
    }

    pub fn set_active_layout(&mut self, id: &str) -> StoreOutcome {
        if self.layout(id).is_none() {
            return self.noop("set_active_layout", StoreNoopReason::UnknownLayout);
        }
        if self.active.as_str() == id {
            return self.noop("set_active_layout", StoreNoopReason::Unchanged);
        }
        tracing::debug!(target: "onyx.store", from = %self.active, to = id, "active layout changed");
        self.active = LayoutId::new(id);
        self.bump()
    }

    /// Copy a layout under a fresh id. The active layout does not change.
    pub fn duplicate_layout(&mut self, id: &str) -> Option<LayoutId> {
        let Some(source) = self.layout(id) else {
            self.noop("duplicate_layout", StoreNoopReason::UnknownLayout);
            return None;
        };
        let name = format!("Copy of {}", source.name);
        let description = source.description.clone();
        let widgets = source.widgets.clone();

        let now = self.clock.now();
        let new_id = self.fresh_layout_id();
        let copy = Layout::new(new_id.clone(), name, now)
            .with_description(description)
            .with_widgets(widgets);
        tracing::debug!(target: "onyx.store", source = id, copy = %new_id, "layout duplicated");
        self.layouts.push(copy);
        self.bump();
        Some(new_id)
    }

    pub fn rename_layout(&mut self, id: &str, name: &str) -> StoreOutcome {
        let name = name.trim();
        let Some(idx) = self.index_of(id) else {
            return self.noop("rename_layout", StoreNoopReason::UnknownLayout);
        };
        if self.layouts[idx].is_default {
            return self.noop("rename_layout", StoreNoopReason::DefaultLayoutProtected);
        }
        if name.is_empty() {
            return self.noop("rename_layout", StoreNoopReason::BlankName);
        }
        if self.layouts[idx].name == name {
            return self.noop("rename_layout", StoreNoopReason::Unchanged);
        }
        let now = self.clock.now();
        let layout = &mut self.layouts[idx];
        layout.name = name.to_string();
        layout.updated_at = now;
        self.bump()
    }

    pub fn set_layout_description(&mut self, id: &str, description: &str) -> StoreOutcome {
        let Some(idx) = self.index_of(id) else {
            return self.noop("set_layout_description", StoreNoopReason::UnknownLayout);
        };
        let description = description.trim();
        if self.layouts[idx].description == description {
            return self.noop("set_layout_description", StoreNoopReason::Unchanged);
        }
        let now = self.clock.now();
        let layout = &mut self.layouts[idx];
        layout.description = description.to_string();
        layout.updated_at = now;
        self.bump()
    }

    /// Delete a layout. Deleting the active layout activates the default
    /// layout, or the first remaining one.
    pub fn delete_layout(&mut self, id: &str) -> StoreOutcome {
        let Some(idx) = self.index_of(id) else {
            return self.noop("delete_layout", StoreNoopReason::UnknownLayout);
        };
        if self.layouts[idx].is_default {
            return self.noop("delete_layout", StoreNoopReason::DefaultLayoutProtected);
        }
        if self.layouts.len() <= 1 {
            return self.noop("delete_layout", StoreNoopReason::LastLayout);
        }
        let removed = self.layouts.remove(idx);
        if removed.id == self.active {
            self.active = self.fallback_active();
            tracing::debug!(
                target: "onyx.store",
                deleted = %removed.id,
                active = %self.active,
                "active layout deleted; fell back"
            );
        }
        self.bump()
    }

    /// Create a layout, optionally copying widgets from `from`, and make it
    /// active. A blank name becomes [`UNTITLED_LAYOUT_NAME`].
    pub fn create_layout(&mut self, name: &str, description: &str, from: Option<&str>) -> LayoutId {
        let name = match name.trim() {
            "" => UNTITLED_LAYOUT_NAME,
            trimmed => trimmed,
        };
        let widgets = from
            .and_then(|source| self.layout(source))
            .map(|source| source.widgets.clone())
            .unwrap_or_default();

        let now = self.clock.now();
        let id = self.fresh_layout_id();
        let layout = Layout::new(id.clone(), name, now)
            .with_description(description.trim())
            .with_widgets(widgets);
        tracing::debug!(
            target: "onyx.store",
            layout_id = %id,
            from = from.unwrap_or("-"),
            "layout created"
        );
        self.layouts.push(layout);
        self.active = id.clone();
        self.bump();
        id
    }

    // ---------------------------------------------------------------------
    // Widget-level mutations on the active layout
    // ---------------------------------------------------------------------

    /// Append a fresh visible placement to the active layout.
    ///
    /// Idempotent: an already placed widget is left as is. Returns the id of
    /// the created placement so callers can configure it immediately.
    pub fn add_widget_to_layout(&mut self, widget: impl Into<WidgetId>) -> Option<WidgetId> {
        let widget = widget.into();
        if !self.catalog.contains(widget.as_str()) {
            tracing::debug!(
                target: "onyx.store",
                widget = %widget,
                "placing widget that is not in the catalog"
            );
        }
        let created = widget.clone();
        let outcome = self.mutate_active("add_widget_to_layout", move |layout| {
            if layout.contains_widget(widget.as_str()) {
                return StoreOutcome::Noop(StoreNoopReason::WidgetAlreadyPresent);
            }
            layout.widgets.push(WidgetPlacement::new(widget));
            StoreOutcome::Applied
        });
        outcome.is_applied().then_some(created)
    }

    /// Add a widget and apply its size in one step.
    ///
    /// If the widget is already placed only the size is applied.
    pub fn insert_widget(
        &mut self,
        widget: impl Into<WidgetId>,
        size: Option<WidgetSize>,
    ) -> StoreOutcome {
        let widget = widget.into();
        self.mutate_active("insert_widget", move |layout| {
            match (layout.placement_mut(widget.as_str()), size) {
                (Some(placement), Some(size)) if placement.size_override != Some(size) => {
                    placement.size_override = Some(size);
                    StoreOutcome::Applied
                }
                (Some(_), Some(_)) => StoreOutcome::Noop(StoreNoopReason::Unchanged),
                (Some(_), None) => StoreOutcome::Noop(StoreNoopReason::WidgetAlreadyPresent),
                (None, size) => {
                    let mut placement = WidgetPlacement::new(widget);
                    placement.size_override = size;
                    layout.widgets.push(placement);
                    StoreOutcome::Applied
                }
            }
        })
    }

    pub fn remove_widget_from_layout(&mut self, widget: &str) -> StoreOutcome {
        self.mutate_active("remove_widget_from_layout", |layout| {
            match layout.position(widget) {
                Some(idx) => {
                    layout.widgets.remove(idx);
                    StoreOutcome::Applied
                }
                None => StoreOutcome::Noop(StoreNoopReason::WidgetNotFound),
            }
        })
    }

    /// Flip visibility of a placement; an unset flag counts as visible.
    pub fn toggle_widget_visibility(&mut self, widget: &str) -> StoreOutcome {
        self.mutate_active("toggle_widget_visibility", |layout| {
            match layout.placement_mut(widget) {
                Some(placement) => {
                    placement.visible = Some(!placement.is_visible());
                    StoreOutcome::Applied
                }
                None => StoreOutcome::Noop(StoreNoopReason::WidgetNotFound),
            }
        })
    }

    /// Override the size of a placement, creating the placement if needed.
    pub fn change_widget_size(&mut self, widget: &str, size: WidgetSize) -> StoreOutcome {
        self.mutate_active("change_widget_size", |layout| {
            match layout.placement_mut(widget) {
                Some(placement) if placement.size_override == Some(size) => {
                    StoreOutcome::Noop(StoreNoopReason::Unchanged)
                }
                Some(placement) => {
                    placement.size_override = Some(size);
                    StoreOutcome::Applied
                }
                None => {
                    layout
                        .widgets
                        .push(WidgetPlacement::new(widget).with_size(size));
                    StoreOutcome::Applied
                }
            }
        })
    }

    /// Move `from` to `to`'s position in the active layout (list splice).
    pub fn move_widget(&mut self, from: &str, to: &str) -> StoreOutcome {
        self.mutate_active("move_widget", |layout| {
            match (layout.position(from), layout.position(to)) {
                (Some(a), Some(b)) if a == b => StoreOutcome::Noop(StoreNoopReason::Unchanged),
                (Some(a), Some(b)) => {
                    splice_move(&mut layout.widgets, a, b);
                    StoreOutcome::Applied
                }
                _ => StoreOutcome::Noop(StoreNoopReason::WidgetNotFound),
            }
        })
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn index_of(&self, id: &str) -> Option<usize> {
        self.layouts.iter().position(|l| l.id.as_str() == id)
    }

    /// Default layout if present, else the first layout.
    fn fallback_active(&self) -> LayoutId {
        self.layouts
            .iter()
            .find(|l| l.is_default)
            .or_else(|| self.layouts.first())
            .map(|l| l.id.clone())
            .unwrap_or_else(|| self.active.clone())
    }

    fn fresh_layout_id(&mut self) -> LayoutId {
        let millis = self.clock.now().millis();
        loop {
            self.id_sequence = self.id_sequence.wrapping_add(1);
            let candidate = format!("layout-{millis}-{}", self.id_sequence);
            if self.index_of(&candidate).is_none() {
                return LayoutId::new(candidate);
            }
        }
    }

    fn mutate_active(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Layout) -> StoreOutcome,
    ) -> StoreOutcome {
        let now = self.clock.now();
        let Some(idx) = self.index_of(self.active.as_str()) else {
            return self.noop(op, StoreNoopReason::NoActiveLayout);
        };
        let layout = &mut self.layouts[idx];
        match f(layout) {
            StoreOutcome::Applied => {
                layout.updated_at = now;
                tracing::debug!(
                    target: "onyx.store",
                    op,
                    layout_id = %layout.id,
                    widgets = layout.widgets.len(),
                    "active layout mutated"
                );
                self.bump()
            }
            StoreOutcome::Noop(reason) => self.noop(op, reason),
        }
    }

    fn bump(&mut self) -> StoreOutcome {
        self.revision = self.revision.saturating_add(1);
        StoreOutcome::Applied
    }

    fn noop(&self, op: &'static str, reason: StoreNoopReason) -> StoreOutcome {
        tracing::debug!(target: "onyx.store", op, %reason, "request ignored");
        StoreOutcome::Noop(reason)
    }
}
