#![forbid(unsafe_code)]

//! One user's dashboard session.
//!
//! [`DashboardSession`] owns everything that lives for the duration of a
//! session: the [`LayoutStore`], the display [`WidgetOrder`], the
//! [`DragController`], the [`SyncAdapter`] and local storage. It is created
//! with [`SessionBuilder`], started with [`DashboardSession::start`] and torn
//! down with [`DashboardSession::end`] (or by dropping it).
//!
//! Every mutation goes through the session so the follow-up work happens in
//! one place: when the store reports an applied change the session saves a
//! local snapshot and hands the new state to the sync adapter.
//!
//! ```no_run
//! use onyx_runtime::{DashboardSession, OnyxConfig};
//!
//! let mut session = DashboardSession::builder(OnyxConfig::default()).build();
//! session.start();
//! session.set_edit_mode(true);
//! session.add_widget("NET_WORTH");
//! let plan = session.grid();
//! assert!(plan.get("NET_WORTH").is_some());
//! session.end();
//! ```

use std::sync::Arc;

use onyx_core::{
    Breakpoint, CatalogEntry, Clock, Layout, LayoutId, SystemClock, WidgetCatalog,
    WidgetCategory, WidgetId, WidgetSize,
};
use onyx_layout::{
    DragCancelReason, DragController, DragEvent, DragTransition, GridPlan, GridQuery,
    LayoutCommand, LayoutSetSnapshot, LayoutStore, StoreOutcome, WidgetOrder, ZoneSet,
    plan_grid,
};

use crate::config::OnyxConfig;
use crate::remote::RemoteLayoutService;
use crate::storage::{FileStorage, LayoutStorage, MemoryStorage};
use crate::sync::{LoadOutcome, SyncAdapter, SyncStatus};

/// Assembles a [`DashboardSession`] from its collaborators.
///
/// Anything not supplied gets a default: the built-in catalog, the system
/// clock, the standard drop zones, no remote (sync skipped), and file storage
/// at `storage.path` or in-memory storage when no path is configured.
pub struct SessionBuilder {
    config: OnyxConfig,
    catalog: Option<Arc<WidgetCatalog>>,
    clock: Option<Arc<dyn Clock>>,
    remote: Option<Arc<dyn RemoteLayoutService>>,
    storage: Option<Box<dyn LayoutStorage>>,
    zones: Option<ZoneSet>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(config: OnyxConfig) -> Self {
        Self {
            config,
            catalog: None,
            clock: None,
            remote: None,
            storage: None,
            zones: None,
        }
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Arc<WidgetCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: Arc<dyn RemoteLayoutService>) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: impl LayoutStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    #[must_use]
    pub fn zones(mut self, zones: ZoneSet) -> Self {
        self.zones = Some(zones);
        self
    }

    /// Restore local state and wire the session. Nothing touches the remote
    /// until [`DashboardSession::start`].
    #[must_use]
    pub fn build(self) -> DashboardSession {
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(WidgetCatalog::builtin()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let storage: Box<dyn LayoutStorage> = match (self.storage, &self.config.storage.path) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Box::new(FileStorage::new(path.clone())),
            (None, None) => Box::new(MemoryStorage::new()),
        };

        let (store, order, generation) = restore(storage.as_ref(), &catalog, &clock);

        let sync = match self.remote {
            Some(remote) => SyncAdapter::new(remote, self.config.sync.clone()),
            None => SyncAdapter::offline(self.config.sync.clone()),
        };

        DashboardSession {
            store,
            order,
            drag: DragController::new(self.zones.unwrap_or_default()),
            sync,
            storage,
            edit_mode: false,
            category: None,
            breakpoint: self.config.grid.breakpoint,
            generation,
            ended: false,
        }
    }
}

fn restore(
    storage: &dyn LayoutStorage,
    catalog: &Arc<WidgetCatalog>,
    clock: &Arc<dyn Clock>,
) -> (LayoutStore, WidgetOrder, u64) {
    let fresh = || {
        (
            LayoutStore::new(Arc::clone(catalog), Arc::clone(clock)),
            WidgetOrder::new(),
            0,
        )
    };
    match storage.load() {
        Ok(Some(snapshot)) => {
            let generation = snapshot.metadata.saved_generation;
            match LayoutStore::from_snapshot(Arc::clone(catalog), Arc::clone(clock), snapshot) {
                Ok((store, order)) => {
                    tracing::info!(
                        target: "onyx.session",
                        layouts = store.layouts().len(),
                        generation,
                        "restored local layouts"
                    );
                    (store, order, generation)
                }
                Err(err) => {
                    tracing::warn!(target: "onyx.session", %err, "local layouts unusable; starting fresh");
                    fresh()
                }
            }
        }
        Ok(None) => fresh(),
        Err(err) => {
            tracing::warn!(target: "onyx.storage", %err, "failed to read local layouts; starting fresh");
            fresh()
        }
    }
}

/// Explicitly scoped owner of one user's dashboard state.
pub struct DashboardSession {
    store: LayoutStore,
    order: WidgetOrder,
    drag: DragController,
    sync: SyncAdapter,
    storage: Box<dyn LayoutStorage>,
    edit_mode: bool,
    category: Option<WidgetCategory>,
    breakpoint: Breakpoint,
    generation: u64,
    ended: bool,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("store", &self.store)
            .field("order", &self.order)
            .field("drag", &self.drag)
            .field("sync", &self.sync)
            .field("edit_mode", &self.edit_mode)
            .field("category", &self.category)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl DashboardSession {
    #[must_use]
    pub fn builder(config: OnyxConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Pull remote layouts (once) before the user interacts.
    pub fn start(&mut self) -> LoadOutcome {
        let revision = self.store.revision();
        let active = self.store.active_layout_id().clone();
        let outcome = self.sync.load_on_mount(&mut self.store);
        if self.store.revision() != revision {
            self.follow_active_layout(&active);
            self.persist();
        }
        tracing::info!(
            target: "onyx.session",
            layouts = self.store.layouts().len(),
            active = %self.store.active_layout_id(),
            ?outcome,
            "session started"
        );
        outcome
    }

    /// Cancel any drag, drop the pending push and stop the sync worker.
    pub fn end(mut self) -> SyncStatus {
        self.teardown();
        self.sync.status()
    }

    fn teardown(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.drag.force_cancel(DragCancelReason::Programmatic);
        self.sync.shutdown();
        tracing::info!(target: "onyx.session", revision = self.store.revision(), "session ended");
    }

    // -- read API -----------------------------------------------------------

    #[must_use]
    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    #[must_use]
    pub fn order(&self) -> &WidgetOrder {
        &self.order
    }

    #[must_use]
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    #[must_use]
    pub fn sync(&self) -> &SyncAdapter {
        &self.sync
    }

    #[must_use]
    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    #[must_use]
    pub fn category_filter(&self) -> Option<WidgetCategory> {
        self.category
    }

    #[must_use]
    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Grid plan of the active layout under the current mode and filter.
    #[must_use]
    pub fn grid(&self) -> GridPlan {
        let widgets = self
            .store
            .active_layout()
            .map(|layout| layout.widgets.as_slice())
            .unwrap_or_default();
        let query = GridQuery {
            edit_mode: self.edit_mode,
            category: self.category,
        };
        plan_grid(widgets, self.store.catalog(), query, &self.order)
    }

    /// Catalog entries not yet on the active layout, for the current tab.
    #[must_use]
    pub fn gallery(&self) -> Vec<CatalogEntry> {
        let placed = self.store.placed_widget_ids();
        self.store
            .catalog()
            .gallery(&placed, self.category)
            .cloned()
            .collect()
    }

    /// Current state as a persistable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSetSnapshot {
        let mut snapshot = self.store.snapshot(&self.order);
        snapshot.metadata = snapshot
            .metadata
            .with_app_version(env!("CARGO_PKG_VERSION"));
        snapshot.metadata.saved_generation = self.generation;
        snapshot
    }

    // -- modes --------------------------------------------------------------

    /// Toggle edit mode. Leaving it cancels an active drag and flushes the
    /// pending push so edits are not held back.
    pub fn set_edit_mode(&mut self, on: bool) -> Option<DragTransition> {
        if self.edit_mode == on {
            return None;
        }
        self.edit_mode = on;
        tracing::debug!(target: "onyx.session", edit_mode = on, "edit mode changed");
        if on {
            return None;
        }
        let canceled = self.drag.force_cancel(DragCancelReason::EditModeExited);
        self.sync.flush();
        canceled
    }

    pub fn set_category_filter(&mut self, category: Option<WidgetCategory>) {
        self.category = category;
    }

    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.breakpoint = breakpoint;
    }

    /// Push now instead of waiting for the debounce.
    pub fn flush_sync(&mut self) {
        self.sync.flush();
    }

    // -- drag/drop ----------------------------------------------------------

    /// Feed one drag event and execute the command it produces, if any.
    pub fn handle_drag(&mut self, event: &DragEvent) -> DragTransition {
        let transition = self.drag.apply(event, self.edit_mode);
        if let Some(command) = transition.command().cloned() {
            self.execute(&command);
        }
        transition
    }

    /// Apply a layout command. Returns whether anything changed.
    pub fn execute(&mut self, command: &LayoutCommand) -> bool {
        match command {
            LayoutCommand::Reorder { from, to } => self.reorder(from.as_str(), to.as_str()),
            LayoutCommand::Resize { widget, size } => {
                self.change_widget_size(widget.as_str(), *size).is_applied()
            }
            LayoutCommand::Insert { widget, size } => {
                self.insert_widget(widget.clone(), *size).is_applied()
            }
        }
    }

    // -- widget mutations ---------------------------------------------------

    pub fn add_widget(&mut self, widget: impl Into<WidgetId>) -> Option<WidgetId> {
        let widget = widget.into();
        self.commit(move |store| store.add_widget_to_layout(widget))
    }

    pub fn insert_widget(
        &mut self,
        widget: impl Into<WidgetId>,
        size: Option<WidgetSize>,
    ) -> StoreOutcome {
        let widget = widget.into();
        self.commit(move |store| store.insert_widget(widget, size))
    }

    pub fn remove_widget(&mut self, widget: &str) -> StoreOutcome {
        self.commit(|store| store.remove_widget_from_layout(widget))
    }

    pub fn toggle_widget_visibility(&mut self, widget: &str) -> StoreOutcome {
        self.commit(|store| store.toggle_widget_visibility(widget))
    }

    pub fn change_widget_size(&mut self, widget: &str, size: WidgetSize) -> StoreOutcome {
        self.commit(|store| store.change_widget_size(widget, size))
    }

    /// Move `from` to `to`'s slot in both the display order and the active
    /// layout's placements.
    pub fn reorder(&mut self, from: &str, to: &str) -> bool {
        self.order.reconcile(&self.store.placed_widget_ids());
        let reordered = self.order.reorder(from, to);
        let moved = self.commit(|store| store.move_widget(from, to));
        if reordered && !moved.is_applied() {
            self.persist();
        }
        reordered || moved.is_applied()
    }

    // -- layout mutations ---------------------------------------------------

    pub fn save_layout(&mut self, layout: Layout) -> StoreOutcome {
        self.commit(move |store| store.save_layout(layout))
    }

    pub fn set_active_layout(&mut self, id: &str) -> StoreOutcome {
        self.commit(|store| store.set_active_layout(id))
    }

    pub fn duplicate_layout(&mut self, id: &str) -> Option<LayoutId> {
        self.commit(|store| store.duplicate_layout(id))
    }

    pub fn rename_layout(&mut self, id: &str, name: &str) -> StoreOutcome {
        self.commit(|store| store.rename_layout(id, name))
    }

    pub fn set_layout_description(&mut self, id: &str, description: &str) -> StoreOutcome {
        self.commit(|store| store.set_layout_description(id, description))
    }

    pub fn delete_layout(&mut self, id: &str) -> StoreOutcome {
        self.commit(|store| store.delete_layout(id))
    }

    pub fn create_layout(&mut self, name: &str, description: &str, from: Option<&str>) -> LayoutId {
        self.commit(|store| store.create_layout(name, description, from))
    }

    // -- internals ----------------------------------------------------------

    fn commit<T>(&mut self, op: impl FnOnce(&mut LayoutStore) -> T) -> T {
        let revision = self.store.revision();
        let active = self.store.active_layout_id().clone();
        let result = op(&mut self.store);
        if self.store.revision() != revision {
            self.after_change(&active);
        }
        result
    }

    /// A different active layout starts in native order; otherwise an existing
    /// overlay follows the placed ids.
    fn follow_active_layout(&mut self, previous_active: &LayoutId) {
        if self.store.active_layout_id() != previous_active {
            self.order.reset();
        } else if !self.order.is_empty() {
            self.order.reconcile(&self.store.placed_widget_ids());
        }
    }

    fn after_change(&mut self, previous_active: &LayoutId) {
        self.follow_active_layout(previous_active);
        self.persist();
        let decision = self.sync.on_store_changed(&self.store, self.edit_mode);
        tracing::trace!(target: "onyx.session", revision = self.store.revision(), ?decision, "store changed");
    }

    fn persist(&mut self) {
        self.generation = self.generation.saturating_add(1);
        let snapshot = self.snapshot();
        if let Err(err) = self.storage.save(&snapshot) {
            tracing::warn!(target: "onyx.storage", %err, "failed to save layouts locally");
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::ManualClock;
    use onyx_layout::{DragPayload, DropTarget, ZoneId};

    fn session() -> DashboardSession {
        DashboardSession::builder(OnyxConfig::default())
            .clock(Arc::new(ManualClock::new(0)))
            .build()
    }

    fn grid_ids(session: &DashboardSession) -> Vec<String> {
        session.grid().ids().map(ToString::to_string).collect()
    }

    #[test]
    fn fresh_session_has_seed_layout() {
        let session = session();
        assert_eq!(session.store().layouts().len(), 1);
        assert_eq!(session.store().active_layout_id(), &LayoutId::from("default"));
        assert!(!session.edit_mode());
    }

    #[test]
    fn hidden_widgets_show_only_while_editing() {
        let mut session = session();
        session.add_widget("MEAL_PLAN");
        session.toggle_widget_visibility("MEAL_PLAN");
        assert!(!grid_ids(&session).contains(&"MEAL_PLAN".to_string()));
        session.set_edit_mode(true);
        let plan = session.grid();
        assert!(plan.get("MEAL_PLAN").is_some_and(|item| item.dimmed));
    }

    #[test]
    fn leaving_edit_mode_cancels_drag() {
        let mut session = session();
        session.set_edit_mode(true);
        session.handle_drag(&DragEvent::DragStart {
            source: DragPayload::gallery("MEAL_PLAN"),
        });
        assert!(session.drag().is_active());
        let canceled = session.set_edit_mode(false);
        assert!(canceled.is_some());
        assert!(!session.drag().is_active());
        assert_eq!(session.set_edit_mode(false), None);
    }

    #[test]
    fn gallery_drop_on_zone_inserts_sized_widget() {
        let mut session = session();
        session.set_edit_mode(true);
        let before = session.store().revision();
        session.handle_drag(&DragEvent::DragStart {
            source: DragPayload::gallery("CASH_FLOW_FORECAST"),
        });
        let transition = session.handle_drag(&DragEvent::Drop {
            target: DropTarget::Zone(ZoneId::from("wide-main")),
            payload: Some(DragPayload::gallery("CASH_FLOW_FORECAST").encode()),
        });
        assert!(transition.command().is_some());
        assert_eq!(session.store().revision(), before + 1);
        let item = session.grid().get("CASH_FLOW_FORECAST").cloned().unwrap();
        assert_eq!(item.size, WidgetSize::Wide);
        assert!(
            !session
                .gallery()
                .iter()
                .any(|entry| entry.id == "CASH_FLOW_FORECAST")
        );
    }

    #[test]
    fn switching_layout_resets_display_order() {
        let mut session = session();
        let ids = session.store().placed_widget_ids();
        assert!(ids.len() >= 2);
        let (first, last) = (ids[0].to_string(), ids[ids.len() - 1].to_string());
        assert!(session.reorder(&first, &last));
        assert!(!session.order().is_empty());

        let other = session.create_layout("Focus", "", None);
        assert!(session.order().is_empty());
        assert_eq!(session.store().active_layout_id(), &other);
    }

    #[test]
    fn noop_mutation_does_not_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = DashboardSession::builder(OnyxConfig::default())
            .storage(Arc::clone(&storage))
            .build();
        assert_eq!(
            session.delete_layout("default"),
            StoreOutcome::Noop(onyx_layout::StoreNoopReason::DefaultLayoutProtected)
        );
        assert_eq!(storage.save_count(), 0);
        session.add_widget("MEAL_PLAN");
        assert_eq!(storage.save_count(), 1);
        let saved = storage.current().unwrap();
        assert_eq!(saved.metadata.saved_generation, 1);
        assert_eq!(saved.metadata.app_version, env!("CARGO_PKG_VERSION"));
    }
}
