//! Persisted layout-set schema v1 with versioning and migration scaffolding.
//!
//! A [`LayoutSetSnapshot`] captures everything a session needs to resume: the
//! layouts, the active layout id, and the drag-maintained widget order.
//!
//! # Schema Versioning Policy
//!
//! - **Additive fields** may be carried in `extensions` without a version bump.
//! - **Breaking changes** require incrementing [`LAYOUT_SET_SCHEMA_VERSION`]
//!   and adding a migration path to [`migrate_layout_set`].
//! - Loaders reject unknown versions with actionable diagnostics.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use onyx_core::{Clock, Layout, LayoutId, WidgetCatalog, WidgetId};

use crate::order::WidgetOrder;
use crate::store::LayoutStore;

/// Current layout-set schema version.
pub const LAYOUT_SET_SCHEMA_VERSION: u16 = 1;

/// Persisted state of one user's layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSetSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub layouts: Vec<Layout>,
    #[serde(default)]
    pub active_layout_id: Option<LayoutId>,
    #[serde(default)]
    pub widget_order: WidgetOrder,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    /// Forward-compatible extension bag.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    LAYOUT_SET_SCHEMA_VERSION
}

impl LayoutSetSnapshot {
    #[must_use]
    pub fn new(layouts: Vec<Layout>, active_layout_id: Option<LayoutId>) -> Self {
        Self {
            schema_version: LAYOUT_SET_SCHEMA_VERSION,
            layouts,
            active_layout_id,
            widget_order: WidgetOrder::default(),
            metadata: SnapshotMetadata::default(),
            extensions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_widget_order(mut self, order: WidgetOrder) -> Self {
        self.widget_order = order;
        self
    }

    /// Validate against schema and the layout-set invariants.
    pub fn validate(&self) -> Result<(), SnapshotValidationError> {
        if self.schema_version != LAYOUT_SET_SCHEMA_VERSION {
            return Err(SnapshotValidationError::UnsupportedVersion {
                found: self.schema_version,
                expected: LAYOUT_SET_SCHEMA_VERSION,
            });
        }
        if self.layouts.is_empty() {
            return Err(SnapshotValidationError::NoLayouts);
        }

        let mut seen: Vec<&LayoutId> = Vec::with_capacity(self.layouts.len());
        for (index, layout) in self.layouts.iter().enumerate() {
            if layout.id.is_empty() {
                return Err(SnapshotValidationError::EmptyLayoutId { index });
            }
            if seen.contains(&&layout.id) {
                return Err(SnapshotValidationError::DuplicateLayoutId {
                    layout_id: layout.id.clone(),
                });
            }
            seen.push(&layout.id);

            let mut widgets: Vec<&WidgetId> = Vec::with_capacity(layout.widgets.len());
            for placement in &layout.widgets {
                if widgets.contains(&&placement.i) {
                    return Err(SnapshotValidationError::DuplicateWidget {
                        layout_id: layout.id.clone(),
                        widget: placement.i.clone(),
                    });
                }
                widgets.push(&placement.i);
            }
        }

        if let Some(active) = &self.active_layout_id
            && !seen.contains(&active)
        {
            return Err(SnapshotValidationError::ActiveLayoutNotFound {
                layout_id: active.clone(),
            });
        }
        Ok(())
    }

    /// Deterministic hash for state diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.schema_version.hash(&mut hasher);
        for layout in &self.layouts {
            layout.id.hash(&mut hasher);
            layout.name.hash(&mut hasher);
            layout.description.hash(&mut hasher);
            layout.is_default.hash(&mut hasher);
            layout.widgets.hash(&mut hasher);
        }
        self.active_layout_id.hash(&mut hasher);
        self.widget_order.ids().hash(&mut hasher);
        for (k, v) in &self.extensions {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Provenance carried alongside the layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Incremented on each save.
    #[serde(default)]
    pub saved_generation: u64,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl SnapshotMetadata {
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn increment_generation(&mut self) {
        self.saved_generation = self.saved_generation.saturating_add(1);
    }
}

/// Errors from snapshot validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotValidationError {
    UnsupportedVersion { found: u16, expected: u16 },
    NoLayouts,
    EmptyLayoutId { index: usize },
    DuplicateLayoutId { layout_id: LayoutId },
    DuplicateWidget { layout_id: LayoutId, widget: WidgetId },
    ActiveLayoutNotFound { layout_id: LayoutId },
}

impl fmt::Display for SnapshotValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported layout-set schema version {found} (expected {expected})"
            ),
            Self::NoLayouts => write!(f, "layout set has no layouts"),
            Self::EmptyLayoutId { index } => write!(f, "layout at index {index} has an empty id"),
            Self::DuplicateLayoutId { layout_id } => {
                write!(f, "layout id {layout_id} appears more than once")
            }
            Self::DuplicateWidget { layout_id, widget } => {
                write!(f, "widget {widget} appears more than once in layout {layout_id}")
            }
            Self::ActiveLayoutNotFound { layout_id } => {
                write!(f, "active layout {layout_id} is not in the layout set")
            }
        }
    }
}

impl std::error::Error for SnapshotValidationError {}

/// Result of migrating a snapshot from an older schema version.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub snapshot: LayoutSetSnapshot,
    pub from_version: u16,
    pub to_version: u16,
    pub warnings: Vec<String>,
}

/// Errors from snapshot migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotMigrationError {
    /// Written by a newer build.
    UnsupportedVersion { version: u16 },
    NoMigrationPath { from: u16, to: u16 },
}

impl fmt::Display for SnapshotMigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported schema version {version} for migration")
            }
            Self::NoMigrationPath { from, to } => {
                write!(f, "no migration path from v{from} to v{to}")
            }
        }
    }
}

impl std::error::Error for SnapshotMigrationError {}

/// Migrate a snapshot to the current schema version.
///
/// v1 is current, so this is the identity for v1 input.
pub fn migrate_layout_set(
    snapshot: LayoutSetSnapshot,
) -> Result<MigrationResult, SnapshotMigrationError> {
    match snapshot.schema_version {
        LAYOUT_SET_SCHEMA_VERSION => Ok(MigrationResult {
            from_version: LAYOUT_SET_SCHEMA_VERSION,
            to_version: LAYOUT_SET_SCHEMA_VERSION,
            warnings: Vec::new(),
            snapshot,
        }),
        v if v > LAYOUT_SET_SCHEMA_VERSION => {
            Err(SnapshotMigrationError::UnsupportedVersion { version: v })
        }
        v => Err(SnapshotMigrationError::NoMigrationPath {
            from: v,
            to: LAYOUT_SET_SCHEMA_VERSION,
        }),
    }
}

#[must_use]
pub fn needs_migration(snapshot: &LayoutSetSnapshot) -> bool {
    snapshot.schema_version != LAYOUT_SET_SCHEMA_VERSION
}

impl LayoutStore {
    /// Capture the store and a widget order as a current-version snapshot.
    #[must_use]
    pub fn snapshot(&self, order: &WidgetOrder) -> LayoutSetSnapshot {
        LayoutSetSnapshot::new(
            self.layouts().to_vec(),
            Some(self.active_layout_id().clone()),
        )
        .with_widget_order(order.clone())
    }

    /// Rebuild a store and widget order from a snapshot.
    ///
    /// The snapshot is migrated first. Structural problems are repaired the
    /// same way [`LayoutStore::with_layouts`] repairs them.
    pub fn from_snapshot(
        catalog: Arc<WidgetCatalog>,
        clock: Arc<dyn Clock>,
        snapshot: LayoutSetSnapshot,
    ) -> Result<(Self, WidgetOrder), SnapshotMigrationError> {
        let migrated = migrate_layout_set(snapshot)?;
        for warning in &migrated.warnings {
            tracing::info!(target: "onyx.store", %warning, "layout set migrated");
        }
        let snapshot = migrated.snapshot;
        if let Err(err) = snapshot.validate() {
            tracing::debug!(target: "onyx.store", %err, "repairing restored layout set");
        }
        let store = Self::with_layouts(
            catalog,
            clock,
            snapshot.layouts,
            snapshot.active_layout_id,
        );
        let mut order = snapshot.widget_order;
        order.reconcile(&store.placed_widget_ids());
        Ok((store, order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::{ManualClock, Timestamp, WidgetPlacement};

    fn sample() -> LayoutSetSnapshot {
        LayoutSetSnapshot::new(
            vec![
                Layout::seed(Timestamp(1)),
                Layout::new("work", "Work", Timestamp(2)).with_widgets([
                    WidgetPlacement::new("NET_WORTH"),
                    WidgetPlacement::new("MEAL_PLAN"),
                ]),
            ],
            Some(LayoutId::from("work")),
        )
    }

    fn restore(snapshot: LayoutSetSnapshot) -> (LayoutStore, WidgetOrder) {
        LayoutStore::from_snapshot(
            Arc::new(WidgetCatalog::builtin()),
            Arc::new(ManualClock::new(0)),
            snapshot,
        )
        .unwrap()
    }

    #[test]
    fn valid_snapshot_passes() {
        assert_eq!(sample().validate(), Ok(()));
        assert!(!needs_migration(&sample()));
    }

    #[test]
    fn validation_rejects_structural_problems() {
        let mut empty = sample();
        empty.layouts.clear();
        assert_eq!(empty.validate(), Err(SnapshotValidationError::NoLayouts));

        let mut dangling = sample();
        dangling.active_layout_id = Some(LayoutId::from("ghost"));
        assert!(matches!(
            dangling.validate(),
            Err(SnapshotValidationError::ActiveLayoutNotFound { .. })
        ));

        let mut repeated = sample();
        repeated.layouts[1]
            .widgets
            .push(WidgetPlacement::new("NET_WORTH"));
        assert!(matches!(
            repeated.validate(),
            Err(SnapshotValidationError::DuplicateWidget { .. })
        ));

        let mut twins = sample();
        twins.layouts.push(Layout::new("work", "Again", Timestamp(3)));
        assert!(matches!(
            twins.validate(),
            Err(SnapshotValidationError::DuplicateLayoutId { .. })
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut future = sample();
        future.schema_version = LAYOUT_SET_SCHEMA_VERSION + 1;
        assert!(needs_migration(&future));
        assert!(matches!(
            future.validate(),
            Err(SnapshotValidationError::UnsupportedVersion { .. })
        ));
        assert_eq!(
            migrate_layout_set(future).unwrap_err(),
            SnapshotMigrationError::UnsupportedVersion {
                version: LAYOUT_SET_SCHEMA_VERSION + 1
            }
        );
    }

    #[test]
    fn older_version_has_no_path() {
        let mut old = sample();
        old.schema_version = 0;
        assert!(matches!(
            migrate_layout_set(old),
            Err(SnapshotMigrationError::NoMigrationPath { from: 0, to: 1 })
        ));
    }

    #[test]
    fn store_round_trips_through_snapshot() {
        let (store, _) = restore(sample());
        let order = WidgetOrder::from_ids([WidgetId::from("MEAL_PLAN")]);
        let snapshot = store.snapshot(&order);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: LayoutSetSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state_hash(), snapshot.state_hash());

        let (restored, restored_order) = restore(parsed);
        assert_eq!(restored.active_layout_id(), &LayoutId::from("work"));
        assert_eq!(restored.content_hash(), store.content_hash());
        let ids: Vec<&str> = restored_order.ids().iter().map(WidgetId::as_str).collect();
        assert_eq!(ids, vec!["MEAL_PLAN", "NET_WORTH"]);
    }

    #[test]
    fn restore_repairs_dangling_active_id() {
        let mut snapshot = sample();
        snapshot.active_layout_id = Some(LayoutId::from("ghost"));
        let (store, _) = restore(snapshot);
        assert_eq!(store.active_layout_id(), &LayoutId::from("default"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{"layouts": [{"id": "a", "name": "A"}]}"#;
        let snapshot: LayoutSetSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.schema_version, LAYOUT_SET_SCHEMA_VERSION);
        assert!(snapshot.widget_order.is_empty());
        assert_eq!(snapshot.validate(), Ok(()));
    }

    #[test]
    fn state_hash_changes_with_order() {
        let a = sample();
        let b = sample().with_widget_order(WidgetOrder::from_ids([WidgetId::from("MEAL_PLAN")]));
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
