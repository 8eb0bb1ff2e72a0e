#![forbid(unsafe_code)]

//! Layout store, grid placement and drag/drop for the Onyx dashboard.
//!
//! - [`store`]: named layouts and their placements, mutated atomically.
//! - [`grid`]: pure planning from placements to an ordered, sized grid.
//! - [`drag`]: gesture state machine emitting [`drag::LayoutCommand`]s.
//! - [`snapshot`]: versioned persisted form of a layout set.

pub mod drag;
pub mod grid;
pub mod order;
pub mod render;
pub mod snapshot;
pub mod store;
pub mod zone;

pub use drag::{
    DragCancelReason, DragController, DragEffect, DragEvent, DragNoopReason, DragPayload,
    DragSourceKind, DragState, DragTransition, DropTarget, LayoutCommand, PayloadError,
};
pub use grid::{GridItem, GridPlan, GridQuery, GridRow, plan_grid};
pub use order::WidgetOrder;
pub use render::{RenderedWidget, RendererRegistry, WidgetRenderer};
pub use snapshot::{
    LAYOUT_SET_SCHEMA_VERSION, LayoutSetSnapshot, MigrationResult, SnapshotMetadata,
    SnapshotMigrationError, SnapshotValidationError, migrate_layout_set, needs_migration,
};
pub use store::{LayoutStore, StoreNoopReason, StoreOutcome, UNTITLED_LAYOUT_NAME};
pub use zone::{DropZone, ZoneId, ZoneSet};
