#![forbid(unsafe_code)]

//! Onyx Central dashboard layout engine.
//!
//! This crate is the stable surface for applications. It re-exports the
//! common types from the internal crates and offers a prelude for
//! day-to-day use.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use onyx_core::{
    Breakpoint, CatalogEntry, Clock, GRID_COLUMNS, GridSpan, Layout, LayoutId, ManualClock,
    SystemClock, Timestamp, WidgetCatalog, WidgetCategory, WidgetId, WidgetPlacement, WidgetSize,
};

// --- Layout re-exports -----------------------------------------------------

pub use onyx_layout::{
    DragController, DragEvent, DragPayload, DragTransition, DropTarget, DropZone, GridItem,
    GridPlan, GridQuery, LayoutCommand, LayoutSetSnapshot, LayoutStore, PayloadError,
    RendererRegistry, SnapshotMigrationError, SnapshotValidationError, StoreOutcome,
    WidgetOrder, WidgetRenderer, ZoneId, ZoneSet, plan_grid,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use onyx_runtime::{
    ConfigError, DashboardSession, FileStorage, InMemoryRemote, LayoutStorage, LoadOutcome,
    MemoryStorage, OnyxConfig, ProfileId, RemoteError, RemoteLayoutService, SessionBuilder,
    StorageError, SyncStatus, init_tracing,
};

// --- Errors ----------------------------------------------------------------

/// Top-level error type for Onyx applications.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A drag payload could not be decoded.
    Payload(PayloadError),
    /// A persisted layout set has an unsupported schema.
    Snapshot(SnapshotMigrationError),
    #[cfg(feature = "runtime")]
    Config(ConfigError),
    #[cfg(feature = "runtime")]
    Storage(StorageError),
    #[cfg(feature = "runtime")]
    Remote(RemoteError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        Self::Payload(err)
    }
}

impl From<SnapshotMigrationError> for Error {
    fn from(err: SnapshotMigrationError) -> Self {
        Self::Snapshot(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "runtime")]
impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

#[cfg(feature = "runtime")]
impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

/// Standard result type for Onyx APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DragEvent, DragPayload, DropTarget, Error, GridPlan, Layout, LayoutId, LayoutStore,
        Result, WidgetCatalog, WidgetId, WidgetSize,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{DashboardSession, OnyxConfig};

    pub use crate::{core, layout};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use onyx_core as core;
pub use onyx_layout as layout;
#[cfg(feature = "runtime")]
pub use onyx_runtime as runtime;
