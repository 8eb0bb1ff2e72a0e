#![forbid(unsafe_code)]

//! Session runtime for the Onyx dashboard.
//!
//! - [`session`]: the explicitly scoped [`DashboardSession`] that owns a
//!   user's store, display order, drag controller, sync and storage.
//! - [`sync`]: load-on-mount and debounced background write-back.
//! - [`remote`]: the [`RemoteLayoutService`] seam and an in-memory remote.
//! - [`storage`]: local snapshot persistence.
//! - [`config`] and [`logging`]: ambient setup for binaries.

pub mod cancellation;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{
    ConfigError, DEFAULT_DEBOUNCE_MS, GridConfig, LoggingConfig, OnyxConfig, StorageConfig,
    SyncConfig,
};
pub use debounce::Debouncer;
pub use logging::init_tracing;
pub use remote::{InMemoryRemote, ProfileId, RemoteError, RemoteLayoutService};
pub use session::{DashboardSession, SessionBuilder};
pub use storage::{FileStorage, LayoutStorage, MemoryStorage, StorageError};
pub use sync::{LoadOutcome, SyncAdapter, SyncDecision, SyncSkipReason, SyncStatus};
