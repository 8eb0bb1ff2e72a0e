#![forbid(unsafe_code)]

//! Core data model for the Onyx Central dashboard.
//!
//! This crate holds the vocabulary every other Onyx crate speaks:
//!
//! - [`WidgetSize`] and [`GridSpan`] - the fixed column-span categories of the
//!   12-column dashboard grid.
//! - [`WidgetCatalog`] - the static registry of known widgets.
//! - [`Layout`] and [`WidgetPlacement`] - named, ordered widget arrangements.
//! - [`Clock`] - injectable wall-clock source for layout timestamps.
//!
//! # Role in Onyx
//! `onyx-core` has no behavior beyond lookups and small invariant helpers.
//! Mutation rules live in `onyx-layout`; background synchronization lives in
//! `onyx-runtime`.

pub mod catalog;
pub mod clock;
pub mod layout;
pub mod size;

pub use catalog::{CatalogEntry, WidgetCatalog, WidgetCategory, WidgetId};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use layout::{Layout, LayoutId, WidgetPlacement, splice_move};
pub use size::{Breakpoint, GRID_COLUMNS, GridSpan, ParseWidgetSizeError, WidgetSize};
