//! Resize drop zones shown while editing.
//!
//! Each zone is a row template bound to one size category. Dropping a widget
//! on a zone gives it that size.

use std::fmt;

use serde::{Deserialize, Serialize};

use onyx_core::{GRID_COLUMNS, WidgetSize};

/// Stable zone identifier, e.g. `half-split`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A drop target bound to a size category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropZone {
    pub id: ZoneId,
    pub size: WidgetSize,
    pub label: String,
}

impl DropZone {
    #[must_use]
    pub fn new(id: impl Into<String>, size: WidgetSize, label: impl Into<String>) -> Self {
        Self {
            id: ZoneId::new(id),
            size,
            label: label.into(),
        }
    }

    /// Column widths of the preview row: as many slots of this size as fit,
    /// then one filler slot for any remaining columns.
    #[must_use]
    pub fn template(&self) -> Vec<u8> {
        let width = self.size.columns();
        let mut slots = Vec::new();
        let mut used = 0u8;
        while used + width <= GRID_COLUMNS {
            slots.push(width);
            used += width;
        }
        if used < GRID_COLUMNS {
            slots.push(GRID_COLUMNS - used);
        }
        slots
    }
}

/// The zones offered to a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSet {
    zones: Vec<DropZone>,
}

impl Default for ZoneSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl ZoneSet {
    /// One zone per size category.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_zones([
            DropZone::new("kpi-row", WidgetSize::Kpi, "KPI row"),
            DropZone::new("half-split", WidgetSize::Half, "Half split"),
            DropZone::new("sidebar-column", WidgetSize::Sidebar, "Sidebar column"),
            DropZone::new("wide-main", WidgetSize::Wide, "Wide main"),
            DropZone::new("full-row", WidgetSize::Full, "Full row"),
        ])
    }

    /// Build a set; a repeated zone id keeps its first definition.
    #[must_use]
    pub fn from_zones(zones: impl IntoIterator<Item = DropZone>) -> Self {
        let mut set = Self { zones: Vec::new() };
        for zone in zones {
            if set.get(zone.id.as_str()).is_none() {
                set.zones.push(zone);
            }
        }
        set
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DropZone> {
        self.zones.iter().find(|zone| zone.id.as_str() == id)
    }

    #[must_use]
    pub fn for_size(&self, size: WidgetSize) -> Option<&DropZone> {
        self.zones.iter().find(|zone| zone.size == size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DropZone> {
        self.zones.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
