//! Size categories and their column spans on the 12-column grid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of columns in the dashboard grid.
pub const GRID_COLUMNS: u8 = 12;

/// Column-span category of a widget.
///
/// A placement either inherits the catalog size of its widget or carries an
/// explicit override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetSize {
    /// Compact KPI tile, a quarter row.
    Kpi,
    /// Half row.
    #[default]
    Half,
    /// Narrow side column, a third of a row.
    Sidebar,
    /// Two thirds of a row.
    Wide,
    /// Whole row.
    Full,
}

impl WidgetSize {
    /// Every size category, narrowest first.
    pub const ALL: [Self; 5] = [Self::Kpi, Self::Sidebar, Self::Half, Self::Wide, Self::Full];

    /// Columns occupied at the widest breakpoint.
    #[must_use]
    pub const fn columns(self) -> u8 {
        match self {
            Self::Kpi => 3,
            Self::Half => 6,
            Self::Sidebar => 4,
            Self::Wide => 8,
            Self::Full => GRID_COLUMNS,
        }
    }

    /// Stable lowercase name used in payloads and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kpi => "kpi",
            Self::Half => "half",
            Self::Sidebar => "sidebar",
            Self::Wide => "wide",
            Self::Full => "full",
        }
    }

    /// Resolve the responsive span for this size.
    #[must_use]
    pub const fn span(self) -> GridSpan {
        GridSpan::for_size(self)
    }
}

impl fmt::Display for WidgetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a size name is not one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWidgetSizeError {
    pub input: String,
}

impl fmt::Display for ParseWidgetSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown widget size {:?} (expected kpi, half, sidebar, wide or full)",
            self.input
        )
    }
}

impl std::error::Error for ParseWidgetSizeError {}

impl FromStr for WidgetSize {
    type Err = ParseWidgetSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kpi" => Ok(Self::Kpi),
            "half" => Ok(Self::Half),
            "sidebar" => Ok(Self::Sidebar),
            "wide" => Ok(Self::Wide),
            "full" => Ok(Self::Full),
            _ => Err(ParseWidgetSizeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Viewport width classes the grid responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    /// Phones; every widget takes the full row.
    Narrow,
    /// Tablets; small widgets pair up, larger ones take the row.
    Medium,
    /// Desktop; the full span table applies.
    #[default]
    Wide,
}

/// Responsive column span of one grid item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpan {
    pub narrow: u8,
    pub medium: u8,
    pub wide: u8,
}

impl GridSpan {
    /// Span table for a size category.
    #[must_use]
    pub const fn for_size(size: WidgetSize) -> Self {
        let medium = match size {
            WidgetSize::Kpi | WidgetSize::Half => 6,
            WidgetSize::Sidebar | WidgetSize::Wide | WidgetSize::Full => GRID_COLUMNS,
        };
        Self {
            narrow: GRID_COLUMNS,
            medium,
            wide: size.columns(),
        }
    }

    /// Columns occupied at the given breakpoint.
    #[must_use]
    pub const fn at(self, breakpoint: Breakpoint) -> u8 {
        match breakpoint {
            Breakpoint::Narrow => self.narrow,
            Breakpoint::Medium => self.medium,
            Breakpoint::Wide => self.wide,
        }
    }

    /// Span as a fraction label at the wide breakpoint, e.g. `8/12`.
    #[must_use]
    pub fn fraction(self) -> String {
        format!("{}/{}", self.wide, GRID_COLUMNS)
    }

    /// Responsive column-span class string, e.g.
    /// `col-span-12 md:col-span-6 lg:col-span-3`.
    #[must_use]
    pub fn class_name(self) -> String {
        format!(
            "col-span-{} md:col-span-{} lg:col-span-{}",
            self.narrow, self.medium, self.wide
        )
    }
}
