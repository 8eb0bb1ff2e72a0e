#![forbid(unsafe_code)]

//! Headless Onyx session driver.
//!
//! Builds a [`DashboardSession`] against an in-memory remote, replays a drag
//! script (or a built-in scenario), and prints the resulting grid as JSON.
//!
//! # Running
//!
//! ```sh
//! cargo run -p onyx-harness -- [CONFIG.toml|CONFIG.json] [SCRIPT.jsonl]
//! ```
//!
//! Each script line is one JSON drag event, for example:
//!
//! ```json
//! {"event":"drag_start","source":{"kind":"gallery","id":"MEAL_PLAN"}}
//! {"event":"drop","target":{"kind":"zone","id":"half-split"},"payload":null}
//! ```
//!
//! The script runs in edit mode on the active layout.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: overrides `logging.filter`
//! - `ONYX_HARNESS_CONFIG`: config path when none is given on the command line

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use onyx::prelude::*;
use onyx::{Breakpoint, GridItem, InMemoryRemote, WidgetCategory, ZoneId};
use serde::Serialize;

#[derive(Serialize)]
struct Report {
    active_layout: String,
    revision: u64,
    breakpoint: Breakpoint,
    rows: Vec<Vec<ReportItem>>,
    sync: SyncReport,
}

#[derive(Serialize)]
struct ReportItem {
    id: String,
    label: String,
    category: WidgetCategory,
    size: WidgetSize,
    span: String,
    dimmed: bool,
}

impl From<&GridItem> for ReportItem {
    fn from(item: &GridItem) -> Self {
        Self {
            id: item.id.to_string(),
            label: item.label.clone(),
            category: item.category,
            size: item.size,
            span: item.span.fraction(),
            dimmed: item.dimmed,
        }
    }
}

#[derive(Serialize)]
struct SyncReport {
    pushes_succeeded: u64,
    pushes_failed: u64,
    remote_pushes: usize,
    remote_active_pushes: usize,
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("ONYX_HARNESS_CONFIG").map(PathBuf::from))
}

fn load_script(path: &Path) -> onyx::Result<Vec<DragEvent>> {
    let file = std::fs::File::open(path)?;
    let mut events = Vec::new();
    for (line_no, line) in io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}:{}: {err}", path.display(), line_no + 1),
            )
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Net worth and monthly flow, then goals at full width, flow hidden, and a
/// forecast dropped from the gallery onto the half-split zone.
fn builtin_script(session: &mut DashboardSession) {
    let layout = session.create_layout("Harness", "Built-in scenario", None);
    tracing::info!(layout = %layout, "running built-in scenario");
    for id in ["NET_WORTH", "MONTHLY_FLOW", "ACTIVE_GOALS"] {
        session.add_widget(id);
    }
    session.change_widget_size("ACTIVE_GOALS", WidgetSize::Full);
    session.toggle_widget_visibility("MONTHLY_FLOW");

    let forecast = DragPayload::gallery("CASH_FLOW_FORECAST");
    session.handle_drag(&DragEvent::DragStart {
        source: forecast.clone(),
    });
    session.handle_drag(&DragEvent::DragEnter {
        target: DropTarget::Zone(ZoneId::from("half-split")),
    });
    session.handle_drag(&DragEvent::Drop {
        target: DropTarget::Zone(ZoneId::from("half-split")),
        payload: Some(forecast.encode()),
    });
}

fn main() -> onyx::Result<()> {
    let config = match config_path() {
        Some(path) => OnyxConfig::load(path)?,
        None => OnyxConfig::default(),
    };
    onyx::init_tracing(&config.logging);

    let script = match std::env::args_os().nth(2).map(PathBuf::from) {
        Some(path) => Some(load_script(&path)?),
        None => None,
    };

    let remote = Arc::new(InMemoryRemote::new());
    let mut session = DashboardSession::builder(config)
        .remote(remote.clone())
        .build();
    session.start();
    session.set_edit_mode(true);

    match script {
        Some(events) => {
            for event in &events {
                let transition = session.handle_drag(event);
                tracing::debug!(?transition, "script event applied");
            }
        }
        None => builtin_script(&mut session),
    }
    session.set_edit_mode(false);

    let plan = session.grid();
    let rows = plan
        .rows(session.breakpoint())
        .into_iter()
        .map(|row| row.items.into_iter().map(ReportItem::from).collect())
        .collect();
    let status = session.sync().status();
    let report = Report {
        active_layout: session.store().active_layout_id().to_string(),
        revision: session.store().revision(),
        breakpoint: session.breakpoint(),
        rows,
        sync: SyncReport {
            pushes_succeeded: status.pushes_succeeded,
            pushes_failed: status.pushes_failed,
            remote_pushes: remote.push_count(),
            remote_active_pushes: remote.active_push_count(),
        },
    };
    session.end();

    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
