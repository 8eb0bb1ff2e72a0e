//! Drag/drop gesture controller.
//!
//! A deterministic state machine turning drag events into layout commands.
//! It never touches the layout store; callers apply the emitted
//! [`LayoutCommand`]s.
//!
//! ```text
//! Idle -> Dragging -> (ReorderTargeted | ZoneTargeted | GallerySource) -> Idle
//! ```
//!
//! Three gestures are recognised:
//!
//! - reorder: an existing widget dragged over another widget; the last
//!   hovered widget wins and the reorder is emitted on drag end;
//! - resize: an existing widget dropped on a zone takes the zone's size;
//! - insert: a gallery widget dropped on the grid, a widget, or a zone is
//!   added in one step, sized by the zone if there is one.
//!
//! Every event yields exactly one [`DragTransition`]. Events that cannot
//! apply produce [`DragEffect::Noop`] with a reason and leave state untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use onyx_core::{WidgetId, WidgetSize};

use crate::zone::{DropZone, ZoneId, ZoneSet};

/// Where a dragged widget comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragSourceKind {
    /// A widget already placed in the active layout.
    Existing,
    /// A catalog widget offered by the gallery.
    Gallery,
}

impl DragSourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Gallery => "gallery",
        }
    }
}

/// Tagged drag source, also the payload carried across the drop boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragPayload {
    pub kind: DragSourceKind,
    pub id: WidgetId,
}

impl DragPayload {
    #[must_use]
    pub fn existing(id: impl Into<WidgetId>) -> Self {
        Self {
            kind: DragSourceKind::Existing,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn gallery(id: impl Into<WidgetId>) -> Self {
        Self {
            kind: DragSourceKind::Gallery,
            id: id.into(),
        }
    }

    /// Encode for a drag data carrier, e.g. `{"kind":"gallery","id":"MEAL_PLAN"}`.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::json!({
            "kind": self.kind.as_str(),
            "id": self.id.as_str(),
        })
        .to_string()
    }

    /// Decode a carrier string produced by [`DragPayload::encode`].
    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PayloadError::Empty);
        }
        let payload: Self =
            serde_json::from_str(raw).map_err(|err| PayloadError::Malformed(err.to_string()))?;
        if payload.id.as_str().trim().is_empty() {
            return Err(PayloadError::MissingWidgetId);
        }
        Ok(payload)
    }
}

/// Why a drop payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    Empty,
    MissingWidgetId,
    Malformed(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "drag payload is empty"),
            Self::MissingWidgetId => write!(f, "drag payload has no widget id"),
            Self::Malformed(detail) => write!(f, "malformed drag payload: {detail}"),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Something a drag can hover or drop onto.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    Widget(WidgetId),
    Zone(ZoneId),
    /// The grid background.
    Grid,
}

/// Low-level drag input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    DragStart {
        source: DragPayload,
    },
    DragEnter {
        target: DropTarget,
    },
    DragOver {
        target: DropTarget,
    },
    DragLeave {
        target: DropTarget,
    },
    /// `payload` is the raw carrier string, if the event delivered one.
    Drop {
        target: DropTarget,
        payload: Option<String>,
    },
    DragEnd,
    Cancel,
}

/// Gesture lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: DragPayload,
    },
    ReorderTargeted {
        source: DragPayload,
        target: WidgetId,
    },
    ZoneTargeted {
        source: DragPayload,
        zone: ZoneId,
    },
    GallerySource {
        source: DragPayload,
        over: DropTarget,
    },
}

impl DragState {
    #[must_use]
    pub fn source(&self) -> Option<&DragPayload> {
        match self {
            Self::Idle => None,
            Self::Dragging { source }
            | Self::ReorderTargeted { source, .. }
            | Self::ZoneTargeted { source, .. }
            | Self::GallerySource { source, .. } => Some(source),
        }
    }

    /// The hovered target, if any.
    #[must_use]
    pub fn target(&self) -> Option<DropTarget> {
        match self {
            Self::Idle | Self::Dragging { .. } => None,
            Self::ReorderTargeted { target, .. } => Some(DropTarget::Widget(target.clone())),
            Self::ZoneTargeted { zone, .. } => Some(DropTarget::Zone(zone.clone())),
            Self::GallerySource { over, .. } => Some(over.clone()),
        }
    }
}

/// Layout mutation requested by a finished gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum LayoutCommand {
    /// Splice `from` into `to`'s position.
    Reorder { from: WidgetId, to: WidgetId },
    Resize { widget: WidgetId, size: WidgetSize },
    /// Add a widget and, if given, size it in the same step.
    Insert {
        widget: WidgetId,
        size: Option<WidgetSize>,
    },
}

/// Why a gesture was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    /// A `Cancel` event arrived.
    Event,
    EditModeExited,
    Programmatic,
}

/// Explicit no-op diagnostics for events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    EditModeRequired,
    MalformedPayload,
    MissingPayload,
    PayloadMismatch,
    UnknownZone,
    SameTarget,
    TargetUnchanged,
    TargetMismatch,
    /// Leaving a widget keeps it as the reorder target.
    TargetRetained,
    NotADropTarget,
}

/// Effect emitted by one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started { source: DragPayload },
    Targeted { target: DropTarget },
    TargetCleared,
    Command { command: LayoutCommand },
    /// Drag ended without a command.
    Ended,
    Canceled { reason: DragCancelReason },
    Noop { reason: DragNoopReason },
}

/// One state-machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

impl DragTransition {
    #[must_use]
    pub fn command(&self) -> Option<&LayoutCommand> {
        match &self.effect {
            DragEffect::Command { command } => Some(command),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }
}

type Step = (Option<DragState>, DragEffect);

fn noop(reason: DragNoopReason) -> Step {
    (None, DragEffect::Noop { reason })
}

/// Session-scoped drag/drop state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragController {
    state: DragState,
    zones: ZoneSet,
    transition_counter: u64,
}

impl DragController {
    #[must_use]
    pub fn new(zones: ZoneSet) -> Self {
        Self {
            state: DragState::Idle,
            zones,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// The single zone currently highlighted: only while dragging over it.
    #[must_use]
    pub fn highlighted_zone(&self) -> Option<&DropZone> {
        match &self.state {
            DragState::ZoneTargeted { zone, .. } => self.zones.get(zone.as_str()),
            _ => None,
        }
    }

    /// Reset to `Idle`, returning a `Canceled` transition if a gesture was
    /// active.
    pub fn force_cancel(&mut self, reason: DragCancelReason) -> Option<DragTransition> {
        if !self.is_active() {
            return None;
        }
        let from = std::mem::take(&mut self.state);
        Some(self.record(from, DragEffect::Canceled { reason }))
    }

    /// Apply one event. `edit_mode` gates starting drags and dropping.
    pub fn apply(&mut self, event: &DragEvent, edit_mode: bool) -> DragTransition {
        let (next, effect) = self.step(event, edit_mode);
        let from = match next {
            Some(next) => std::mem::replace(&mut self.state, next),
            None => self.state.clone(),
        };
        self.record(from, effect)
    }

    fn record(&mut self, from: DragState, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state.clone(),
            effect,
        };
        match &transition.effect {
            DragEffect::Command { command } => tracing::debug!(
                target: "onyx.drag",
                transition_id = transition.transition_id,
                ?command,
                "gesture produced layout command"
            ),
            DragEffect::Noop { reason } => tracing::trace!(
                target: "onyx.drag",
                transition_id = transition.transition_id,
                ?reason,
                "drag event ignored"
            ),
            effect => tracing::trace!(
                target: "onyx.drag",
                transition_id = transition.transition_id,
                ?effect,
                "drag transition"
            ),
        }
        transition
    }

    fn step(&self, event: &DragEvent, edit_mode: bool) -> Step {
        match event {
            DragEvent::DragStart { source } => {
                if self.is_active() {
                    return noop(DragNoopReason::ActiveDragAlreadyInProgress);
                }
                if !edit_mode {
                    return noop(DragNoopReason::EditModeRequired);
                }
                (
                    Some(DragState::Dragging {
                        source: source.clone(),
                    }),
                    DragEffect::Started {
                        source: source.clone(),
                    },
                )
            }
            DragEvent::DragEnter { target } | DragEvent::DragOver { target } => self.hover(target),
            DragEvent::DragLeave { target } => self.leave(target),
            DragEvent::Drop { target, payload } => {
                self.drop_on(target, payload.as_deref(), edit_mode)
            }
            DragEvent::DragEnd => match &self.state {
                DragState::Idle => noop(DragNoopReason::IdleWithoutActiveDrag),
                DragState::ReorderTargeted { source, target } => (
                    Some(DragState::Idle),
                    DragEffect::Command {
                        command: LayoutCommand::Reorder {
                            from: source.id.clone(),
                            to: target.clone(),
                        },
                    },
                ),
                _ => (Some(DragState::Idle), DragEffect::Ended),
            },
            DragEvent::Cancel => {
                if self.is_active() {
                    (
                        Some(DragState::Idle),
                        DragEffect::Canceled {
                            reason: DragCancelReason::Event,
                        },
                    )
                } else {
                    noop(DragNoopReason::IdleWithoutActiveDrag)
                }
            }
        }
    }

    fn hover(&self, target: &DropTarget) -> Step {
        let Some(source) = self.state.source() else {
            return noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        if self.state.target().as_ref() == Some(target) {
            return noop(DragNoopReason::TargetUnchanged);
        }
        let source = source.clone();
        let targeted = DragEffect::Targeted {
            target: target.clone(),
        };
        match (target, source.kind) {
            (DropTarget::Zone(zone), _) => {
                if self.zones.get(zone.as_str()).is_none() {
                    return noop(DragNoopReason::UnknownZone);
                }
                (
                    Some(DragState::ZoneTargeted {
                        source,
                        zone: zone.clone(),
                    }),
                    targeted,
                )
            }
            (DropTarget::Widget(widget), DragSourceKind::Existing) if *widget == source.id => {
                if self.state.target().is_some() {
                    (Some(DragState::Dragging { source }), DragEffect::TargetCleared)
                } else {
                    noop(DragNoopReason::SameTarget)
                }
            }
            (DropTarget::Widget(widget), DragSourceKind::Existing) => (
                Some(DragState::ReorderTargeted {
                    source,
                    target: widget.clone(),
                }),
                targeted,
            ),
            (DropTarget::Grid, DragSourceKind::Existing) => noop(DragNoopReason::NotADropTarget),
            (DropTarget::Widget(_) | DropTarget::Grid, DragSourceKind::Gallery) => (
                Some(DragState::GallerySource {
                    source,
                    over: target.clone(),
                }),
                targeted,
            ),
        }
    }

    fn leave(&self, target: &DropTarget) -> Step {
        let Some(source) = self.state.source() else {
            return noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        if self.state.target().as_ref() != Some(target) {
            return noop(DragNoopReason::TargetMismatch);
        }
        if matches!(self.state, DragState::ReorderTargeted { .. }) {
            return noop(DragNoopReason::TargetRetained);
        }
        (
            Some(DragState::Dragging {
                source: source.clone(),
            }),
            DragEffect::TargetCleared,
        )
    }

    fn drop_on(&self, target: &DropTarget, payload: Option<&str>, edit_mode: bool) -> Step {
        if !edit_mode {
            return noop(DragNoopReason::EditModeRequired);
        }
        let session = self.state.source();
        let source = match payload {
            Some(raw) => match DragPayload::decode(raw) {
                Ok(decoded) if session.is_some_and(|s| *s != decoded) => {
                    return noop(DragNoopReason::PayloadMismatch);
                }
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::debug!(target: "onyx.drag", %err, "drop payload rejected");
                    return noop(DragNoopReason::MalformedPayload);
                }
            },
            None => match session {
                Some(source) => source.clone(),
                None => return noop(DragNoopReason::MissingPayload),
            },
        };

        match (target, source.kind) {
            (DropTarget::Zone(zone), kind) => {
                let Some(zone) = self.zones.get(zone.as_str()) else {
                    return noop(DragNoopReason::UnknownZone);
                };
                let command = match kind {
                    DragSourceKind::Existing => LayoutCommand::Resize {
                        widget: source.id,
                        size: zone.size,
                    },
                    DragSourceKind::Gallery => LayoutCommand::Insert {
                        widget: source.id,
                        size: Some(zone.size),
                    },
                };
                (Some(DragState::Idle), DragEffect::Command { command })
            }
            (DropTarget::Widget(_) | DropTarget::Grid, DragSourceKind::Gallery) => (
                Some(DragState::Idle),
                DragEffect::Command {
                    command: LayoutCommand::Insert {
                        widget: source.id,
                        size: None,
                    },
                },
            ),
            (DropTarget::Widget(widget), DragSourceKind::Existing) if *widget == source.id => {
                noop(DragNoopReason::SameTarget)
            }
            // Reorders land on drag end while a gesture is live.
            (DropTarget::Widget(widget), DragSourceKind::Existing) if session.is_some() => (
                Some(DragState::ReorderTargeted {
                    source,
                    target: widget.clone(),
                }),
                DragEffect::Targeted {
                    target: target.clone(),
                },
            ),
            (DropTarget::Widget(widget), DragSourceKind::Existing) => (
                Some(DragState::Idle),
                DragEffect::Command {
                    command: LayoutCommand::Reorder {
                        from: source.id,
                        to: widget.clone(),
                    },
                },
            ),
            (DropTarget::Grid, DragSourceKind::Existing) => noop(DragNoopReason::NotADropTarget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DragController {
        DragController::new(ZoneSet::standard())
    }

    fn widget(id: &str) -> DropTarget {
        DropTarget::Widget(WidgetId::from(id))
    }

    fn zone(id: &str) -> DropTarget {
        DropTarget::Zone(ZoneId::from(id))
    }

    fn start(source: DragPayload) -> DragEvent {
        DragEvent::DragStart { source }
    }

    fn enter(target: DropTarget) -> DragEvent {
        DragEvent::DragEnter { target }
    }

    fn drop_on(target: DropTarget) -> DragEvent {
        DragEvent::Drop {
            target,
            payload: None,
        }
    }

    fn noop_reason(transition: &DragTransition) -> Option<DragNoopReason> {
        match transition.effect {
            DragEffect::Noop { reason } => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn reorder_uses_last_hovered_widget() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        drag.apply(&enter(widget("B")), true);
        drag.apply(&enter(widget("C")), true);
        let end = drag.apply(&DragEvent::DragEnd, true);
        assert_eq!(
            end.command(),
            Some(&LayoutCommand::Reorder {
                from: WidgetId::from("A"),
                to: WidgetId::from("C"),
            })
        );
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn drag_end_without_target_only_clears() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        let end = drag.apply(&DragEvent::DragEnd, true);
        assert_eq!(end.effect, DragEffect::Ended);
        assert!(!drag.is_active());
    }

    #[test]
    fn hovering_own_widget_clears_reorder_target() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        drag.apply(&enter(widget("B")), true);
        let back = drag.apply(&enter(widget("A")), true);
        assert_eq!(back.effect, DragEffect::TargetCleared);
        assert_eq!(drag.apply(&DragEvent::DragEnd, true).effect, DragEffect::Ended);
    }

    #[test]
    fn leaving_a_widget_keeps_reorder_target() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        drag.apply(&enter(widget("B")), true);
        let leave = drag.apply(&DragEvent::DragLeave { target: widget("B") }, true);
        assert_eq!(noop_reason(&leave), Some(DragNoopReason::TargetRetained));
        assert!(drag.apply(&DragEvent::DragEnd, true).command().is_some());
    }

    #[test]
    fn zone_drop_resizes_existing_widget() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("NET_WORTH")), true);
        drag.apply(&enter(zone("full-row")), true);
        assert_eq!(drag.highlighted_zone().unwrap().size, WidgetSize::Full);
        let dropped = drag.apply(&drop_on(zone("full-row")), true);
        assert_eq!(
            dropped.command(),
            Some(&LayoutCommand::Resize {
                widget: WidgetId::from("NET_WORTH"),
                size: WidgetSize::Full,
            })
        );
        assert!(drag.highlighted_zone().is_none());
        let end = drag.apply(&DragEvent::DragEnd, true);
        assert_eq!(
            noop_reason(&end),
            Some(DragNoopReason::IdleWithoutActiveDrag)
        );
    }

    #[test]
    fn zone_highlight_is_exclusive_and_clears_on_leave() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        drag.apply(&enter(zone("kpi-row")), true);
        drag.apply(&enter(zone("wide-main")), true);
        assert_eq!(drag.highlighted_zone().unwrap().id.as_str(), "wide-main");
        let stale = drag.apply(&DragEvent::DragLeave { target: zone("kpi-row") }, true);
        assert_eq!(noop_reason(&stale), Some(DragNoopReason::TargetMismatch));
        drag.apply(&DragEvent::DragLeave { target: zone("wide-main") }, true);
        assert!(drag.highlighted_zone().is_none());
        assert!(drag.is_active());
    }

    #[test]
    fn unknown_zone_is_ignored() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        let hover = drag.apply(&enter(zone("mystery")), true);
        assert_eq!(noop_reason(&hover), Some(DragNoopReason::UnknownZone));
        let dropped = drag.apply(&drop_on(zone("mystery")), true);
        assert_eq!(noop_reason(&dropped), Some(DragNoopReason::UnknownZone));
    }

    #[test]
    fn gallery_drop_on_zone_inserts_with_size() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::gallery("MEAL_PLAN")), true);
        let dropped = drag.apply(&drop_on(zone("sidebar-column")), true);
        assert_eq!(
            dropped.command(),
            Some(&LayoutCommand::Insert {
                widget: WidgetId::from("MEAL_PLAN"),
                size: Some(WidgetSize::Sidebar),
            })
        );
    }

    #[test]
    fn gallery_drop_on_grid_inserts_with_catalog_size() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::gallery("MEAL_PLAN")), true);
        let over = drag.apply(&enter(DropTarget::Grid), true);
        assert!(matches!(over.to, DragState::GallerySource { .. }));
        let dropped = drag.apply(&drop_on(DropTarget::Grid), true);
        assert_eq!(
            dropped.command(),
            Some(&LayoutCommand::Insert {
                widget: WidgetId::from("MEAL_PLAN"),
                size: None,
            })
        );
    }

    #[test]
    fn second_drag_start_is_ignored() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        let second = drag.apply(&start(DragPayload::existing("B")), true);
        assert_eq!(
            noop_reason(&second),
            Some(DragNoopReason::ActiveDragAlreadyInProgress)
        );
        assert_eq!(drag.state().source(), Some(&DragPayload::existing("A")));
    }

    #[test]
    fn drags_require_edit_mode() {
        let mut drag = controller();
        let started = drag.apply(&start(DragPayload::existing("A")), false);
        assert_eq!(noop_reason(&started), Some(DragNoopReason::EditModeRequired));
        assert!(!drag.is_active());
    }

    #[test]
    fn malformed_payload_drop_changes_nothing() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::gallery("MEAL_PLAN")), true);
        let before = drag.state().clone();
        let dropped = drag.apply(
            &DragEvent::Drop {
                target: DropTarget::Grid,
                payload: Some("{not json".to_string()),
            },
            true,
        );
        assert_eq!(noop_reason(&dropped), Some(DragNoopReason::MalformedPayload));
        assert_eq!(drag.state(), &before);
    }

    #[test]
    fn missing_payload_without_session_is_ignored() {
        let mut drag = controller();
        let dropped = drag.apply(&drop_on(DropTarget::Grid), true);
        assert_eq!(noop_reason(&dropped), Some(DragNoopReason::MissingPayload));
    }

    #[test]
    fn payload_alone_can_drive_a_drop() {
        let mut drag = controller();
        let payload = DragPayload::gallery("AI_INSIGHTS").encode();
        let dropped = drag.apply(
            &DragEvent::Drop {
                target: zone("half-split"),
                payload: Some(payload),
            },
            true,
        );
        assert_eq!(
            dropped.command(),
            Some(&LayoutCommand::Insert {
                widget: WidgetId::from("AI_INSIGHTS"),
                size: Some(WidgetSize::Half),
            })
        );
    }

    #[test]
    fn payload_that_disagrees_with_session_is_rejected() {
        let mut drag = controller();
        drag.apply(&start(DragPayload::existing("A")), true);
        let dropped = drag.apply(
            &DragEvent::Drop {
                target: zone("full-row"),
                payload: Some(DragPayload::existing("B").encode()),
            },
            true,
        );
        assert_eq!(noop_reason(&dropped), Some(DragNoopReason::PayloadMismatch));
        assert!(drag.is_active());
    }

    #[test]
    fn force_cancel_resets_active_gesture() {
        let mut drag = controller();
        assert!(drag.force_cancel(DragCancelReason::EditModeExited).is_none());
        drag.apply(&start(DragPayload::existing("A")), true);
        drag.apply(&enter(widget("B")), true);
        let canceled = drag.force_cancel(DragCancelReason::EditModeExited).unwrap();
        assert_eq!(
            canceled.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::EditModeExited
            }
        );
        assert_eq!(canceled.to, DragState::Idle);
        assert!(matches!(canceled.from, DragState::ReorderTargeted { .. }));
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let mut drag = controller();
        let a = drag.apply(&DragEvent::DragEnd, true);
        let b = drag.apply(&start(DragPayload::existing("A")), true);
        let c = drag.apply(&DragEvent::Cancel, true);
        assert_eq!(
            (a.transition_id, b.transition_id, c.transition_id),
            (1, 2, 3)
        );
    }

    #[test]
    fn payload_encoding_is_tagged_json() {
        let encoded = DragPayload::gallery("MEAL_PLAN").encode();
        assert!(encoded.contains(r#""kind":"gallery""#));
        assert!(encoded.contains(r#""id":"MEAL_PLAN""#));
        assert_eq!(
            DragPayload::decode(&encoded).unwrap(),
            DragPayload::gallery("MEAL_PLAN")
        );
        assert_eq!(DragPayload::decode("  "), Err(PayloadError::Empty));
        assert_eq!(
            DragPayload::decode(r#"{"kind":"existing","id":""}"#),
            Err(PayloadError::MissingWidgetId)
        );
        assert!(matches!(
            DragPayload::decode(r#"{"kind":"sideways","id":"A"}"#),
            Err(PayloadError::Malformed(_))
        ));
    }
}
