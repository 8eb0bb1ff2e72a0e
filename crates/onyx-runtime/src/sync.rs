#![forbid(unsafe_code)]

//! Best-effort synchronization of the layout set with a remote service.
//!
//! # Lifecycle
//!
//! 1. [`SyncAdapter::load_on_mount`] pulls the remote copy once per session
//!    and upserts it into the store.
//! 2. [`SyncAdapter::on_store_changed`] is called after every applied store
//!    mutation. Content changes are handed to a background worker that holds
//!    a single pending push and fires it after the debounce quiet period.
//!    Active-layout changes are pushed immediately.
//! 3. [`SyncAdapter::shutdown`] (or drop) cancels the pending push and joins
//!    the worker.
//!
//! # Invariants
//!
//! - At most one push is pending; scheduling replaces it and re-arms the timer.
//! - A push never carries a revision at or below the last acknowledged one.
//! - A failed push leaves the acknowledged baseline untouched, so the next
//!   change is pushed again. Failures are logged at `warn` and never surface
//!   to the caller.
//! - Content counts as synced only when it matches the acknowledged push and
//!   no job handed to the worker is still unsettled. A job whose content
//!   already matches the acknowledged push is settled without a remote call,
//!   so the remote ends at the last local state once the worker goes quiet.
//! - Remote writes are last-writer-wins; concurrent sessions on the same
//!   profile overwrite each other.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;

use onyx_core::{Layout, LayoutId};
use onyx_layout::LayoutStore;
use web_time::Instant;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::config::SyncConfig;
use crate::debounce::Debouncer;
use crate::remote::{ProfileId, RemoteError, RemoteLayoutService};

/// Worker-side bookkeeping, readable from the session thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Content hash of the last successful push.
    pub last_synced_hash: Option<u64>,
    /// Store revision of the last successful push.
    pub last_synced_revision: Option<u64>,
    /// Revision waiting in the worker's slot, if any.
    pub pending_revision: Option<u64>,
    pub pushes_succeeded: u64,
    pub pushes_failed: u64,
    /// Jobs dropped by the revision gate.
    pub pushes_skipped_stale: u64,
    /// Jobs settled without a remote call because the content was already
    /// acknowledged.
    pub pushes_skipped_unchanged: u64,
    /// Highest job revision the worker is done with: pushed, failed,
    /// skipped or dropped.
    pub settled_revision: Option<u64>,
}

/// Result of [`SyncAdapter::load_on_mount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Remote layouts were upserted; `active` is the store's active id after
    /// applying the remote one.
    Loaded { layouts: usize, active: LayoutId },
    /// The remote has nothing for this profile; local layouts are untouched.
    Empty,
    Failed(RemoteError),
    Skipped(SyncSkipReason),
}

/// Result of [`SyncAdapter::on_store_changed`] for the layout content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// A push is pending in the worker.
    Scheduled,
    /// Content equals the last successful push and no job is unsettled.
    AlreadySynced,
    Skipped(SyncSkipReason),
}

/// Why the adapter did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSkipReason {
    /// `sync.enabled` is false.
    Disabled,
    /// No remote service is attached.
    Offline,
    /// No profile id is configured.
    NoProfile,
    /// Edits outside edit mode are not pushed.
    NotEditing,
    /// Load-on-mount already ran this session.
    AlreadyLoaded,
    /// The worker thread is gone.
    WorkerStopped,
}

impl fmt::Display for SyncSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "sync disabled",
            Self::Offline => "no remote service",
            Self::NoProfile => "no profile id",
            Self::NotEditing => "not in edit mode",
            Self::AlreadyLoaded => "already loaded",
            Self::WorkerStopped => "sync worker stopped",
        })
    }
}

#[derive(Debug)]
struct PushJob {
    profile: ProfileId,
    revision: u64,
    hash: u64,
    layouts: Vec<Layout>,
}

#[derive(Debug)]
enum WorkerMessage {
    Schedule(PushJob),
    PushActive { profile: ProfileId, id: LayoutId },
    Cancel,
    Flush,
    Shutdown,
}

/// Session-side handle to remote synchronization.
pub struct SyncAdapter {
    remote: Option<Arc<dyn RemoteLayoutService>>,
    profile: Option<ProfileId>,
    config: SyncConfig,
    status: Arc<Mutex<SyncStatus>>,
    sender: Option<mpsc::Sender<WorkerMessage>>,
    worker: Option<thread::JoinHandle<()>>,
    cancel: CancellationSource,
    loaded: bool,
    /// Revision of the last job handed to the worker.
    handed_off: Option<u64>,
    last_active: Option<LayoutId>,
}

impl fmt::Debug for SyncAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncAdapter")
            .field("online", &self.remote.is_some())
            .field("profile", &self.profile)
            .field("config", &self.config)
            .field("loaded", &self.loaded)
            .field("worker_running", &self.worker.is_some())
            .field("status", &self.status())
            .finish()
    }
}

impl SyncAdapter {
    /// Attach to `remote`. The worker thread starts only when sync is enabled
    /// and a profile id is configured.
    pub fn new(remote: Arc<dyn RemoteLayoutService>, config: SyncConfig) -> Self {
        let mut adapter = Self::detached(Some(remote), config);
        if adapter.config.enabled
            && adapter.profile.is_some()
            && let Some(remote) = adapter.remote.clone()
        {
            adapter.start_worker(remote);
        }
        adapter
    }

    /// An adapter with no remote; every operation is skipped.
    pub fn offline(config: SyncConfig) -> Self {
        Self::detached(None, config)
    }

    fn detached(remote: Option<Arc<dyn RemoteLayoutService>>, config: SyncConfig) -> Self {
        let profile = config
            .profile_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ProfileId::new);
        Self {
            remote,
            profile,
            config,
            status: Arc::new(Mutex::new(SyncStatus::default())),
            sender: None,
            worker: None,
            cancel: CancellationSource::new(),
            loaded: false,
            handed_off: None,
            last_active: None,
        }
    }

    fn start_worker(&mut self, remote: Arc<dyn RemoteLayoutService>) {
        let (sender, receiver) = mpsc::channel();
        let worker = Worker {
            remote,
            status: Arc::clone(&self.status),
            cancel: self.cancel.token(),
            slot: Debouncer::new(self.config.debounce()),
        };
        match thread::Builder::new()
            .name("onyx-sync".to_string())
            .spawn(move || worker.run(receiver))
        {
            Ok(handle) => {
                self.sender = Some(sender);
                self.worker = Some(handle);
                tracing::debug!(
                    target: "onyx.sync",
                    debounce_ms = self.config.debounce_ms,
                    "sync worker started"
                );
            }
            Err(err) => {
                tracing::warn!(target: "onyx.sync", %err, "failed to start sync worker; pushes disabled");
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn profile(&self) -> Option<&ProfileId> {
        self.profile.as_ref()
    }

    /// Whether load-on-mount has run for this session.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn ready(&self) -> Result<(&Arc<dyn RemoteLayoutService>, &ProfileId), SyncSkipReason> {
        if !self.config.enabled {
            return Err(SyncSkipReason::Disabled);
        }
        let remote = self.remote.as_ref().ok_or(SyncSkipReason::Offline)?;
        let profile = self.profile.as_ref().ok_or(SyncSkipReason::NoProfile)?;
        Ok((remote, profile))
    }

    /// Pull the remote layout set into `store`, once per session.
    ///
    /// Remote layouts are upserted one by one, then the remote active id is
    /// applied if it names a known layout. An empty remote leaves the store
    /// untouched. Remote failures are logged and reported, never raised.
    pub fn load_on_mount(&mut self, store: &mut LayoutStore) -> LoadOutcome {
        if self.loaded {
            return LoadOutcome::Skipped(SyncSkipReason::AlreadyLoaded);
        }
        let (remote, profile) = match self.ready() {
            Ok((remote, profile)) => (Arc::clone(remote), profile.clone()),
            Err(reason) => {
                tracing::debug!(target: "onyx.sync", %reason, "remote load skipped");
                return LoadOutcome::Skipped(reason);
            }
        };
        self.loaded = true;

        let outcome = match remote.load_layouts(&profile) {
            Err(err) => {
                tracing::warn!(target: "onyx.sync", %err, %profile, "failed to load remote layouts");
                LoadOutcome::Failed(err)
            }
            Ok(layouts) if layouts.is_empty() => {
                tracing::info!(target: "onyx.sync", %profile, "no remote layouts; keeping local defaults");
                LoadOutcome::Empty
            }
            Ok(layouts) => {
                let count = layouts.len();
                for layout in layouts {
                    let id = layout.id.clone();
                    if !store.save_layout(layout).is_applied() {
                        tracing::debug!(target: "onyx.sync", layout = %id, "remote layout not applied");
                    }
                }
                match remote.load_active_layout_id(&profile) {
                    Ok(Some(id)) => {
                        store.set_active_layout(id.as_str());
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(target: "onyx.sync", %err, %profile, "failed to load remote active layout");
                    }
                }
                tracing::info!(
                    target: "onyx.sync",
                    %profile,
                    layouts = count,
                    active = %store.active_layout_id(),
                    "remote layouts loaded"
                );
                LoadOutcome::Loaded {
                    layouts: count,
                    active: store.active_layout_id().clone(),
                }
            }
        };
        self.last_active = Some(store.active_layout_id().clone());
        outcome
    }

    /// React to an applied store mutation.
    ///
    /// Pushes the active layout id immediately when it changed since the last
    /// call (after load only), then schedules a debounced push of the layout
    /// content unless it matches the last successful push.
    pub fn on_store_changed(&mut self, store: &LayoutStore, edit_mode: bool) -> SyncDecision {
        self.push_active_if_changed(store);

        let profile = match self.ready() {
            Ok((_, profile)) => profile.clone(),
            Err(reason) => return SyncDecision::Skipped(reason),
        };
        if self.config.push_only_in_edit_mode && !edit_mode {
            return SyncDecision::Skipped(SyncSkipReason::NotEditing);
        }

        let hash = store.content_hash();
        // An unsettled job may be on the wire already; the worker settles a
        // reverting job without a remote call if it turns out redundant.
        if self.status().last_synced_hash == Some(hash) && !self.has_unsettled_job() {
            return SyncDecision::AlreadySynced;
        }

        let job = PushJob {
            profile,
            revision: store.revision(),
            hash,
            layouts: store.layouts().to_vec(),
        };
        let revision = job.revision;
        if self.send(WorkerMessage::Schedule(job)) {
            self.handed_off = Some(revision);
            tracing::trace!(target: "onyx.sync", revision, "push scheduled");
            SyncDecision::Scheduled
        } else {
            SyncDecision::Skipped(SyncSkipReason::WorkerStopped)
        }
    }

    fn push_active_if_changed(&mut self, store: &LayoutStore) {
        let current = store.active_layout_id();
        if self.last_active.as_ref() == Some(current) {
            return;
        }
        let previous = self.last_active.replace(current.clone());
        if !self.loaded || previous.is_none() {
            return;
        }
        let Ok((_, profile)) = self.ready() else {
            return;
        };
        let message = WorkerMessage::PushActive {
            profile: profile.clone(),
            id: current.clone(),
        };
        self.send(message);
    }

    /// Whether a job handed to the worker has not been settled yet.
    fn has_unsettled_job(&self) -> bool {
        let settled = self.status().settled_revision;
        self.handed_off
            .is_some_and(|revision| settled.is_none_or(|settled| settled < revision))
    }

    /// Fire the pending push now instead of waiting for the quiet period.
    pub fn flush(&mut self) {
        if self.has_unsettled_job() {
            self.send(WorkerMessage::Flush);
        }
    }

    /// Drop the pending push, if any. A push already on the wire completes.
    pub fn cancel_pending(&mut self) {
        if self.has_unsettled_job() {
            self.send(WorkerMessage::Cancel);
        }
    }

    /// Cancel pending work and join the worker. Idempotent.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.handed_off = None;
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(WorkerMessage::Shutdown);
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!(target: "onyx.sync", "sync worker panicked");
            } else {
                tracing::debug!(target: "onyx.sync", "sync worker stopped");
            }
        }
    }

    fn send(&self, message: WorkerMessage) -> bool {
        match &self.sender {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }
}

impl Drop for SyncAdapter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct Worker {
    remote: Arc<dyn RemoteLayoutService>,
    status: Arc<Mutex<SyncStatus>>,
    cancel: CancellationToken,
    slot: Debouncer<PushJob>,
}

impl Worker {
    fn run(mut self, receiver: mpsc::Receiver<WorkerMessage>) {
        loop {
            let message = match self.slot.next_deadline() {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match receiver.recv_timeout(wait) {
                        Ok(message) => Some(message),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match receiver.recv() {
                    Ok(message) => Some(message),
                    Err(_) => break,
                },
            };
            if self.cancel.is_cancelled() {
                break;
            }

            match message {
                Some(WorkerMessage::Schedule(job)) => {
                    let revision = job.revision;
                    if let Some(replaced) = self.slot.schedule(job, Instant::now()) {
                        tracing::trace!(
                            target: "onyx.sync",
                            replaced = replaced.revision,
                            revision,
                            "pending push replaced"
                        );
                    }
                    self.update(|status| status.pending_revision = Some(revision));
                }
                Some(WorkerMessage::PushActive { profile, id }) => self.push_active(&profile, &id),
                Some(WorkerMessage::Cancel) => {
                    let dropped = self.slot.cancel();
                    if let Some(job) = &dropped {
                        tracing::debug!(target: "onyx.sync", revision = job.revision, "pending push cancelled");
                    }
                    self.update(|status| {
                        status.pending_revision = None;
                        if let Some(job) = dropped {
                            settle(status, job.revision);
                        }
                    });
                }
                Some(WorkerMessage::Flush) => {
                    if let Some(job) = self.slot.take() {
                        self.push(job);
                    }
                }
                Some(WorkerMessage::Shutdown) => break,
                None => {}
            }

            if let Some(job) = self.slot.poll(Instant::now()) {
                self.push(job);
            }
        }

        if let Some(job) = self.slot.cancel() {
            tracing::debug!(target: "onyx.sync", revision = job.revision, "pending push dropped at shutdown");
        }
        self.update(|status| status.pending_revision = None);
    }

    fn update(&self, f: impl FnOnce(&mut SyncStatus)) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut status);
    }

    fn push(&mut self, job: PushJob) {
        self.update(|status| status.pending_revision = None);
        if self.cancel.is_cancelled() {
            return;
        }
        {
            let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(acked) = status.last_synced_revision
                && job.revision <= acked
            {
                status.pushes_skipped_stale += 1;
                settle(&mut status, job.revision);
                tracing::debug!(
                    target: "onyx.sync",
                    revision = job.revision,
                    acked,
                    "stale push skipped"
                );
                return;
            }
            if status.last_synced_hash == Some(job.hash) {
                status.pushes_skipped_unchanged += 1;
                status.last_synced_revision = Some(job.revision);
                settle(&mut status, job.revision);
                tracing::debug!(
                    target: "onyx.sync",
                    revision = job.revision,
                    "content already acknowledged; push skipped"
                );
                return;
            }
        }

        match self.remote.push_layouts(&job.profile, &job.layouts) {
            Ok(()) => {
                self.update(|status| {
                    status.last_synced_hash = Some(job.hash);
                    status.last_synced_revision = Some(job.revision);
                    status.pushes_succeeded += 1;
                    settle(status, job.revision);
                });
                tracing::debug!(
                    target: "onyx.sync",
                    profile = %job.profile,
                    revision = job.revision,
                    layouts = job.layouts.len(),
                    "layouts pushed"
                );
            }
            Err(err) => {
                self.update(|status| {
                    status.pushes_failed += 1;
                    settle(status, job.revision);
                });
                tracing::warn!(
                    target: "onyx.sync",
                    %err,
                    profile = %job.profile,
                    revision = job.revision,
                    "layout push failed"
                );
            }
        }
    }

    fn push_active(&self, profile: &ProfileId, id: &LayoutId) {
        if self.cancel.is_cancelled() {
            return;
        }
        match self.remote.push_active_layout_id(profile, id) {
            Ok(()) => {
                tracing::debug!(target: "onyx.sync", %profile, active = %id, "active layout pushed");
            }
            Err(err) => {
                tracing::warn!(target: "onyx.sync", %err, %profile, active = %id, "active layout push failed");
            }
        }
    }
}

fn settle(status: &mut SyncStatus, revision: u64) {
    status.settled_revision = Some(status.settled_revision.map_or(revision, |s| s.max(revision)));
}
