#![forbid(unsafe_code)]

//! Seam to the remote layout service.
//!
//! The transport is someone else's problem: implementors of
//! [`RemoteLayoutService`] see whole layout sets keyed by profile and report
//! failure through [`RemoteError`]. [`InMemoryRemote`] is a process-local
//! implementation with failure injection and call counters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use onyx_core::{Layout, LayoutId};
use serde::{Deserialize, Serialize};

/// User profile the remote copy belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Failure reported by a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service could not be reached.
    Unavailable(String),
    /// The service answered and refused the request.
    Rejected(String),
    /// The service answered with something that could not be decoded.
    Decode(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "remote unavailable: {msg}"),
            Self::Rejected(msg) => write!(f, "remote rejected request: {msg}"),
            Self::Decode(msg) => write!(f, "remote response undecodable: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Remote persistence for a profile's layouts and active layout id.
///
/// Calls are blocking and made from the sync worker thread, so
/// implementations must be `Send + Sync`.
pub trait RemoteLayoutService: Send + Sync {
    fn load_layouts(&self, profile: &ProfileId) -> Result<Vec<Layout>, RemoteError>;

    /// `Ok(None)` when the profile has never stored an active id.
    fn load_active_layout_id(&self, profile: &ProfileId) -> Result<Option<LayoutId>, RemoteError>;

    /// Replace the remote layout set.
    fn push_layouts(&self, profile: &ProfileId, layouts: &[Layout]) -> Result<(), RemoteError>;

    fn push_active_layout_id(&self, profile: &ProfileId, id: &LayoutId)
    -> Result<(), RemoteError>;
}

#[derive(Debug, Default)]
struct RemoteRecords {
    layouts: HashMap<ProfileId, Vec<Layout>>,
    active: HashMap<ProfileId, LayoutId>,
}

/// Process-local remote service.
///
/// Keeps decoded layout sets per profile. Pushes and loads round-trip the
/// layouts through JSON on the way in and out, so they go through the same
/// serialization a real transport would.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    records: Mutex<RemoteRecords>,
    fail_loads: AtomicBool,
    fail_pushes: AtomicBool,
    load_calls: AtomicUsize,
    push_calls: AtomicUsize,
    active_push_calls: AtomicUsize,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile's remote copy.
    #[must_use]
    pub fn with_profile(
        self,
        profile: impl Into<ProfileId>,
        layouts: Vec<Layout>,
        active: Option<LayoutId>,
    ) -> Self {
        let profile = profile.into();
        {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(active) = active {
                records.active.insert(profile.clone(), active);
            }
            records.layouts.insert(profile, layouts);
        }
        self
    }

    /// Make every subsequent load fail with [`RemoteError::Unavailable`].
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::Release);
    }

    /// Make every subsequent push fail with [`RemoteError::Unavailable`].
    pub fn set_fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::Release);
    }

    /// Number of `load_layouts` calls, failed ones included.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.load_calls.load(Ordering::Acquire)
    }

    /// Number of `push_layouts` calls, failed ones included.
    #[must_use]
    pub fn push_count(&self) -> usize {
        self.push_calls.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn active_push_count(&self) -> usize {
        self.active_push_calls.load(Ordering::Acquire)
    }

    /// Layouts currently stored for `profile`.
    #[must_use]
    pub fn stored_layouts(&self, profile: &ProfileId) -> Option<Vec<Layout>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.layouts.get(profile).cloned()
    }

    #[must_use]
    pub fn stored_active_layout_id(&self, profile: &ProfileId) -> Option<LayoutId> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.active.get(profile).cloned()
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), RemoteError> {
        if flag.load(Ordering::Acquire) {
            Err(RemoteError::Unavailable(format!("{what} failed (injected)")))
        } else {
            Ok(())
        }
    }
}

impl RemoteLayoutService for InMemoryRemote {
    fn load_layouts(&self, profile: &ProfileId) -> Result<Vec<Layout>, RemoteError> {
        self.load_calls.fetch_add(1, Ordering::AcqRel);
        Self::check(&self.fail_loads, "load_layouts")?;
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let Some(layouts) = records.layouts.get(profile) else {
            return Ok(Vec::new());
        };
        let wire = serde_json::to_string(layouts)?;
        Ok(serde_json::from_str(&wire)?)
    }

    fn load_active_layout_id(&self, profile: &ProfileId) -> Result<Option<LayoutId>, RemoteError> {
        Self::check(&self.fail_loads, "load_active_layout_id")?;
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.active.get(profile).cloned())
    }

    fn push_layouts(&self, profile: &ProfileId, layouts: &[Layout]) -> Result<(), RemoteError> {
        self.push_calls.fetch_add(1, Ordering::AcqRel);
        Self::check(&self.fail_pushes, "push_layouts")?;
        let wire = serde_json::to_string(layouts)?;
        let stored: Vec<Layout> = serde_json::from_str(&wire)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.layouts.insert(profile.clone(), stored);
        Ok(())
    }

    fn push_active_layout_id(
        &self,
        profile: &ProfileId,
        id: &LayoutId,
    ) -> Result<(), RemoteError> {
        self.active_push_calls.fetch_add(1, Ordering::AcqRel);
        Self::check(&self.fail_pushes, "push_active_layout_id")?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.active.insert(profile.clone(), id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::{Timestamp, WidgetPlacement};

    fn profile() -> ProfileId {
        ProfileId::from("user-1")
    }

    #[test]
    fn unknown_profile_loads_empty() {
        let remote = InMemoryRemote::new();
        assert_eq!(remote.load_layouts(&profile()).unwrap(), Vec::new());
        assert_eq!(remote.load_active_layout_id(&profile()).unwrap(), None);
        assert_eq!(remote.load_count(), 1);
    }

    #[test]
    fn push_then_load_returns_same_layouts() {
        let remote = InMemoryRemote::new();
        let layouts = vec![
            Layout::seed(Timestamp(5)),
            Layout::new("work", "Work", Timestamp(6))
                .with_widgets([WidgetPlacement::new("NET_WORTH").hidden()]),
        ];
        remote.push_layouts(&profile(), &layouts).unwrap();
        remote
            .push_active_layout_id(&profile(), &LayoutId::from("work"))
            .unwrap();
        assert_eq!(remote.load_layouts(&profile()).unwrap(), layouts);
        assert_eq!(
            remote.load_active_layout_id(&profile()).unwrap(),
            Some(LayoutId::from("work"))
        );
        assert_eq!(remote.push_count(), 1);
        assert_eq!(remote.active_push_count(), 1);
    }

    #[test]
    fn injected_push_failure_leaves_remote_untouched() {
        let remote = InMemoryRemote::new().with_profile(
            profile(),
            vec![Layout::seed(Timestamp(1))],
            None,
        );
        remote.set_fail_pushes(true);
        let err = remote.push_layouts(&profile(), &[]).unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert_eq!(remote.stored_layouts(&profile()).map(|l| l.len()), Some(1));
        assert_eq!(remote.push_count(), 1);
    }

    #[test]
    fn injected_load_failure() {
        let remote = InMemoryRemote::new();
        remote.set_fail_loads(true);
        assert!(remote.load_layouts(&profile()).is_err());
        assert!(remote.load_active_layout_id(&profile()).is_err());
    }

    #[test]
    fn errors_display() {
        assert_eq!(
            RemoteError::Rejected("quota".into()).to_string(),
            "remote rejected request: quota"
        );
    }
}
