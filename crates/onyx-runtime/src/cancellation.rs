#![forbid(unsafe_code)]

//! One-shot cancellation shared between a session and its sync worker.
//!
//! The session holds the [`CancellationSource`]; the worker holds a
//! [`CancellationToken`] and checks it before every remote call. Once
//! cancelled, a source stays cancelled. Dropping the source does not cancel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owner side. Cancelling is idempotent.
#[derive(Debug, Default)]
pub struct CancellationSource {
    flag: Arc<AtomicBool>,
}

/// Observer side, cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Returns `true` if this call performed the cancellation.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl CancellationToken {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
