//! Single-flight guard for fleet operations
//!
//! At most one operation of each kind runs at a time. A second request of
//! the same kind fails fast instead of racing the first one.

use crate::{Error, OperationKind, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Registry of operation kinds currently in flight
#[derive(Default)]
pub struct SingleFlight {
    active: Arc<Mutex<HashSet<OperationKind>>>,
}

/// Lease on one operation kind, released on drop
pub struct FlightGuard {
    kind: OperationKind,
    active: Arc<Mutex<HashSet<OperationKind>>>,
}

impl SingleFlight {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `kind`, or fail with [`Error::OperationInProgress`]
    pub fn try_acquire(&self, kind: OperationKind) -> Result<FlightGuard> {
        if !self.active.lock().insert(kind) {
            return Err(Error::OperationInProgress(kind));
        }
        Ok(FlightGuard {
            kind,
            active: Arc::clone(&self.active),
        })
    }

    /// Whether `kind` is in flight
    pub fn is_active(&self, kind: OperationKind) -> bool {
        self.active.lock().contains(&kind)
    }
}

impl FlightGuard {
    /// Claimed kind
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.kind);
    }
}
