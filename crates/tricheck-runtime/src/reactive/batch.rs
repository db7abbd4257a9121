#![forbid(unsafe_code)]

//! Notification batching for bulk operations.
//!
//! A [`Batch`] is a depth counter owned by whoever emits notifications. A bulk
//! operation opens a [`BatchScope`]; code that would normally notify calls
//! [`Batch::defer`] first and skips the notification when it returns `true`.
//! The outermost scope reports whether anything was deferred so the owner can
//! emit once.
//!
//! # Invariants
//!
//! - Scopes nest; only the outermost [`BatchScope::finish`] returns `true`.
//! - Dropping a scope without calling `finish` still closes it, and the
//!   pending flag is discarded at depth zero.

use std::cell::Cell;

/// Depth counter plus a "something was deferred" flag.
#[derive(Debug, Default)]
pub struct Batch {
    depth: Cell<u32>,
    pending: Cell<bool>,
}

impl Batch {
    /// Create an idle batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            depth: Cell::new(0),
            pending: Cell::new(false),
        }
    }

    /// Open a scope.
    #[must_use = "dropping the scope closes it immediately"]
    pub fn enter(&self) -> BatchScope<'_> {
        self.depth.set(self.depth.get() + 1);
        BatchScope {
            batch: self,
            closed: false,
        }
    }

    /// Whether any scope is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// If a scope is open, record deferred work and return `true`.
    /// Returns `false` (caller should notify now) when idle.
    pub fn defer(&self) -> bool {
        if self.is_active() {
            self.pending.set(true);
            true
        } else {
            false
        }
    }

    fn close(&self) -> bool {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth == 0 {
            self.pending.replace(false)
        } else {
            false
        }
    }
}

/// RAII guard for an open [`Batch`] scope.
#[must_use = "dropping the scope closes it immediately"]
pub struct BatchScope<'a> {
    batch: &'a Batch,
    closed: bool,
}

impl BatchScope<'_> {
    /// Close the scope. Returns `true` when this was the outermost scope and
    /// at least one notification was deferred while it was open.
    pub fn finish(mut self) -> bool {
        self.closed = true;
        self.batch.close()
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.batch.close();
        }
    }
}

impl std::fmt::Debug for BatchScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("depth", &self.batch.depth())
            .finish()
    }
}
