#![forbid(unsafe_code)]

//! Single-slot callback with a no-op default.
//!
//! A [`Listener`] holds at most one callback. Registering replaces the
//! previous callback; clearing it (or registering `None`) puts the no-op
//! back.
//!
//! The callback is stored as an `Rc` so [`Listener::get`] can hand out a
//! clone; owners call it after releasing their own borrows, which lets the
//! callback re-enter the owner.

use std::rc::Rc;

/// Single-slot listener receiving `&A`.
pub struct Listener<A: ?Sized> {
    slot: Option<Rc<dyn Fn(&A)>>,
}

impl<A: ?Sized> Listener<A> {
    /// Empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Replace the current callback.
    pub fn set(&mut self, f: impl Fn(&A) + 'static) {
        self.slot = Some(Rc::new(f));
    }

    /// Replace the current callback, or reset to the no-op with `None`.
    pub fn set_opt(&mut self, f: Option<Rc<dyn Fn(&A)>>) {
        self.slot = f;
    }

    /// Reset to the no-op.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Whether a callback is registered.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot.is_some()
    }

    /// Clone of the current callback, if any.
    #[must_use]
    pub fn get(&self) -> Option<Rc<dyn Fn(&A)>> {
        self.slot.clone()
    }
}

impl<A: ?Sized> Default for Listener<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<A: ?Sized> std::fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("is_set", &self.is_set())
            .finish()
    }
}
