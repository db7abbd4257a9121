#![forbid(unsafe_code)]

//! Checkbox row control that reports to a [`Registry`].
//!
//! A [`CheckboxControl<T>`] is the child side of the aggregate: one per
//! rendered row, carrying the row's payload. It is created behind an `Rc`
//! (the registry holds it weakly) and may be attached to at most one registry
//! at a time.
//!
//! # Invariants
//!
//! - Every local change (`on_change_value`, `write_value`) is reported to the
//!   attached registry as the control's current `read_value()`.
//! - Re-attaching to a different registry removes the control from the old
//!   one before adding it to the new one. Re-attaching to the same registry
//!   is a no-op.
//! - Dropping the control removes it from its registry if it is still a
//!   member. This is a no-op if it never registered.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::control::{ControlId, TriStateControl};
use crate::registry::{Registry, WeakRegistry};

struct Attachment<T: Clone + 'static> {
    registry: WeakRegistry<T>,
    member: Option<ControlId>,
}

/// A boolean child control with an opaque payload.
pub struct CheckboxControl<T: Clone + 'static> {
    this: Weak<Self>,
    payload: T,
    checked: Cell<bool>,
    disabled: Cell<bool>,
    attachment: RefCell<Option<Attachment<T>>>,
}

impl<T: Clone + 'static> CheckboxControl<T> {
    /// Unchecked, unattached control carrying `payload`.
    #[must_use]
    pub fn new(payload: T) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            payload,
            checked: Cell::new(false),
            disabled: Cell::new(false),
            attachment: RefCell::new(None),
        })
    }

    /// Control attached to `registry` from the start.
    #[must_use]
    pub fn attached(payload: T, registry: &Registry<T>) -> Rc<Self> {
        let control = Self::new(payload);
        control.set_registry(Some(registry));
        control
    }

    /// The payload reported while checked.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Current checked flag.
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    /// Current disabled flag.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// The attached registry, if any and still alive.
    #[must_use]
    pub fn registry(&self) -> Option<Registry<T>> {
        self.attachment
            .borrow()
            .as_ref()
            .and_then(|a| a.registry.upgrade())
    }

    /// Member id in the attached registry, once registered.
    #[must_use]
    pub fn member_id(&self) -> Option<ControlId> {
        self.attachment.borrow().as_ref().and_then(|a| a.member)
    }

    /// Move the control to `registry` (or detach with `None`).
    pub fn set_registry(&self, registry: Option<&Registry<T>>) {
        if let (Some(current), Some(next)) = (self.attachment.borrow().as_ref(), registry)
            && current.registry.is(next)
        {
            return;
        }

        let previous = self.attachment.borrow_mut().take();
        if let Some(previous) = previous
            && let (Some(old), Some(id)) = (previous.registry.upgrade(), previous.member)
        {
            old.remove_id(id);
        }

        let Some(next) = registry else {
            return;
        };
        *self.attachment.borrow_mut() = Some(Attachment {
            registry: next.downgrade(),
            member: None,
        });
        if let Some(this) = self.this.upgrade() {
            let id = next.add_control(&this);
            self.remember(id);
        }
    }

    /// Detach from the current registry.
    pub fn detach(&self) {
        self.set_registry(None);
    }

    /// User toggled the checkbox.
    pub fn on_change_value(&self, checked: bool) {
        self.checked.set(checked);
        self.report();
    }

    fn report(&self) {
        let Some(registry) = self.registry() else {
            return;
        };
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let id = registry.change_control_value(&this, self.read_value());
        self.remember(id);
    }

    fn remember(&self, id: ControlId) {
        if let Some(attachment) = self.attachment.borrow_mut().as_mut() {
            attachment.member = Some(id);
        }
    }
}

impl<T: Clone + 'static> TriStateControl<T> for CheckboxControl<T> {
    fn read_value(&self) -> Option<T> {
        self.checked.get().then(|| self.payload.clone())
    }

    fn write_value(&self, checked: bool) {
        self.checked.set(checked);
        self.report();
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }
}

impl<T: Clone + 'static> Drop for CheckboxControl<T> {
    fn drop(&mut self) {
        if let Some(attachment) = self.attachment.get_mut().take()
            && let (Some(registry), Some(id)) = (attachment.registry.upgrade(), attachment.member)
        {
            registry.remove_id(id);
        }
    }
}

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for CheckboxControl<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckboxControl")
            .field("payload", &self.payload)
            .field("checked", &self.checked.get())
            .field("disabled", &self.disabled.get())
            .field("attached", &self.attachment.borrow().is_some())
            .finish()
    }
}
