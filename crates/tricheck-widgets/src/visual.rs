#![forbid(unsafe_code)]

//! Visual adapter seam for the aggregate checkbox element.
//!
//! The registry pushes an [`Indicator`] to the mounted [`CheckboxVisual`]
//! on every state recomputation. When nothing is mounted (the element is not
//! rendered yet) the update is skipped.

use std::cell::RefCell;

use crate::state::Indicator;

/// Receiver for the aggregate checkbox's display attributes.
pub trait CheckboxVisual {
    /// Apply the checked/indeterminate pair.
    fn apply(&self, indicator: Indicator);

    /// Style hook from [`RegistryConfig::checkbox_class`](crate::RegistryConfig::checkbox_class).
    /// Called once at mount time. Default ignores it.
    fn set_class(&self, _class: &str) {}
}

/// A [`CheckboxVisual`] that records every update. Useful for tests and for
/// headless hosts that poll the last indicator.
#[derive(Debug, Default)]
pub struct RecordingVisual {
    history: RefCell<Vec<Indicator>>,
    class: RefCell<Option<String>>,
}

impl RecordingVisual {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied indicator.
    #[must_use]
    pub fn last(&self) -> Option<Indicator> {
        self.history.borrow().last().copied()
    }

    /// Number of updates received.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.history.borrow().len()
    }

    /// All updates in order.
    #[must_use]
    pub fn history(&self) -> Vec<Indicator> {
        self.history.borrow().clone()
    }

    /// Class received at mount, if any.
    #[must_use]
    pub fn class(&self) -> Option<String> {
        self.class.borrow().clone()
    }
}

impl CheckboxVisual for RecordingVisual {
    fn apply(&self, indicator: Indicator) {
        self.history.borrow_mut().push(indicator);
    }

    fn set_class(&self, class: &str) {
        *self.class.borrow_mut() = Some(class.to_owned());
    }
}
