#![forbid(unsafe_code)]

//! Capability contract for child controls.
//!
//! A [`Registry`](crate::Registry) only ever talks to its children through
//! [`TriStateControl`]. Any concrete control (a checkbox row, a selection
//! model entry, a test double) can join a registry by implementing the three
//! methods below.
//!
//! Methods take `&self`: controls are shared through `Rc` with the registry
//! and their owning row, so mutable state lives behind `Cell`/`RefCell`.

/// One child selectable item, as seen by the registry.
pub trait TriStateControl<T> {
    /// The externally visible value: the payload when checked, `None`
    /// otherwise.
    ///
    /// Must be side-effect free and callable before any write (an unwritten
    /// control reads `None`).
    fn read_value(&self) -> Option<T>;

    /// Set the checked flag.
    ///
    /// Implementations may report the resulting value back to their registry
    /// with [`Registry::change_control_value`](crate::Registry::change_control_value);
    /// the registry coalesces such reports during bulk writes.
    fn write_value(&self, checked: bool);

    /// Mirror the aggregate's disabled flag. Has no effect on the aggregate.
    fn set_disabled(&self, disabled: bool);
}

/// Identity of a registry member.
///
/// Assigned on first registration and never reused within one registry, so
/// ids order members by registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(u64);

impl ControlId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "control#{}", self.0)
    }
}
