#![forbid(unsafe_code)]

//! Tri-state aggregate checkbox for tricheck.
//!
//! A [`Registry`] summarizes a dynamic set of child [`TriStateControl`]s as
//! [`TriState::None`], [`TriState::Some`] or [`TriState::All`], pushes
//! select-all / deselect-all back down to them, and emits the selected
//! payloads to a host listener.
//!
//! ```ignore
//! use tricheck_widgets::{CheckboxControl, Registry, TriState};
//!
//! let registry = Registry::new();
//! registry.register_on_change(|selected: &[u32]| println!("{selected:?}"));
//!
//! let rows: Vec<_> = (0..3).map(|id| CheckboxControl::attached(id, &registry)).collect();
//! rows[0].on_change_value(true);
//! assert_eq!(registry.current_state(), TriState::Some);
//!
//! registry.on_aggregate_activate();
//! assert_eq!(registry.current_state(), TriState::None);
//! ```

pub mod checkbox;
pub mod config;
pub mod control;
pub mod registry;
pub mod state;
pub mod visual;

pub use checkbox::CheckboxControl;
pub use config::{ConfigError, DEFAULT_CHECKBOX_CLASS, MembershipEmit, RegistryConfig};
pub use control::{ControlId, TriStateControl};
pub use registry::{Registry, WeakRegistry, WriteOutcome};
pub use state::{Indicator, TriState};
pub use visual::{CheckboxVisual, RecordingVisual};
