#![forbid(unsafe_code)]

//! Reactive primitives used by the aggregate widgets.
//!
//! - [`Observable`]: A shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Binding`]: A lazily evaluated read view over an observable.
//! - [`BindingScope`]: Owns a widget's subscriptions and releases them on drop.
//! - [`Batch`] / [`BatchScope`]: A depth counter that lets bulk operations
//!   postpone per-item notifications until the outermost scope exits.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are held as `Weak` callbacks and pruned lazily on notify.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. Within a `BatchScope`, [`Batch::defer`] returns `true`; only the
//!    outermost scope reports the deferred work.

pub mod batch;
pub mod binding;
pub mod observable;

pub use batch::{Batch, BatchScope};
pub use binding::{Binding, BindingScope, bind_mapped, bind_observable};
pub use observable::{Observable, Subscription};
