#![forbid(unsafe_code)]

//! Runtime plumbing for tricheck widgets.
//!
//! Everything here assumes a single-threaded, cooperative event loop: one
//! external event is processed to completion before the next one starts, and
//! work that should happen "on the next turn" is pushed onto a [`TaskQueue`].

pub mod listener;
pub mod reactive;
pub mod task_queue;

pub use listener::Listener;
pub use reactive::{Batch, BatchScope, Binding, BindingScope, Observable, Subscription};
pub use task_queue::TaskQueue;
