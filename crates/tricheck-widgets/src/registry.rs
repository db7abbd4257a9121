#![forbid(unsafe_code)]

//! Aggregate registry for a tri-state ("select all") checkbox.
//!
//! A [`Registry<T>`] tracks a changing population of child controls together
//! with the last value each one reported, derives the aggregate [`TriState`],
//! pushes bulk writes down to the children, and emits the list of selected
//! payloads to a single change listener plus a single touched listener.
//!
//! # Invariants
//!
//! 1. A control is a member at most once. Re-adding is a no-op that keeps
//!    the tracked value.
//! 2. [`Registry::get_state`] is `All` iff there is at least one member and
//!    every tracked value is present, `None` iff no value is present (this
//!    includes the empty registry), `Some` otherwise.
//! 3. State is recomputed synchronously after every mutation, before any
//!    emission.
//! 4. A member added while the registry is disabled is disabled on entry.
//! 5. Emitted values follow registration order.
//!
//! # Emission ordering
//!
//! - `add_control` / `remove_control` schedule their emission on the
//!   [`TaskQueue`]. With [`MembershipEmit::Coalesced`] a burst of calls in one
//!   turn yields one emission that sees the final membership.
//! - Every other mutating operation emits synchronously.
//! - Bulk writes open a [`Batch`] scope. Value reports that controls send back
//!   while it is open update tracked values and state but do not emit; the
//!   bulk operation then emits once.
//!
//! No internal borrow is held while a control, listener, visual or state
//! subscriber runs, so all of them may call back into the registry.
//!
//! # Failure Modes
//!
//! - Removing a non-member returns `false` and changes nothing.
//! - A member whose control has been dropped without being removed is pruned
//!   the next time the registry reads its membership. Pruning schedules the
//!   deferred membership emission like a removal does.
//! - [`Registry::write_value`] with a non-empty selection logs a warning and
//!   applies nothing.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tricheck_runtime::reactive::{Batch, Binding, BindingScope, bind_mapped};
use tricheck_runtime::{Listener, Observable, Subscription, TaskQueue};

use crate::config::{MembershipEmit, RegistryConfig};
use crate::control::{ControlId, TriStateControl};
use crate::state::{Indicator, TriState};
use crate::visual::CheckboxVisual;

type DynControl<T> = dyn TriStateControl<T>;

/// Result of [`Registry::write_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing was requested (empty selection); nothing to do.
    Ignored,
    /// A non-empty external selection was requested and not applied.
    Unsupported {
        /// Number of values that were offered.
        requested: usize,
    },
}

struct Member<T> {
    control: Weak<DynControl<T>>,
    value: Option<T>,
}

struct Members<T> {
    entries: BTreeMap<ControlId, Member<T>>,
    // Allocation address -> id. Addresses stay unique while we hold a Weak.
    by_addr: AHashMap<usize, ControlId>,
    next_id: u64,
}

impl<T> Members<T> {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_addr: AHashMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, control: Weak<DynControl<T>>, addr: usize, value: Option<T>) -> ControlId {
        let id = ControlId::new(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Member { control, value });
        self.by_addr.insert(addr, id);
        id
    }

    fn remove(&mut self, id: ControlId) -> bool {
        match self.entries.remove(&id) {
            Some(member) => {
                self.by_addr.remove(&weak_addr(&member.control));
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_addr.clear();
    }

    /// Drop members whose control is gone. Returns how many were removed.
    fn prune(&mut self) -> usize {
        let dead: Vec<ControlId> = self
            .entries
            .iter()
            .filter(|(_, m)| m.control.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            self.remove(*id);
        }
        dead.len()
    }
}

fn rc_addr<C: ?Sized>(control: &Rc<C>) -> usize {
    Rc::as_ptr(control).cast::<()>() as usize
}

fn weak_addr<C: ?Sized>(control: &Weak<C>) -> usize {
    Weak::as_ptr(control).cast::<()>() as usize
}

struct Shared<T> {
    config: RegistryConfig,
    members: RefCell<Members<T>>,
    state: Observable<TriState>,
    disabled: Cell<bool>,
    batch: Batch,
    emit_scheduled: Cell<bool>,
    on_change: RefCell<Listener<[T]>>,
    on_touched: RefCell<Listener<()>>,
    visual: RefCell<Option<Rc<dyn CheckboxVisual>>>,
    queue: TaskQueue,
}

/// Handle to an aggregate registry. Cloning shares the registry.
pub struct Registry<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Non-owning handle held by child controls.
pub struct WeakRegistry<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakRegistry<T> {
    /// Recover a strong handle if the registry is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Registry<T>> {
        self.shared.upgrade().map(|shared| Registry { shared })
    }

    /// Whether this handle points at `registry`.
    #[must_use]
    pub fn is(&self, registry: &Registry<T>) -> bool {
        std::ptr::eq(self.shared.as_ptr(), Rc::as_ptr(&registry.shared))
    }
}

impl<T> std::fmt::Debug for WeakRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakRegistry")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Registry<T> {
    /// Registry with default config on the thread-local [`TaskQueue::global`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Registry with `config` on the thread-local task queue.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_queue(config, TaskQueue::global())
    }

    /// Registry that defers membership emissions onto `queue`.
    #[must_use]
    pub fn with_queue(config: RegistryConfig, queue: TaskQueue) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                members: RefCell::new(Members::new()),
                state: Observable::new(TriState::None),
                disabled: Cell::new(false),
                batch: Batch::new(),
                emit_scheduled: Cell::new(false),
                on_change: RefCell::new(Listener::new()),
                on_touched: RefCell::new(Listener::new()),
                visual: RefCell::new(None),
                queue,
            }),
        }
    }

    /// Non-owning handle for child controls.
    #[must_use]
    pub fn downgrade(&self) -> WeakRegistry<T> {
        WeakRegistry {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Whether two handles share one registry.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.shared, &b.shared)
    }

    /// The registry's configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// The queue deferred emissions are scheduled on.
    #[must_use]
    pub fn task_queue(&self) -> &TaskQueue {
        &self.shared.queue
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Register `control`, tracking its current [`read_value`](TriStateControl::read_value).
    ///
    /// Returns the member id. Adding an existing member returns its id and
    /// does nothing else.
    pub fn add_control<C: TriStateControl<T> + 'static>(&self, control: &Rc<C>) -> ControlId {
        let control: Rc<DynControl<T>> = Rc::clone(control) as Rc<DynControl<T>>;
        self.add_dyn_control(&control)
    }

    /// [`add_control`](Self::add_control) for an already type-erased control.
    pub fn add_dyn_control(&self, control: &Rc<DynControl<T>>) -> ControlId {
        let addr = rc_addr(control);
        if let Some(&id) = self.shared.members.borrow().by_addr.get(&addr) {
            return id;
        }
        let value = control.read_value();
        let id = self
            .shared
            .members
            .borrow_mut()
            .insert(Rc::downgrade(control), addr, value);
        control.set_disabled(self.shared.disabled.get());
        tracing::debug!(%id, members = self.len(), "control added");
        self.refresh_state();
        self.schedule_membership_emit();
        id
    }

    /// Remove `control` if it is a member. Returns whether it was.
    pub fn remove_control<C: ?Sized>(&self, control: &Rc<C>) -> bool {
        let id = self.shared.members.borrow().by_addr.get(&rc_addr(control)).copied();
        id.is_some_and(|id| self.remove_id(id))
    }

    /// Remove the member with `id`. Returns whether it existed.
    pub fn remove_id(&self, id: ControlId) -> bool {
        if !self.shared.members.borrow_mut().remove(id) {
            return false;
        }
        tracing::debug!(%id, members = self.len(), "control removed");
        self.refresh_state();
        self.schedule_membership_emit();
        true
    }

    /// Record `value` as the tracked value of `control`, registering it if
    /// needed, then recompute and emit synchronously.
    pub fn change_control_value<C: TriStateControl<T> + 'static>(
        &self,
        control: &Rc<C>,
        value: Option<T>,
    ) -> ControlId {
        let control: Rc<DynControl<T>> = Rc::clone(control) as Rc<DynControl<T>>;
        self.change_dyn_control_value(&control, value)
    }

    /// [`change_control_value`](Self::change_control_value) for a type-erased control.
    pub fn change_dyn_control_value(
        &self,
        control: &Rc<DynControl<T>>,
        value: Option<T>,
    ) -> ControlId {
        let addr = rc_addr(control);
        let (id, inserted) = {
            let mut members = self.shared.members.borrow_mut();
            match members.by_addr.get(&addr).copied() {
                Some(id) => {
                    if let Some(member) = members.entries.get_mut(&id) {
                        member.value = value;
                    }
                    (id, false)
                }
                None => (members.insert(Rc::downgrade(control), addr, value), true),
            }
        };
        if inserted {
            control.set_disabled(self.shared.disabled.get());
        }
        self.refresh_state();
        if self.shared.batch.defer() {
            return id;
        }
        self.emit_value_changed();
        id
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prune_dead();
        self.shared.members.borrow().entries.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prune_dead();
        self.shared.members.borrow().entries.is_empty()
    }

    /// Whether `control` is a member.
    #[must_use]
    pub fn contains<C: ?Sized>(&self, control: &Rc<C>) -> bool {
        self.shared.members.borrow().by_addr.contains_key(&rc_addr(control))
    }

    /// Whether `id` is a member.
    #[must_use]
    pub fn contains_id(&self, id: ControlId) -> bool {
        self.shared.members.borrow().entries.contains_key(&id)
    }

    /// Member ids in registration order.
    #[must_use]
    pub fn member_ids(&self) -> Vec<ControlId> {
        self.prune_dead();
        self.shared.members.borrow().entries.keys().copied().collect()
    }

    /// Tracked value of member `id` (`None` when unchecked or not a member).
    #[must_use]
    pub fn tracked_value(&self, id: ControlId) -> Option<T> {
        self.shared
            .members
            .borrow()
            .entries
            .get(&id)
            .and_then(|m| m.value.clone())
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Derive the aggregate state from the tracked values.
    #[must_use]
    pub fn get_state(&self) -> TriState {
        self.prune_dead();
        let members = self.shared.members.borrow();
        let present = members.entries.values().filter(|m| m.value.is_some()).count();
        TriState::from_counts(present, members.entries.len())
    }

    /// The last published state (what the visual shows).
    #[must_use]
    pub fn current_state(&self) -> TriState {
        self.shared.state.get()
    }

    /// Re-derive and publish the state.
    pub fn refresh_state(&self) {
        let state = self.get_state();
        self.publish(state);
    }

    /// Observe published state changes.
    pub fn subscribe_state(&self, callback: impl Fn(&TriState) + 'static) -> Subscription {
        self.shared.state.subscribe(callback)
    }

    /// Observe published state changes for as long as `scope` holds them.
    pub fn subscribe_state_in(
        &self,
        scope: &mut BindingScope,
        callback: impl Fn(&TriState) + 'static,
    ) {
        scope.subscribe(&self.shared.state, callback);
    }

    /// Binding that reads the published state as checkbox attributes.
    #[must_use]
    pub fn indicator_binding(&self) -> Binding<Indicator> {
        bind_mapped(&self.shared.state, |state| state.indicator())
    }

    /// Payloads of all checked members in registration order.
    #[must_use]
    pub fn selected_values(&self) -> Vec<T> {
        self.prune_dead();
        self.shared
            .members
            .borrow()
            .entries
            .values()
            .filter_map(|m| m.value.clone())
            .collect()
    }

    fn publish(&self, state: TriState) {
        self.shared.state.set(state);
        let visual = self.shared.visual.borrow().clone();
        if let Some(visual) = visual {
            visual.apply(state.indicator());
        }
    }

    // -----------------------------------------------------------------------
    // Disabled flag
    // -----------------------------------------------------------------------

    /// Set the disabled flag and propagate it to every live member.
    pub fn set_disabled_state(&self, disabled: bool) {
        self.shared.disabled.set(disabled);
        let controls = self.live_controls();
        tracing::debug!(disabled, members = controls.len(), "disabled state changed");
        for control in &controls {
            control.set_disabled(disabled);
        }
    }

    /// Current disabled flag.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.shared.disabled.get()
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    /// Handle activation of the aggregate checkbox.
    ///
    /// `Some` and `All` deselect every member; `None` selects every member.
    /// An empty registry stays `None`. Emits synchronously.
    pub fn on_aggregate_activate(&self) {
        let before = self.get_state();
        let target = before.activated();
        self.write_all_control_values(target == TriState::All);
        let after = if self.is_empty() {
            TriState::None
        } else {
            target
        };
        tracing::debug!(?before, ?after, "aggregate activated");
        self.publish(after);
        self.emit_value_changed();
    }

    /// Write `checked` to every live member.
    ///
    /// Tracked values and the published state follow the write; nothing is
    /// emitted. Call [`emit_value_changed`](Self::emit_value_changed)
    /// afterwards if needed.
    pub fn write_all_control_values(&self, checked: bool) {
        let controls = self.live_controls();
        let scope = self.shared.batch.enter();
        for control in &controls {
            control.write_value(checked);
        }
        let deferred = scope.finish();
        drop(controls);
        if !self.shared.batch.is_active() {
            self.resync_values();
            self.refresh_state();
        }
        tracing::trace!(checked, deferred, "bulk write");
    }

    /// Deselect everything, publish state, and emit.
    pub fn reset(&self) {
        self.write_all_control_values(false);
        self.emit_value_changed();
    }

    /// Externally supplied selection entry point.
    ///
    /// Pre-selecting children from a list is not supported: a non-empty
    /// `values` is reported at warn level and ignored.
    pub fn write_value(&self, values: &[T]) -> WriteOutcome {
        if values.is_empty() {
            return WriteOutcome::Ignored;
        }
        tracing::warn!(
            requested = values.len(),
            members = self.len(),
            "setting the selection from an external value is not supported; value ignored"
        );
        WriteOutcome::Unsupported {
            requested: values.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Listeners and emission
    // -----------------------------------------------------------------------

    /// Replace the change listener.
    pub fn register_on_change(&self, f: impl Fn(&[T]) + 'static) {
        self.shared.on_change.borrow_mut().set(f);
    }

    /// Replace the change listener, or reset it to the no-op with `None`.
    pub fn set_on_change(&self, f: Option<Rc<dyn Fn(&[T])>>) {
        self.shared.on_change.borrow_mut().set_opt(f);
    }

    /// Reset the change listener to the no-op.
    pub fn clear_on_change(&self) {
        self.shared.on_change.borrow_mut().clear();
    }

    /// Replace the touched listener.
    pub fn register_on_touched(&self, f: impl Fn() + 'static) {
        self.shared.on_touched.borrow_mut().set(move |_: &()| f());
    }

    /// Reset the touched listener to the no-op.
    pub fn clear_on_touched(&self) {
        self.shared.on_touched.borrow_mut().clear();
    }

    /// Send the selected payloads to the change listener, then call the
    /// touched listener.
    pub fn emit_value_changed(&self) {
        let values = self.selected_values();
        let on_change = self.shared.on_change.borrow().get();
        let on_touched = self.shared.on_touched.borrow().get();
        tracing::trace!(selected = values.len(), "emit value changed");
        if let Some(on_change) = on_change {
            on_change(&values);
        }
        if let Some(on_touched) = on_touched {
            on_touched(&());
        }
    }

    fn schedule_membership_emit(&self) {
        if self.shared.config.membership_emit == MembershipEmit::Coalesced
            && self.shared.emit_scheduled.replace(true)
        {
            return;
        }
        let weak = Rc::downgrade(&self.shared);
        self.shared.queue.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.emit_scheduled.set(false);
                let registry = Registry { shared };
                registry.refresh_state();
                registry.emit_value_changed();
            }
        });
    }

    // -----------------------------------------------------------------------
    // Visual and teardown
    // -----------------------------------------------------------------------

    /// Attach the visual element. It receives the style class and the
    /// current indicator immediately, then one update per recomputation.
    pub fn mount_visual<V: CheckboxVisual + 'static>(&self, visual: Rc<V>) {
        visual.set_class(&self.shared.config.checkbox_class);
        visual.apply(self.current_state().indicator());
        let visual: Rc<dyn CheckboxVisual> = visual;
        *self.shared.visual.borrow_mut() = Some(visual);
    }

    /// Detach the visual element, returning it.
    pub fn unmount_visual(&self) -> Option<Rc<dyn CheckboxVisual>> {
        self.shared.visual.borrow_mut().take()
    }

    /// Tear down: forget all members, the visual, and both listeners.
    ///
    /// Deferred emissions already queued still run but reach no listener.
    pub fn destroy(&self) {
        self.shared.members.borrow_mut().clear();
        self.shared.visual.borrow_mut().take();
        self.shared.on_change.borrow_mut().clear();
        self.shared.on_touched.borrow_mut().clear();
        self.shared.state.set(TriState::None);
        tracing::debug!("registry destroyed");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn prune_dead(&self) {
        let pruned = self.shared.members.borrow_mut().prune();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped controls pruned");
            self.schedule_membership_emit();
        }
    }

    fn live_controls(&self) -> Vec<Rc<DynControl<T>>> {
        self.prune_dead();
        self.shared
            .members
            .borrow()
            .entries
            .values()
            .filter_map(|m| m.control.upgrade())
            .collect()
    }

    /// Re-read every live member so tracked values match what a bulk write
    /// left behind, including controls that never report back.
    fn resync_values(&self) {
        self.prune_dead();
        let live: Vec<(ControlId, Rc<DynControl<T>>)> = self
            .shared
            .members
            .borrow()
            .entries
            .iter()
            .filter_map(|(id, m)| m.control.upgrade().map(|c| (*id, c)))
            .collect();
        let fresh: Vec<(ControlId, Option<T>)> =
            live.iter().map(|(id, c)| (*id, c.read_value())).collect();
        {
            let mut members = self.shared.members.borrow_mut();
            for (id, value) in fresh {
                if let Some(member) = members.entries.get_mut(&id) {
                    member.value = value;
                }
            }
        }
        drop(live);
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("members", &self.shared.members.borrow().entries.len())
            .field("state", &self.shared.state.with(|s| *s))
            .field("state_version", &self.shared.state.version())
            .field("state_subscribers", &self.shared.state.subscriber_count())
            .field("disabled", &self.shared.disabled.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::RecordingVisual;

    /// Control that never reports back to the registry.
    #[derive(Default)]
    struct Passive {
        checked: Cell<bool>,
        disabled: Cell<bool>,
        payload: u32,
    }

    impl Passive {
        fn new(payload: u32) -> Rc<Self> {
            Rc::new(Self {
                payload,
                ..Self::default()
            })
        }
    }

    impl TriStateControl<u32> for Passive {
        fn read_value(&self) -> Option<u32> {
            self.checked.get().then_some(self.payload)
        }
        fn write_value(&self, checked: bool) {
            self.checked.set(checked);
        }
        fn set_disabled(&self, disabled: bool) {
            self.disabled.set(disabled);
        }
    }

    fn registry() -> (Registry<u32>, TaskQueue) {
        let queue = TaskQueue::new();
        (Registry::with_queue(RegistryConfig::default(), queue.clone()), queue)
    }

    fn recorder(reg: &Registry<u32>) -> Rc<RefCell<Vec<Vec<u32>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        reg.register_on_change(move |values| sink.borrow_mut().push(values.to_vec()));
        log
    }

    #[test]
    fn empty_registry_is_none() {
        let (reg, _queue) = registry();
        assert_eq!(reg.get_state(), TriState::None);
        assert!(reg.is_empty());
    }

    #[test]
    fn re_adding_keeps_tracked_value() {
        let (reg, _queue) = registry();
        let c = Passive::new(7);
        c.checked.set(true);
        let id = reg.add_control(&c);
        c.checked.set(false);

        assert_eq!(reg.add_control(&c), id);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.tracked_value(id), Some(7));
    }

    #[test]
    fn add_applies_disabled_flag() {
        let (reg, _queue) = registry();
        reg.set_disabled_state(true);
        let c = Passive::new(1);
        reg.add_control(&c);
        assert!(c.disabled.get());

        reg.set_disabled_state(false);
        assert!(!c.disabled.get());
    }

    #[test]
    fn membership_emission_is_deferred_and_coalesced() {
        let (reg, queue) = registry();
        let log = recorder(&reg);
        let controls: Vec<_> = (0..3).map(Passive::new).collect();
        for c in &controls {
            c.checked.set(true);
            reg.add_control(c);
        }
        assert!(log.borrow().is_empty());
        assert_eq!(queue.pending(), 1);

        queue.run_pending();
        assert_eq!(*log.borrow(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn per_change_mode_schedules_each_call() {
        let queue = TaskQueue::new();
        let reg: Registry<u32> = Registry::with_queue(
            RegistryConfig::default().with_membership_emit(MembershipEmit::PerChange),
            queue.clone(),
        );
        let a = Passive::new(1);
        let b = Passive::new(2);
        reg.add_control(&a);
        reg.add_control(&b);
        reg.remove_control(&a);
        assert_eq!(queue.pending(), 3);
    }

    #[test]
    fn removing_non_member_is_noop() {
        let (reg, queue) = registry();
        let c = Passive::new(1);
        assert!(!reg.remove_control(&c));
        assert!(queue.is_idle());
        assert!(reg.is_empty());
    }

    #[test]
    fn change_registers_unknown_control_and_emits_now() {
        let (reg, _queue) = registry();
        let log = recorder(&reg);
        let c = Passive::new(4);
        let id = reg.change_control_value(&c, Some(4));

        assert!(reg.contains_id(id));
        assert_eq!(reg.current_state(), TriState::All);
        assert_eq!(*log.borrow(), vec![vec![4]]);
    }

    #[test]
    fn activation_works_for_passive_controls() {
        let (reg, _queue) = registry();
        let log = recorder(&reg);
        let controls: Vec<_> = (0..3).map(Passive::new).collect();
        for c in &controls {
            reg.add_control(c);
        }

        reg.on_aggregate_activate();
        assert_eq!(reg.current_state(), TriState::All);
        assert_eq!(log.borrow().last(), Some(&vec![0, 1, 2]));

        reg.on_aggregate_activate();
        assert_eq!(reg.current_state(), TriState::None);
        assert!(controls.iter().all(|c| c.read_value().is_none()));
    }

    #[test]
    fn visual_tracks_recomputations() {
        let (reg, _queue) = registry();
        let visual = Rc::new(RecordingVisual::new());
        reg.mount_visual(Rc::clone(&visual));
        assert_eq!(visual.class().as_deref(), Some("tri-state-checkbox-default"));
        assert_eq!(visual.last(), Some(TriState::None.indicator()));

        let a = Passive::new(1);
        let b = Passive::new(2);
        reg.add_control(&a);
        reg.add_control(&b);
        reg.change_control_value(&a, Some(1));
        assert_eq!(visual.last(), Some(TriState::Some.indicator()));

        reg.unmount_visual();
        let count = visual.update_count();
        reg.reset();
        assert_eq!(visual.update_count(), count);
    }

    #[test]
    fn dead_control_is_pruned() {
        let (reg, queue) = registry();
        let kept = Passive::new(1);
        reg.add_control(&kept);
        {
            let gone = Passive::new(2);
            gone.checked.set(true);
            reg.add_control(&gone);
        }
        queue.run_until_idle(4);

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.selected_values(), Vec::<u32>::new());
        reg.write_all_control_values(true);
        assert_eq!(kept.read_value(), Some(1));
        assert_eq!(reg.member_ids().len(), 1);
    }

    #[test]
    fn pruning_schedules_membership_emission() {
        let (reg, queue) = registry();
        let log = recorder(&reg);
        let kept = Passive::new(1);
        kept.checked.set(true);
        reg.add_control(&kept);
        let gone = Passive::new(2);
        reg.add_control(&gone);
        queue.run_until_idle(4);
        assert_eq!(reg.current_state(), TriState::Some);
        log.borrow_mut().clear();

        drop(gone);
        assert_eq!(reg.current_state(), TriState::Some);

        assert_eq!(reg.get_state(), TriState::All);
        assert_eq!(queue.pending(), 1);
        queue.run_pending();
        assert_eq!(reg.current_state(), TriState::All);
        assert_eq!(*log.borrow(), vec![vec![1]]);
    }

    #[test]
    fn activation_ignores_dead_members() {
        let (reg, _queue) = registry();
        let log = recorder(&reg);
        let live = Passive::new(1);
        reg.add_control(&live);
        {
            let gone = Passive::new(2);
            gone.checked.set(true);
            reg.add_control(&gone);
            assert_eq!(reg.get_state(), TriState::Some);
        }

        reg.on_aggregate_activate();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.current_state(), TriState::All);
        assert_eq!(reg.get_state(), TriState::All);
        assert_eq!(log.borrow().last(), Some(&vec![1]));

        reg.on_aggregate_activate();
        assert_eq!(reg.current_state(), reg.get_state());
        assert_eq!(log.borrow().last(), Some(&Vec::new()));
    }

    #[test]
    fn reset_with_dead_member_emits_nothing_selected() {
        let (reg, _queue) = registry();
        let log = recorder(&reg);
        let live = Passive::new(1);
        live.checked.set(true);
        reg.add_control(&live);
        {
            let gone = Passive::new(2);
            gone.checked.set(true);
            reg.add_control(&gone);
        }

        reg.reset();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.current_state(), TriState::None);
        assert_eq!(*log.borrow(), vec![Vec::<u32>::new()]);
    }

    #[test]
    fn standalone_bulk_write_publishes_state_without_emitting() {
        let (reg, _queue) = registry();
        let log = recorder(&reg);
        let visual = Rc::new(RecordingVisual::new());
        reg.mount_visual(Rc::clone(&visual));
        let controls: Vec<_> = (0..3).map(Passive::new).collect();
        for c in &controls {
            reg.add_control(c);
        }

        reg.write_all_control_values(true);
        assert!(controls.iter().all(|c| c.checked.get()));
        assert_eq!(reg.current_state(), TriState::All);
        assert_eq!(visual.last(), Some(TriState::All.indicator()));
        assert!(log.borrow().is_empty());

        reg.write_all_control_values(false);
        assert_eq!(reg.current_state(), TriState::None);
        assert_eq!(visual.last(), Some(TriState::None.indicator()));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn deferred_emissions_keep_queue_order_across_bursts() {
        let (reg, queue) = registry();
        let order = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&order);
        reg.register_on_change(move |values| sink.borrow_mut().push(format!("emit {values:?}")));

        let a = Passive::new(1);
        a.checked.set(true);
        reg.add_control(&a);
        let host = Rc::clone(&order);
        queue.schedule(move || host.borrow_mut().push("host 1".to_string()));
        let b = Passive::new(2);
        b.checked.set(true);
        reg.add_control(&b);
        queue.run_pending();

        let c = Passive::new(3);
        reg.add_control(&c);
        let host = Rc::clone(&order);
        queue.schedule(move || host.borrow_mut().push("host 2".to_string()));
        reg.remove_control(&a);
        queue.run_pending();

        assert_eq!(
            *order.borrow(),
            vec![
                "emit [1, 2]".to_string(),
                "host 1".to_string(),
                "emit [2]".to_string(),
                "host 2".to_string(),
            ]
        );
    }

    #[test]
    fn per_change_emissions_run_in_call_order() {
        let queue = TaskQueue::new();
        let reg: Registry<u32> = Registry::with_queue(
            RegistryConfig::default().with_membership_emit(MembershipEmit::PerChange),
            queue.clone(),
        );
        let log = recorder(&reg);
        let a = Passive::new(1);
        a.checked.set(true);
        reg.add_control(&a);
        let host = Rc::clone(&log);
        queue.schedule(move || host.borrow_mut().push(vec![99]));
        reg.remove_control(&a);
        queue.run_pending();

        assert_eq!(*log.borrow(), vec![Vec::new(), vec![99], Vec::new()]);
    }

    #[test]
    fn scoped_state_subscription_ends_with_scope() {
        let (reg, _queue) = registry();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let c = Passive::new(1);
        reg.add_control(&c);
        {
            let mut scope = BindingScope::new();
            let sink = Rc::clone(&seen);
            reg.subscribe_state_in(&mut scope, move |s| sink.borrow_mut().push(*s));
            reg.change_control_value(&c, Some(1));
            assert_eq!(scope.binding_count(), 1);
        }
        reg.change_control_value(&c, None);
        assert_eq!(*seen.borrow(), vec![TriState::All]);
    }

    #[test]
    fn destroy_drops_members_and_listeners() {
        let (reg, queue) = registry();
        let log = recorder(&reg);
        let c = Passive::new(1);
        reg.add_control(&c);
        reg.destroy();

        assert!(reg.is_empty());
        queue.run_pending();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn deferred_emit_after_registry_dropped_is_noop() {
        let (reg, queue) = registry();
        let c = Passive::new(1);
        reg.add_control(&c);
        drop(reg);
        assert_eq!(queue.run_pending(), 1);
    }

    #[test]
    fn write_value_reports_unsupported() {
        let (reg, _queue) = registry();
        assert_eq!(reg.write_value(&[]), WriteOutcome::Ignored);
        assert_eq!(
            reg.write_value(&[1, 2]),
            WriteOutcome::Unsupported { requested: 2 }
        );
        assert!(reg.is_empty());
    }
}
