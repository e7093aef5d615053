#![forbid(unsafe_code)]

//! Change-notification hub embedded by observable objects.
//!
//! # Design
//!
//! [`Bindable`] replaces a base-class hierarchy with composition: an object
//! that wants to report property changes owns a `Bindable` and raises signals
//! through it. Listeners subscribe with [`subscribe()`](Bindable::subscribe)
//! and receive the changed property name synchronously, on the raising
//! caller's turn.
//!
//! Properties may declare dependents: registering `(base, dependent)` means
//! every signal for `base` is followed by a signal for `dependent`,
//! depth-first through the whole dependency graph.
//!
//! # Invariants
//!
//! 1. Listeners present at the time of a raise are notified exactly once per
//!    signal, in subscription order.
//! 2. Setting a property to an equal value is a no-op: no signal, no
//!    dependent propagation.
//! 3. `(base, dependent)` registration is idempotent; registration order is
//!    preserved and entries are never removed.
//! 4. A muted hub emits nothing; backing fields can still be mutated.
//!
//! # Failure Modes
//!
//! - **Dependency cycle**: propagation is a plain depth-first walk with no
//!   cycle detection. A cycle in the dependent graph recurses without bound.
//!   Keeping the graph acyclic is the registering caller's responsibility.
//! - **Listener churn during emission**: the listener list is snapshotted
//!   before callbacks run, so subscribing or unsubscribing mid-emission never
//!   corrupts iteration. A listener dropped mid-emission may still observe
//!   the signal that was in flight when it was present.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::BindError;

/// Listener callback: receives the name of the property that changed.
type Listener = dyn Fn(&str);

/// RAII guard for a registered listener.
///
/// The hub stores listeners weakly; this guard owns the strong reference.
/// Dropping it unsubscribes the listener before the next raise.
pub struct Subscription {
    _listener: Rc<Listener>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Change-notification hub: a subscriber list plus a dependent-property
/// graph.
///
/// Single-threaded by construction (`Rc`/`RefCell` interior); all callbacks
/// run synchronously and may reenter the hub.
pub struct Bindable {
    listeners: RefCell<Vec<Weak<Listener>>>,
    dependents: RefCell<HashMap<&'static str, Vec<&'static str>>>,
    muted: Cell<bool>,
}

impl Default for Bindable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bindable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindable")
            .field("listeners", &self.listeners.borrow().len())
            .field("dependents", &self.dependents.borrow().len())
            .field("muted", &self.muted.get())
            .finish()
    }
}

impl Bindable {
    /// Create an empty hub: no listeners, no dependents, unmuted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            dependents: RefCell::new(HashMap::new()),
            muted: Cell::new(false),
        }
    }

    /// Register a listener called with the property name on every raise.
    ///
    /// The listener stays registered for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use]
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> Subscription {
        let listener: Rc<Listener> = Rc::new(listener);
        self.listeners.borrow_mut().push(Rc::downgrade(&listener));
        Subscription {
            _listener: listener,
        }
    }

    /// Declare that every signal for `base` implies a signal for `dependent`.
    ///
    /// Idempotent per `(base, dependent)` pair; registration order determines
    /// propagation order. Entries are never removed.
    ///
    /// The dependent graph must stay acyclic: propagation does not detect
    /// cycles and a cyclic registration makes [`raise()`](Self::raise)
    /// recurse without bound.
    ///
    /// # Errors
    ///
    /// [`BindError::EmptyPropertyName`] if either name is empty.
    pub fn register_dependent(
        &self,
        base: &'static str,
        dependent: &'static str,
    ) -> Result<(), BindError> {
        if base.is_empty() || dependent.is_empty() {
            return Err(BindError::EmptyPropertyName);
        }
        let mut dependents = self.dependents.borrow_mut();
        let entries = dependents.entry(base).or_default();
        if !entries.contains(&dependent) {
            entries.push(dependent);
        }
        Ok(())
    }

    /// Compare-and-set a backing field, raising the change signal on change.
    ///
    /// Returns whether the stored value changed. Equal values (by
    /// `PartialEq`) are a silent no-op.
    ///
    /// The borrow on `slot` is released before the signal is raised, so
    /// listeners may read the field.
    ///
    /// # Errors
    ///
    /// [`BindError::EmptyPropertyName`] if `property` is empty.
    pub fn set<T: PartialEq>(
        &self,
        slot: &RefCell<T>,
        value: T,
        property: &str,
    ) -> Result<bool, BindError> {
        if property.is_empty() {
            return Err(BindError::EmptyPropertyName);
        }
        {
            let mut current = slot.borrow_mut();
            if *current == value {
                return Ok(false);
            }
            *current = value;
        }
        self.raise(property)?;
        Ok(true)
    }

    /// Raise the change signal for `property`, then depth-first for every
    /// registered dependent of it.
    ///
    /// Listeners present when the raise starts are notified synchronously,
    /// in subscription order. Dependent propagation does not de-duplicate
    /// across branches: a property reachable along two paths is signalled
    /// twice.
    ///
    /// A muted hub suppresses emission entirely (see [`mute()`](Self::mute)).
    ///
    /// # Errors
    ///
    /// [`BindError::EmptyPropertyName`] if `property` is empty.
    pub fn raise(&self, property: &str) -> Result<(), BindError> {
        if property.is_empty() {
            return Err(BindError::EmptyPropertyName);
        }
        if self.muted.get() {
            return Ok(());
        }

        // Snapshot the live listeners and prune dead entries. The borrow is
        // released before any callback runs so listeners can subscribe,
        // unsubscribe, or raise reentrantly.
        let snapshot: Vec<Rc<Listener>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|weak| weak.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in &snapshot {
            (**listener)(property);
        }

        // Dependents are cloned out so a listener registering new pairs
        // mid-raise cannot invalidate the walk.
        let dependents: Option<Vec<&'static str>> =
            self.dependents.borrow().get(property).cloned();
        if let Some(dependents) = dependents {
            for dependent in dependents {
                self.raise(dependent)?;
            }
        }
        Ok(())
    }

    /// Suppress all emission until [`unmute()`](Self::unmute).
    ///
    /// Teardown code mutes the hub so backing fields can be cleared without
    /// triggering listener callbacks.
    pub fn mute(&self) {
        self.muted.set(true);
    }

    /// Resume emission after [`mute()`](Self::mute).
    pub fn unmute(&self) {
        self.muted.set(false);
    }

    /// Whether emission is currently suppressed.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    /// Number of live listeners (dead entries are pruned first).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|weak| weak.strong_count() > 0);
        listeners.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
