//=========================================================================
// Event Bus
//=========================================================================
//
// Synchronous named-event multicast.
//
// Architecture:
//   on(name, f) ──→ HashMap<String, Vec<Registration>>  (insertion order)
//                              ↓
//   emit(name, payload) ──→ snapshot registrations
//                              ↓
//   each still-registered listener ← guarded call (panics → Diagnostic)
//
// Reentrancy: listeners may call on/off/emit. Emission walks a snapshot,
// so listeners added mid-emit wait for the next emission and listeners
// removed mid-emit are skipped immediately.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::Payload;
use crate::core::diagnostics::{DiagnosticOrigin, Diagnostics};

//=== Public API ==========================================================

/// Shared listener callback.
///
/// Keep a clone to register the same listener several times or to remove
/// it with `off_listener`.
pub type Listener = Rc<dyn Fn(&Payload)>;

/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

//=== Internal State ======================================================

struct Registration {
    id: ListenerId,
    listener: Listener,
}

#[derive(Default)]
struct BusState {
    listeners: HashMap<String, Vec<Registration>>,
    next_id: u64,
}

impl BusState {
    fn is_registered(&self, name: &str, id: ListenerId) -> bool {
        self.listeners
            .get(name)
            .is_some_and(|regs| regs.iter().any(|r| r.id == id))
    }
}

//=== EventBus ============================================================

/// One bus per session. Clones share the same registrations.
#[derive(Clone)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
    diagnostics: Diagnostics,
}

impl EventBus {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState::default())),
            diagnostics,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers `handler` for `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> ListenerId
    where
        F: Fn(&Payload) + 'static,
    {
        self.on_shared(name, Rc::new(handler))
    }

    /// Registers a shared listener. The same listener may be registered
    /// any number of times; each registration is delivered separately.
    pub fn on_shared(&self, name: &str, listener: Listener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state
            .listeners
            .entry(name.to_string())
            .or_default()
            .push(Registration { id, listener });

        trace!(target: "bus", "Listener {:?} registered for '{}'", id, name);
        id
    }

    /// Registers `handler` and returns a guard that removes it on drop.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> ListenerGuard
    where
        F: Fn(&Payload) + 'static,
    {
        let id = self.on(name, handler);
        ListenerGuard {
            bus: self.clone(),
            name: name.to_string(),
            id,
        }
    }

    /// Removes one registration. Returns `false` if it was not present.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(regs) = state.listeners.get_mut(name) else {
                return false;
            };
            let removed = regs
                .iter()
                .position(|r| r.id == id)
                .map(|index| regs.remove(index));
            if regs.is_empty() {
                state.listeners.remove(name);
            }
            removed
        };

        removed.is_some()
    }

    /// Removes every registration of `listener` under `name`. Returns how
    /// many were removed.
    pub fn off_listener(&self, name: &str, listener: &Listener) -> usize {
        let removed: Vec<Registration> = {
            let mut state = self.state.borrow_mut();
            let Some(regs) = state.listeners.get_mut(name) else {
                return 0;
            };
            let (matching, kept): (Vec<_>, Vec<_>) = std::mem::take(regs)
                .into_iter()
                .partition(|r| std::ptr::addr_eq(Rc::as_ptr(&r.listener), Rc::as_ptr(listener)));
            *regs = kept;
            if regs.is_empty() {
                state.listeners.remove(name);
            }
            matching
        };

        removed.len()
    }

    //--- Emission ---------------------------------------------------------

    /// Delivers `payload` to every listener of `name`, in registration
    /// order. A panicking listener is reported and skipped.
    pub fn emit(&self, name: &str, payload: Payload) {
        let snapshot: Vec<(ListenerId, Listener)> = {
            let state = self.state.borrow();
            match state.listeners.get(name) {
                Some(regs) => regs
                    .iter()
                    .map(|r| (r.id, Rc::clone(&r.listener)))
                    .collect(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            trace!(target: "bus", "'{}' emitted with no listeners", name);
            return;
        }

        debug!(target: "bus", "'{}' → {} listeners", name, snapshot.len());

        for (id, listener) in snapshot {
            if !self.state.borrow().is_registered(name, id) {
                continue;
            }
            let origin = DiagnosticOrigin::Listener { event: name.to_string() };
            self.diagnostics.guard(origin, || listener(&payload));
        }
    }

    //--- Query API --------------------------------------------------------

    pub fn listener_count(&self, name: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .get(name)
            .map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }

    //--- Teardown ---------------------------------------------------------

    /// Removes every listener of every event.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut self.state.borrow_mut().listeners);
        let count: usize = drained.values().map(Vec::len).sum();
        debug!(target: "bus", "Cleared {} listeners", count);
        drop(drained);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let mut counts: Vec<(&str, usize)> = state
            .listeners
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

//=== ListenerGuard =======================================================

/// Scoped registration. Dropping it removes the listener.
pub struct ListenerGuard {
    bus: EventBus,
    name: String,
    id: ListenerId,
}

impl ListenerGuard {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> &str {
        &self.name
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.bus.off(&self.name, self.id);
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("event", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
