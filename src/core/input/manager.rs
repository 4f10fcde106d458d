//=========================================================================
// Control Manager
//
// Arbitrates one physical input stream across many logical consumers.
//
// Architecture:
// ```text
//   bind(priority) ──→ sorted registry  [(−priority, key) ascending]
//                           │
//   dispatch(event) ──→ walk high → low, first binding claiming the
//                       action wins (lower bindings never see it)
//                           │
//   pointer capture ──→ first binding (in the same order) requesting it
//                           │
//   EventBus ←── `actions` (descriptor list changed)
//            ←── `pointer-lock` (locked flag flipped)
// ```
//
// Responsibilities:
// - Keep bindings ordered by descending priority, FIFO among equals
// - Route press/release events with priority pre-emption
// - Hold the pointer-lock capability as a singleton
// - Publish the displayable action set whenever it changes
//
// Notes:
// User callbacks are never invoked while the registry is borrowed, so
// handlers may bind, release, or emit freely. Replaced closures are
// dropped only after the borrow ends for the same reason.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::{debug, info, trace};

//=== Internal Dependencies ===============================================

use super::{ActionDescriptor, ActionId, Binding, InputEvent, Phase};
use crate::core::diagnostics::{DiagnosticOrigin, Diagnostics};
use crate::core::event_bus::{names, EventBus, Payload};

//=== Callback Types ======================================================

pub(crate) type Callback = Rc<dyn Fn()>;
pub(crate) type CaptureCallback = Rc<dyn Fn(bool)>;

//=== BindingKey ==========================================================

/// Identity of a binding. Keys increase with bind time and are never
/// reused within a session, so they double as the FIFO tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey(u64);

impl BindingKey {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

//=== ActionHandler =======================================================

/// Per-action callbacks of one binding.
#[derive(Clone, Default)]
pub(crate) struct ActionHandler {
    pub(crate) on_press: Option<Callback>,
    pub(crate) on_release: Option<Callback>,
    pub(crate) label: Option<String>,
}

impl ActionHandler {
    /// A binding claims an action once it handles either edge.
    fn claims(&self) -> bool {
        self.on_press.is_some() || self.on_release.is_some()
    }

    fn callback(&self, phase: Phase) -> Option<Callback> {
        match phase {
            Phase::Press => self.on_press.clone(),
            Phase::Release => self.on_release.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        !self.claims() && self.label.is_none()
    }
}

//=== BindingEntry ========================================================

struct BindingEntry {
    key: BindingKey,
    priority: i32,
    actions: BTreeMap<ActionId, ActionHandler>,
    wants_pointer: bool,
    on_capture: Option<CaptureCallback>,
}

impl BindingEntry {
    fn new(key: BindingKey, priority: i32) -> Self {
        Self {
            key,
            priority,
            actions: BTreeMap::new(),
            wants_pointer: false,
            on_capture: None,
        }
    }

    /// Sort key: higher priority first, then earlier bind first.
    fn rank(&self) -> (Reverse<i32>, BindingKey) {
        (Reverse(self.priority), self.key)
    }
}

//=== ControlState ========================================================

#[derive(Default)]
struct ControlState {
    /// Sorted by `BindingEntry::rank`; index 0 has precedence.
    bindings: Vec<BindingEntry>,
    next_key: u64,
    pointer_owner: Option<BindingKey>,
    /// Last `pointer-lock` value put on the bus.
    announced_lock: bool,
    /// Last `actions` list put on the bus.
    published: Vec<ActionDescriptor>,
}

impl ControlState {
    fn position(&self, key: BindingKey) -> Option<usize> {
        self.bindings.iter().position(|b| b.key == key)
    }

    fn entry(&self, key: BindingKey) -> Option<&BindingEntry> {
        self.bindings.iter().find(|b| b.key == key)
    }

    fn entry_mut(&mut self, key: BindingKey) -> Option<&mut BindingEntry> {
        self.bindings.iter_mut().find(|b| b.key == key)
    }

    fn insert(&mut self, entry: BindingEntry) {
        let rank = entry.rank();
        let at = self.bindings.partition_point(|b| b.rank() < rank);
        self.bindings.insert(at, entry);
    }

    fn capture_candidate(&self) -> Option<BindingKey> {
        self.bindings.iter().find(|b| b.wants_pointer).map(|b| b.key)
    }

    /// Displayable actions in precedence order. An action claimed higher
    /// up shadows the same action further down, labelled or not.
    fn describe(&self) -> Vec<ActionDescriptor> {
        let mut claimed = HashSet::new();
        let mut descriptors = Vec::new();

        for binding in &self.bindings {
            for (&action, handler) in &binding.actions {
                if !handler.claims() || !claimed.insert(action) {
                    continue;
                }
                if let Some(label) = &handler.label {
                    descriptors.push(ActionDescriptor::new(binding.key, action, label.clone()));
                }
            }
        }

        descriptors
    }
}

//=== ControlManager ======================================================

/// Priority-ordered registry of control bindings.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct ControlManager {
    state: Rc<RefCell<ControlState>>,
    bus: EventBus,
    diagnostics: Diagnostics,
}

impl ControlManager {
    //--- Construction -----------------------------------------------------

    pub fn new(bus: EventBus, diagnostics: Diagnostics) -> Self {
        Self {
            state: Rc::new(RefCell::new(ControlState::default())),
            bus,
            diagnostics,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a new binding and returns its handle.
    ///
    /// The handle starts with no handlers; assign them afterwards. Dropping
    /// the handle releases the binding.
    pub fn bind(&self, priority: i32) -> Binding {
        let key = {
            let mut state = self.state.borrow_mut();
            let key = BindingKey(state.next_key);
            state.next_key += 1;
            state.insert(BindingEntry::new(key, priority));
            key
        };

        debug!(target: "controls", "Bound {:?} at priority {}", key, priority);
        Binding::new(key, self.clone())
    }

    /// Removes a binding. Returns `false` if it was already gone.
    pub(crate) fn release(&self, key: BindingKey) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            state.position(key).map(|index| state.bindings.remove(index))
        };

        let Some(entry) = removed else {
            trace!(target: "controls", "{:?} already released", key);
            return false;
        };
        drop(entry);

        debug!(target: "controls", "Released {:?}", key);
        self.arbitrate_pointer();
        self.publish_actions();
        true
    }

    /// Moves a binding to a new priority. FIFO order among equals follows
    /// the original bind time.
    pub(crate) fn set_priority(&self, key: BindingKey, priority: i32) -> bool {
        let moved = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.position(key) else {
                return false;
            };
            let mut entry = state.bindings.remove(index);
            let moved = entry.priority != priority;
            entry.priority = priority;
            state.insert(entry);
            moved
        };

        if moved {
            debug!(target: "controls", "{:?} moved to priority {}", key, priority);
            self.arbitrate_pointer();
            self.publish_actions();
        }
        true
    }

    /// Edits the handler for `action` on binding `key`.
    pub(crate) fn update_action<F>(&self, key: BindingKey, action: ActionId, edit: F) -> bool
    where
        F: FnOnce(&mut ActionHandler),
    {
        let previous = {
            let mut state = self.state.borrow_mut();
            let Some(entry) = state.entry_mut(key) else {
                return false;
            };

            // Keep the old closures alive past the borrow.
            let previous = entry.actions.get(&action).cloned();
            let handler = entry.actions.entry(action).or_default();
            edit(handler);
            if handler.is_empty() {
                entry.actions.remove(&action);
            }
            previous
        };
        drop(previous);

        self.publish_actions();
        true
    }

    pub(crate) fn set_capture_observer(&self, key: BindingKey, observer: CaptureCallback) -> bool {
        let previous = {
            let mut state = self.state.borrow_mut();
            match state.entry_mut(key) {
                Some(entry) => Some(entry.on_capture.replace(observer)),
                None => None,
            }
        };

        previous.is_some()
    }

    pub(crate) fn set_pointer_request(&self, key: BindingKey, wants: bool) -> bool {
        let found = {
            let mut state = self.state.borrow_mut();
            match state.entry_mut(key) {
                Some(entry) => {
                    entry.wants_pointer = wants;
                    true
                }
                None => false,
            }
        };

        if found {
            trace!(target: "controls", "{:?} pointer request = {}", key, wants);
            self.arbitrate_pointer();
        }
        found
    }

    //--- Dispatch ---------------------------------------------------------

    /// Routes one raw input event.
    ///
    /// Press/release go to the highest-priority binding claiming the action
    /// and to no one else. Returns `true` if a binding claimed the event,
    /// or, for pointer-lock changes, if control state was affected.
    pub fn dispatch(&self, event: InputEvent) -> bool {
        match event {
            InputEvent::Press(action) => self.deliver(action, Phase::Press),
            InputEvent::Release(action) => self.deliver(action, Phase::Release),
            InputEvent::PointerLockChanged(locked) => self.sync_pointer_lock(locked),
        }
    }

    fn deliver(&self, action: ActionId, phase: Phase) -> bool {
        let claimed = {
            let state = self.state.borrow();
            state.bindings.iter().find_map(|binding| {
                binding
                    .actions
                    .get(&action)
                    .filter(|handler| handler.claims())
                    .map(|handler| (binding.key, handler.callback(phase)))
            })
        };

        let Some((key, callback)) = claimed else {
            trace!(target: "controls", "No binding claims '{}'", action);
            return false;
        };

        trace!(target: "controls", "'{}' {:?} → {:?}", action, phase, key);
        if let Some(callback) = callback {
            self.diagnostics
                .guard(DiagnosticOrigin::ActionHandler { action, phase }, || callback());
        }
        true
    }

    /// The platform only ever confirms or revokes; it cannot grant capture.
    fn sync_pointer_lock(&self, locked: bool) -> bool {
        if locked {
            let owner = self.state.borrow().pointer_owner;
            if owner.is_none() {
                debug!(target: "controls", "Platform reports pointer lock with no owner");
            }
            return owner.is_some();
        }

        let had_requests = {
            let mut state = self.state.borrow_mut();
            let mut any = false;
            for binding in state.bindings.iter_mut() {
                any |= std::mem::take(&mut binding.wants_pointer);
            }
            any
        };

        if had_requests {
            info!(target: "controls", "Platform revoked pointer lock, clearing requests");
            self.arbitrate_pointer();
        }
        had_requests
    }

    //--- Arbitration ------------------------------------------------------

    fn arbitrate_pointer(&self) {
        let (previous, next, lost, gained) = {
            let mut state = self.state.borrow_mut();
            let next = state.capture_candidate();
            if state.pointer_owner == next {
                return;
            }
            let previous = std::mem::replace(&mut state.pointer_owner, next);
            let lost = previous
                .and_then(|key| state.entry(key))
                .and_then(|entry| entry.on_capture.clone());
            let gained = next
                .and_then(|key| state.entry(key))
                .and_then(|entry| entry.on_capture.clone());
            (previous, next, lost, gained)
        };

        info!(target: "controls", "Pointer capture {:?} → {:?}", previous, next);

        if let Some(observer) = lost {
            self.diagnostics
                .guard(DiagnosticOrigin::CaptureObserver, || observer(false));
        }
        if let Some(observer) = gained {
            self.diagnostics
                .guard(DiagnosticOrigin::CaptureObserver, || observer(true));
        }

        self.announce_pointer_lock();
    }

    fn announce_pointer_lock(&self) {
        let locked = {
            let mut state = self.state.borrow_mut();
            let locked = state.pointer_owner.is_some();
            if locked == state.announced_lock {
                return;
            }
            state.announced_lock = locked;
            locked
        };

        self.bus.emit(names::POINTER_LOCK, Payload::Flag(locked));
    }

    fn publish_actions(&self) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let next = state.describe();
            if next == state.published {
                None
            } else {
                state.published = next.clone();
                Some(next)
            }
        };

        if let Some(actions) = changed {
            debug!(target: "controls", "Publishing {} actions", actions.len());
            self.bus.emit(names::ACTIONS, Payload::Actions(actions));
        }
    }

    //--- Query API --------------------------------------------------------

    /// Currently displayable actions (what the last `actions` event carried).
    pub fn actions(&self) -> Vec<ActionDescriptor> {
        self.state.borrow().published.clone()
    }

    /// Whether any binding holds pointer capture.
    pub fn pointer_locked(&self) -> bool {
        self.state.borrow().pointer_owner.is_some()
    }

    /// The binding holding pointer capture, if any.
    pub fn pointer_owner(&self) -> Option<BindingKey> {
        self.state.borrow().pointer_owner
    }

    /// Active bindings in dispatch order.
    pub fn dispatch_order(&self) -> Vec<BindingKey> {
        self.state.borrow().bindings.iter().map(|b| b.key).collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn priority_of(&self, key: BindingKey) -> Option<i32> {
        self.state.borrow().entry(key).map(|entry| entry.priority)
    }

    //--- Teardown ---------------------------------------------------------

    /// Drops every binding without emitting events. Outstanding handles
    /// become inert.
    pub(crate) fn clear(&self) {
        let drained = {
            let mut state = self.state.borrow_mut();
            state.pointer_owner = None;
            state.announced_lock = false;
            state.published.clear();
            std::mem::take(&mut state.bindings)
        };

        info!(target: "controls", "Cleared {} bindings", drained.len());
        drop(drained);
    }
}

impl fmt::Debug for ControlManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let order: Vec<_> = state
            .bindings
            .iter()
            .map(|b| (b.key.get(), b.priority))
            .collect();

        f.debug_struct("ControlManager")
            .field("bindings", &order)
            .field("pointer_owner", &state.pointer_owner)
            .field("actions", &state.published.len())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
