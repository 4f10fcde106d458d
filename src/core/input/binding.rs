//=========================================================================
// Binding Handle
//
// RAII handle for one registration in the ControlManager.
//
// Lifecycle:
// ```text
//   ControlManager::bind(priority)
//         ↓
//   Binding  ── on_press / on_release / label / request_pointer_lock ...
//         ↓
//   release() or drop  ── removed from the registry (idempotent)
// ```
//
// After release every method is a no-op; queries report an inactive
// binding.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::manager::ActionHandler;
use super::{ActionId, BindingKey, ControlManager};

//=== Binding =============================================================

/// A consumer's claim on the input stream.
pub struct Binding {
    key: BindingKey,
    manager: ControlManager,
}

impl Binding {
    pub(crate) fn new(key: BindingKey, manager: ControlManager) -> Self {
        Self { key, manager }
    }

    pub fn key(&self) -> BindingKey {
        self.key
    }

    /// Current priority, `None` once released.
    pub fn priority(&self) -> Option<i32> {
        self.manager.priority_of(self.key)
    }

    pub fn is_released(&self) -> bool {
        self.priority().is_none()
    }

    //--- Handlers ---------------------------------------------------------

    /// Handles the press edge of `action`. Replaces any previous handler.
    pub fn on_press<F>(&self, action: ActionId, handler: F) -> &Self
    where
        F: Fn() + 'static,
    {
        self.update(action, move |entry| entry.on_press = Some(Rc::new(handler)))
    }

    /// Handles the release edge of `action`. Replaces any previous handler.
    pub fn on_release<F>(&self, action: ActionId, handler: F) -> &Self
    where
        F: Fn() + 'static,
    {
        self.update(action, move |entry| entry.on_release = Some(Rc::new(handler)))
    }

    /// Describes `action` for on-screen prompts.
    ///
    /// Only shown while this binding also handles the action.
    pub fn label(&self, action: ActionId, label: impl Into<String>) -> &Self {
        let label = label.into();
        self.update(action, move |entry| entry.label = Some(label))
    }

    /// Drops the handlers and label for `action`, giving up the claim.
    pub fn clear_action(&self, action: ActionId) -> &Self {
        self.update(action, |entry| *entry = ActionHandler::default())
    }

    fn update<F: FnOnce(&mut ActionHandler)>(&self, action: ActionId, edit: F) -> &Self {
        if !self.manager.update_action(self.key, action, edit) {
            debug!(target: "controls", "{:?} released, ignoring update of '{}'", self.key, action);
        }
        self
    }

    //--- Priority ---------------------------------------------------------

    pub fn set_priority(&self, priority: i32) {
        self.manager.set_priority(self.key, priority);
    }

    //--- Pointer Capture --------------------------------------------------

    /// Asks for pointer capture. Granted immediately unless a binding
    /// ranked above this one holds it; otherwise granted once it lets go.
    pub fn request_pointer_lock(&self) {
        self.manager.set_pointer_request(self.key, true);
    }

    /// Withdraws the request. Capture passes to the next requester, if any.
    pub fn relinquish_pointer_lock(&self) {
        self.manager.set_pointer_request(self.key, false);
    }

    /// Whether this binding currently holds capture.
    pub fn holds_pointer(&self) -> bool {
        self.manager.pointer_owner() == Some(self.key)
    }

    /// Whether any binding holds capture.
    pub fn pointer_locked(&self) -> bool {
        self.manager.pointer_locked()
    }

    /// Called with `true` when this binding gains capture and `false` when
    /// it loses it, including pre-emption by a higher binding.
    pub fn on_capture_change<F>(&self, observer: F) -> &Self
    where
        F: Fn(bool) + 'static,
    {
        self.manager.set_capture_observer(self.key, Rc::new(observer));
        self
    }

    //--- Lifecycle --------------------------------------------------------

    /// Removes the binding. Safe to call any number of times.
    pub fn release(&self) {
        self.manager.release(self.key);
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("priority", &self.priority())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
