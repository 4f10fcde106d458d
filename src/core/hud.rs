//=========================================================================
// HUD State
//
// Latest value of every bus event the overlay layer renders from.
//
// Event → field:
// ```text
//   ready         Flag    → loading overlay hidden once true
//   context       Opaque  → context wheel (Empty closes)
//   inspect       Opaque  → inspector pane (Empty closes)
//   code          Flag    → code pane, shown with the inspector
//   avatar        Opaque  → avatar pane (Empty closes)
//   disconnect    Flag    → disconnected banner
//   actions       Actions → prompt list
//   pointer-lock  Flag    → reticle
// ```
//
// Notes:
// Events are not buffered, so the control-derived fields are seeded from
// the ControlManager at attach time.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::event_bus::{names, EventBus, ListenerGuard, Payload};
use crate::core::input::{ActionDescriptor, ControlManager};

//=== Internal State ======================================================

#[derive(Debug, Default)]
struct HudFields {
    ready: bool,
    context: Payload,
    inspect: Payload,
    code: bool,
    avatar: Payload,
    disconnected: bool,
    actions: Vec<ActionDescriptor>,
    pointer_locked: bool,
    revision: u64,
}

//=== HudState ============================================================

/// Listens to the session bus until dropped.
pub struct HudState {
    fields: Rc<RefCell<HudFields>>,
    _listeners: Vec<ListenerGuard>,
}

impl HudState {
    pub fn attach(bus: &EventBus, controls: &ControlManager) -> Self {
        let fields = Rc::new(RefCell::new(HudFields {
            actions: controls.actions(),
            pointer_locked: controls.pointer_locked(),
            ..HudFields::default()
        }));

        let listeners = vec![
            track(bus, &fields, names::READY, |f, p| f.ready = p.as_flag().unwrap_or(false)),
            track(bus, &fields, names::CONTEXT, |f, p| f.context = p.clone()),
            track(bus, &fields, names::INSPECT, |f, p| f.inspect = p.clone()),
            track(bus, &fields, names::CODE, |f, p| f.code = p.as_flag().unwrap_or(false)),
            track(bus, &fields, names::AVATAR, |f, p| f.avatar = p.clone()),
            track(bus, &fields, names::DISCONNECT, |f, p| {
                f.disconnected = p.as_flag().unwrap_or(false)
            }),
            track(bus, &fields, names::ACTIONS, |f, p| {
                f.actions = p.as_actions().map(<[_]>::to_vec).unwrap_or_default()
            }),
            track(bus, &fields, names::POINTER_LOCK, |f, p| {
                f.pointer_locked = p.as_flag().unwrap_or(false)
            }),
        ];

        Self {
            fields,
            _listeners: listeners,
        }
    }

    //--- Raw Values -------------------------------------------------------

    pub fn is_ready(&self) -> bool {
        self.fields.borrow().ready
    }

    /// Open context menu, `Payload::Empty` when closed.
    pub fn context(&self) -> Payload {
        self.fields.borrow().context.clone()
    }

    /// Inspected entity, `Payload::Empty` when closed.
    pub fn inspect(&self) -> Payload {
        self.fields.borrow().inspect.clone()
    }

    pub fn code_enabled(&self) -> bool {
        self.fields.borrow().code
    }

    pub fn avatar(&self) -> Payload {
        self.fields.borrow().avatar.clone()
    }

    pub fn is_disconnected(&self) -> bool {
        self.fields.borrow().disconnected
    }

    pub fn actions(&self) -> Vec<ActionDescriptor> {
        self.fields.borrow().actions.clone()
    }

    pub fn pointer_locked(&self) -> bool {
        self.fields.borrow().pointer_locked
    }

    /// Increments on every tracked event.
    pub fn revision(&self) -> u64 {
        self.fields.borrow().revision
    }

    //--- Derived Views ----------------------------------------------------

    pub fn loading_visible(&self) -> bool {
        !self.fields.borrow().ready
    }

    pub fn reticle_visible(&self) -> bool {
        self.fields.borrow().pointer_locked
    }

    pub fn context_visible(&self) -> bool {
        !self.fields.borrow().context.is_empty()
    }

    pub fn inspect_visible(&self) -> bool {
        !self.fields.borrow().inspect.is_empty()
    }

    /// Code pane needs both an inspected entity and the code flag.
    pub fn code_visible(&self) -> bool {
        let fields = self.fields.borrow();
        fields.code && !fields.inspect.is_empty()
    }

    pub fn avatar_visible(&self) -> bool {
        !self.fields.borrow().avatar.is_empty()
    }
}

fn track<F>(bus: &EventBus, fields: &Rc<RefCell<HudFields>>, name: &'static str, apply: F) -> ListenerGuard
where
    F: Fn(&mut HudFields, &Payload) + 'static,
{
    let fields = Rc::downgrade(fields);
    bus.subscribe(name, move |payload| {
        if let Some(fields) = fields.upgrade() {
            let mut fields = fields.borrow_mut();
            apply(&mut *fields, payload);
            fields.revision += 1;
            trace!(target: "bus", "HUD took '{}'", name);
        }
    })
}

impl fmt::Debug for HudState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HudState").field(&*self.fields.borrow()).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::Diagnostics;
    use crate::core::input::ActionId;

    #[derive(Debug, PartialEq)]
    struct Entity {
        id: &'static str,
    }

    fn setup() -> (EventBus, ControlManager) {
        let (diagnostics, _rx) = Diagnostics::channel(8);
        let bus = EventBus::new(diagnostics.clone());
        (bus.clone(), ControlManager::new(bus, diagnostics))
    }

    #[test]
    fn loading_until_ready() {
        let (bus, controls) = setup();
        let hud = HudState::attach(&bus, &controls);
        assert!(hud.loading_visible());

        bus.emit(names::READY, Payload::Flag(true));
        assert!(!hud.loading_visible());
        assert!(hud.is_ready());
    }

    #[test]
    fn code_pane_requires_inspector() {
        let (bus, controls) = setup();
        let hud = HudState::attach(&bus, &controls);

        bus.emit(names::CODE, Payload::Flag(true));
        assert!(!hud.code_visible());

        bus.emit(names::INSPECT, Payload::opaque(Entity { id: "crate-7" }));
        assert!(hud.code_visible());
        assert_eq!(
            hud.inspect().downcast_ref::<Entity>(),
            Some(&Entity { id: "crate-7" })
        );

        bus.emit(names::INSPECT, Payload::Empty);
        assert!(!hud.inspect_visible());
        assert!(!hud.code_visible());
    }

    #[test]
    fn seeded_from_present_control_state() {
        let (bus, controls) = setup();
        let binding = controls.bind(0);
        binding
            .on_press(ActionId::KeyE, || {})
            .label(ActionId::KeyE, "Open")
            .request_pointer_lock();

        let hud = HudState::attach(&bus, &controls);
        assert!(hud.reticle_visible());
        assert_eq!(hud.actions().len(), 1);

        binding.release();
        assert!(!hud.reticle_visible());
        assert!(hud.actions().is_empty());
    }

    #[test]
    fn panels_and_disconnect() {
        let (bus, controls) = setup();
        let hud = HudState::attach(&bus, &controls);

        bus.emit(names::CONTEXT, Payload::opaque("menu"));
        bus.emit(names::AVATAR, Payload::opaque(42_u32));
        bus.emit(names::DISCONNECT, Payload::Flag(true));

        assert!(hud.context_visible());
        assert!(hud.avatar_visible());
        assert!(hud.is_disconnected());
        assert_eq!(hud.revision(), 3);
    }

    #[test]
    fn drop_unregisters_listeners() {
        let (bus, controls) = setup();
        let hud = HudState::attach(&bus, &controls);
        assert_eq!(bus.listener_count(names::READY), 1);

        drop(hud);
        assert!(!bus.has_listeners(names::READY));
        assert!(!bus.has_listeners(names::POINTER_LOCK));
    }
}
