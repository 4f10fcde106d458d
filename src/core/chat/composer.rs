//=========================================================================
// Chat Composer
//
// Input overlay for writing chat messages.
//
// Key handling (GUI priority):
// ```text
//   closed ── Enter ──→ open
//   open   ── Escape ──→ closed
//   open   ── MouseLeft (pointer locked) ──→ closed
// ```
//
// Responsibilities:
// - Claim Escape and MouseLeft only while open, so world input is
//   untouched while the composer is closed
// - Turn a submitted draft into a cancel, a known client command or a post
// - Defer closing while the pointer is locked, so the click that
//   re-locks the pointer is not also seen as a close
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

//=== Internal Dependencies ===============================================

use super::{ChatLog, ChatMessage, MessageDraft};
use crate::core::error::SchedulerError;
use crate::core::event_bus::{names, EventBus, ListenerGuard};
use crate::core::input::{priorities, ActionId, Binding, ControlManager};
use crate::core::scheduler::{Scheduler, TimerHandle};

/// Slash commands the client executes itself. Any other `/` text is chat.
pub const CLIENT_COMMANDS: &[&str] = &["stats"];

//=== Public Types ========================================================

/// Who is typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub id: String,
}

impl Author {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Outcome of `ChatComposer::submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty draft; the composer closed and nothing was sent.
    Cancelled,

    /// `/name arg ...` naming one of `CLIENT_COMMANDS`. Never posted.
    Command { name: String, args: Vec<String> },

    /// Appended to the log and broadcast.
    Posted(ChatMessage),
}

//=== Internal State ======================================================

struct ComposerState {
    open: bool,
    draft: String,
    pointer_locked: bool,
    pending_close: Option<TimerHandle>,
}

struct ComposerInner {
    state: RefCell<ComposerState>,
    binding: Binding,
}

/// Opens or closes, claiming or yielding the overlay's keys.
fn set_open(inner: &Rc<ComposerInner>, open: bool) {
    {
        let mut state = inner.state.borrow_mut();
        if state.open == open {
            return;
        }
        state.open = open;
    }

    debug!(target: "chat", "Composer {}", if open { "opened" } else { "closed" });

    if open {
        let escape = Rc::downgrade(inner);
        inner.binding.on_press(ActionId::Escape, move || {
            if let Some(inner) = escape.upgrade() {
                set_open(&inner, false);
            }
        });

        let click = Rc::downgrade(inner);
        inner.binding.on_press(ActionId::MouseLeft, move || {
            if let Some(inner) = click.upgrade() {
                let locked = inner.state.borrow().pointer_locked;
                if locked {
                    set_open(&inner, false);
                }
            }
        });
    } else {
        inner
            .binding
            .clear_action(ActionId::Escape)
            .clear_action(ActionId::MouseLeft);
    }
}

/// Splits `/name args...` when `name` is a known client command.
fn client_command(draft: &str) -> Option<(String, Vec<String>)> {
    let mut words = draft.strip_prefix('/')?.split_whitespace();
    let name = words.next()?;
    if !CLIENT_COMMANDS.contains(&name) {
        return None;
    }
    Some((name.to_string(), words.map(str::to_string).collect()))
}

//=== ChatComposer ========================================================

pub struct ChatComposer {
    inner: Rc<ComposerInner>,
    _lock_listener: ListenerGuard,
    chat: ChatLog,
    scheduler: Scheduler,
    close_debounce: Duration,
}

impl ChatComposer {
    pub fn new(
        controls: &ControlManager,
        bus: &EventBus,
        chat: &ChatLog,
        scheduler: &Scheduler,
        close_debounce: Duration,
    ) -> Self {
        let inner = Rc::new(ComposerInner {
            state: RefCell::new(ComposerState {
                open: false,
                draft: String::new(),
                pointer_locked: controls.pointer_locked(),
                pending_close: None,
            }),
            binding: controls.bind(priorities::GUI),
        });

        let tracker = Rc::downgrade(&inner);
        let lock_listener = bus.subscribe(names::POINTER_LOCK, move |payload| {
            if let (Some(inner), Some(locked)) = (tracker.upgrade(), payload.as_flag()) {
                inner.state.borrow_mut().pointer_locked = locked;
            }
        });

        let opener = Rc::downgrade(&inner);
        inner.binding.on_press(ActionId::Enter, move || {
            if let Some(inner) = opener.upgrade() {
                set_open(&inner, true);
            }
        });

        Self {
            inner,
            _lock_listener: lock_listener,
            chat: chat.clone(),
            scheduler: scheduler.clone(),
            close_debounce,
        }
    }

    //--- Open State -------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().open
    }

    pub fn open(&self) {
        set_open(&self.inner, true);
    }

    /// Closes now and drops any pending deferred close.
    pub fn close(&self) {
        let pending = self.inner.state.borrow_mut().pending_close.take();
        drop(pending);
        set_open(&self.inner, false);
    }

    /// Whether a deferred close is waiting on the scheduler.
    pub fn close_pending(&self) -> bool {
        self.inner
            .state
            .borrow()
            .pending_close
            .as_ref()
            .is_some_and(TimerHandle::is_pending)
    }

    /// Pointer-lock state as last seen on the bus.
    pub fn pointer_locked(&self) -> bool {
        self.inner.state.borrow().pointer_locked
    }

    //--- Draft ------------------------------------------------------------

    pub fn draft(&self) -> String {
        self.inner.state.borrow().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.inner.state.borrow_mut().draft = text.into();
    }

    //--- Submission -------------------------------------------------------

    /// Consumes the draft.
    ///
    /// Fails only if a deferred close cannot be scheduled; the draft is
    /// left untouched in that case.
    pub fn submit(&self, author: &Author) -> Result<Submission, SchedulerError> {
        if self.pointer_locked() {
            self.schedule_close()?;
        }

        let draft = std::mem::take(&mut self.inner.state.borrow_mut().draft);

        if draft.is_empty() {
            set_open(&self.inner, false);
            return Ok(Submission::Cancelled);
        }

        if let Some((name, args)) = client_command(&draft) {
            info!(target: "chat", "Client command '/{}' with {} args", name, args.len());
            return Ok(Submission::Command { name, args });
        }

        let message = self.chat.add(
            MessageDraft::new(draft)
                .id(Uuid::new_v4().to_string())
                .sender(author.name.clone())
                .sender_id(author.id.clone())
                .created_at(Utc::now()),
            true,
        );
        Ok(Submission::Posted(message))
    }

    fn schedule_close(&self) -> Result<(), SchedulerError> {
        let weak = Rc::downgrade(&self.inner);
        let handle = self.scheduler.schedule_after(self.close_debounce, move || {
            if let Some(inner) = weak.upgrade() {
                let finished = inner.state.borrow_mut().pending_close.take();
                set_open(&inner, false);
                drop(finished);
            }
        })?;

        let previous = self.inner.state.borrow_mut().pending_close.replace(handle);
        drop(previous);
        Ok(())
    }

    /// The composer's GUI-priority binding.
    pub fn binding(&self) -> &Binding {
        &self.inner.binding
    }
}

impl fmt::Debug for ChatComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ChatComposer")
            .field("open", &state.open)
            .field("draft", &state.draft)
            .field("pointer_locked", &state.pointer_locked)
            .field("pending_close", &state.pending_close.is_some())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use crate::core::chat::ChatTransport;
    use crate::core::diagnostics::Diagnostics;
    use crate::core::error::TransportError;
    use crate::core::input::InputEvent;

    //--- Test Helpers -----------------------------------------------------

    const DEBOUNCE: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_secs(2);

    struct Rig {
        controls: ControlManager,
        chat: ChatLog,
        scheduler: Scheduler,
        composer: ChatComposer,
        sent: Rc<RefCell<Vec<String>>>,
    }

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl ChatTransport for Recorder {
        fn broadcast(&self, message: &ChatMessage) -> Result<(), TransportError> {
            self.0.borrow_mut().push(message.body.clone());
            Ok(())
        }
    }

    fn rig() -> Rig {
        let (diagnostics, _rx) = Diagnostics::channel(8);
        let bus = EventBus::new(diagnostics.clone());
        let controls = ControlManager::new(bus.clone(), diagnostics.clone());
        let chat = ChatLog::new(bus.clone(), diagnostics.clone());
        let scheduler = Scheduler::new(diagnostics);
        let sent = Rc::new(RefCell::new(Vec::new()));
        chat.set_transport(Recorder(Rc::clone(&sent)));
        let composer = ChatComposer::new(&controls, &bus, &chat, &scheduler, DEBOUNCE);
        Rig { controls, chat, scheduler, composer, sent }
    }

    fn author() -> Author {
        Author::new("Alice", "user-1")
    }

    fn press(controls: &ControlManager, action: ActionId) -> bool {
        controls.dispatch(InputEvent::Press(action))
    }

    //=====================================================================
    // Opening and Closing
    //=====================================================================

    #[test]
    fn enter_opens() {
        let rig = rig();
        assert!(!rig.composer.is_open());
        assert!(press(&rig.controls, ActionId::Enter));
        assert!(rig.composer.is_open());

        // still open on a second Enter
        press(&rig.controls, ActionId::Enter);
        assert!(rig.composer.is_open());
    }

    #[test]
    fn escape_closes_when_open() {
        let rig = rig();
        assert!(!press(&rig.controls, ActionId::Escape));

        rig.composer.open();
        assert!(press(&rig.controls, ActionId::Escape));
        assert!(!rig.composer.is_open());
    }

    #[test]
    fn click_passes_through_while_closed() {
        let rig = rig();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let world = rig.controls.bind(priorities::PLAYER);
        world.on_press(ActionId::MouseLeft, move || counter.set(counter.get() + 1));

        press(&rig.controls, ActionId::MouseLeft);
        assert_eq!(clicks.get(), 1);

        rig.composer.open();
        press(&rig.controls, ActionId::MouseLeft);
        assert_eq!(clicks.get(), 1);
        assert!(rig.composer.is_open());
    }

    #[test]
    fn click_closes_only_with_pointer_locked() {
        let rig = rig();
        let world = rig.controls.bind(priorities::PLAYER);

        rig.composer.open();
        press(&rig.controls, ActionId::MouseLeft);
        assert!(rig.composer.is_open());

        world.request_pointer_lock();
        assert!(rig.composer.pointer_locked());
        press(&rig.controls, ActionId::MouseLeft);
        assert!(!rig.composer.is_open());
    }

    #[test]
    fn pointer_state_seeded_at_construction() {
        let (diagnostics, _rx) = Diagnostics::channel(8);
        let bus = EventBus::new(diagnostics.clone());
        let controls = ControlManager::new(bus.clone(), diagnostics.clone());
        let world = controls.bind(priorities::PLAYER);
        world.request_pointer_lock();

        let chat = ChatLog::new(bus.clone(), diagnostics.clone());
        let scheduler = Scheduler::new(diagnostics);
        let composer = ChatComposer::new(&controls, &bus, &chat, &scheduler, DEBOUNCE);
        assert!(composer.pointer_locked());
    }

    //=====================================================================
    // Submission
    //=====================================================================

    #[test]
    fn empty_draft_cancels_and_closes() {
        let rig = rig();
        rig.composer.open();
        rig.composer.set_draft("");

        assert_eq!(rig.composer.submit(&author()).expect("submit"), Submission::Cancelled);
        assert!(!rig.composer.is_open());
        assert!(rig.chat.is_empty());
        assert!(rig.sent.borrow().is_empty());
    }

    #[test]
    fn slash_draft_is_a_command() {
        let rig = rig();
        rig.composer.open();
        rig.composer.set_draft("/stats on  fast");

        assert_eq!(
            rig.composer.submit(&author()).expect("submit"),
            Submission::Command {
                name: "stats".into(),
                args: vec!["on".into(), "fast".into()],
            }
        );
        assert!(rig.chat.is_empty());
        assert_eq!(rig.composer.draft(), "");
    }

    #[test]
    fn unknown_slash_text_is_posted() {
        let rig = rig();
        rig.composer.open();
        rig.composer.set_draft("/shrug whatever");

        let Submission::Posted(message) = rig.composer.submit(&author()).expect("submit") else {
            panic!("expected a post");
        };
        assert_eq!(message.body, "/shrug whatever");
        assert_eq!(rig.chat.len(), 1);
        assert_eq!(*rig.sent.borrow(), vec!["/shrug whatever"]);
    }

    #[test]
    fn blank_draft_is_not_empty() {
        let rig = rig();
        rig.composer.open();
        rig.composer.set_draft("   ");

        let submission = rig.composer.submit(&author()).expect("submit");
        assert!(matches!(submission, Submission::Posted(ref m) if m.body == "   "));
        assert_eq!(rig.chat.len(), 1);
    }

    #[test]
    fn text_draft_is_posted_and_broadcast() {
        let rig = rig();
        rig.composer.open();
        rig.composer.set_draft("hello world");

        let Submission::Posted(message) = rig.composer.submit(&author()).expect("submit") else {
            panic!("expected a post");
        };
        assert!(Uuid::parse_str(&message.id).is_ok());
        assert_eq!(message.from.as_deref(), Some("Alice"));
        assert_eq!(message.from_id.as_deref(), Some("user-1"));
        assert_eq!(message.body, "hello world");
        assert_eq!(rig.chat.messages(), vec![message]);
        assert_eq!(*rig.sent.borrow(), vec!["hello world"]);

        // without pointer lock the composer stays open for the next line
        assert!(rig.composer.is_open());
        assert_eq!(rig.composer.draft(), "");
    }

    #[test]
    fn locked_submit_closes_after_debounce() {
        let rig = rig();
        let world = rig.controls.bind(priorities::PLAYER);
        world.request_pointer_lock();

        rig.composer.open();
        rig.composer.set_draft("brb");
        rig.composer.submit(&author()).expect("submit");

        assert!(rig.composer.is_open());
        assert!(rig.composer.close_pending());

        assert_eq!(rig.scheduler.pump_timeout(WAIT), 1);
        assert!(!rig.composer.is_open());
        assert!(!rig.composer.close_pending());
    }

    #[test]
    fn explicit_close_drops_pending_close() {
        let rig = rig();
        let world = rig.controls.bind(priorities::PLAYER);
        world.request_pointer_lock();

        rig.composer.open();
        rig.composer.set_draft("x");
        rig.composer.submit(&author()).expect("submit");
        rig.composer.close();

        assert_eq!(rig.scheduler.pending(), 0);
    }

    //=====================================================================
    // Teardown
    //=====================================================================

    #[test]
    fn drop_releases_binding_and_timer() {
        let rig = rig();
        let world = rig.controls.bind(priorities::PLAYER);
        world.request_pointer_lock();
        rig.composer.open();
        rig.composer.set_draft("bye");
        rig.composer.submit(&author()).expect("submit");

        let Rig { controls, scheduler, composer, .. } = rig;
        assert_eq!(controls.len(), 2);
        drop(composer);

        assert_eq!(controls.len(), 1);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pump_timeout(Duration::from_millis(50)), 0);
    }
}
