//=========================================================================
// Chat Log
//
// Authoritative, append-only message list for one session.
//
// Architecture:
// ```text
//   local composer ─┐
//                   ├─→ add(draft, broadcast) ─→ Rc<Vec<ChatMessage>>
//   network inbound ┘            │
//                                ├─→ subscribers (subscription order)
//                                └─→ ChatTransport::broadcast (if asked)
//                                         │ Err(Disconnected)
//                                         └─→ bus `disconnect`
// ```
//
// Notes:
// Subscribers get a shared snapshot of the whole list. Appending while a
// snapshot is still held copies the list once; messages themselves never
// change after append.
//
// An `add` made from inside a subscriber is queued behind the current
// delivery round, so every subscriber sees each list once and in order.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};

//=== Internal Dependencies ===============================================

use super::{ChatMessage, MessageDraft};
use crate::core::diagnostics::{Diagnostic, DiagnosticOrigin, Diagnostics};
use crate::core::error::TransportError;
use crate::core::event_bus::{names, EventBus, Payload};

//=== ChatTransport =======================================================

/// Network collaborator that distributes local messages to remote
/// participants. Retries are its own business.
pub trait ChatTransport {
    fn broadcast(&self, message: &ChatMessage) -> Result<(), TransportError>;
}

//=== Internal State ======================================================

type Subscriber = Rc<dyn Fn(&[ChatMessage])>;

/// A list to deliver, plus the message to broadcast once it is delivered.
type Delivery = (Rc<Vec<ChatMessage>>, Option<ChatMessage>);

#[derive(Default)]
struct ChatState {
    messages: Rc<Vec<ChatMessage>>,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscriber: u64,
    transport: Option<Rc<dyn ChatTransport>>,
    pending: VecDeque<Delivery>,
    flushing: bool,
}

impl ChatState {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.iter().any(|(sid, _)| *sid == id)
    }
}

//=== ChatLog =============================================================

/// Shared chat log. Clones refer to the same log.
#[derive(Clone)]
pub struct ChatLog {
    state: Rc<RefCell<ChatState>>,
    bus: EventBus,
    diagnostics: Diagnostics,
}

impl ChatLog {
    pub fn new(bus: EventBus, diagnostics: Diagnostics) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChatState::default())),
            bus,
            diagnostics,
        }
    }

    /// Installs the network collaborator used for broadcasts.
    pub fn set_transport<T: ChatTransport + 'static>(&self, transport: T) {
        self.state.borrow_mut().transport = Some(Rc::new(transport));
    }

    pub fn clear_transport(&self) {
        let previous = self.state.borrow_mut().transport.take();
        drop(previous);
    }

    //--- Appending --------------------------------------------------------

    /// Appends a message, notifies subscribers, then broadcasts it when
    /// `broadcast` is set. Returns the appended message.
    pub fn add(&self, draft: impl Into<MessageDraft>, broadcast: bool) -> ChatMessage {
        let message = draft.into().finish();

        let total = {
            let mut state = self.state.borrow_mut();
            Rc::make_mut(&mut state.messages).push(message.clone());
            let snapshot = Rc::clone(&state.messages);
            let outbound = broadcast.then(|| message.clone());
            state.pending.push_back((snapshot, outbound));
            state.messages.len()
        };

        debug!(
            target: "chat",
            "Appended '{}' ({} total, broadcast: {})",
            message.id, total, broadcast
        );

        self.flush();
        message
    }

    /// Delivers queued lists in append order. Re-entrant calls return at
    /// once and leave their delivery to the outer loop.
    fn flush(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.flushing {
                return;
            }
            state.flushing = true;
        }

        loop {
            let next = self.state.borrow_mut().pending.pop_front();
            let Some((snapshot, outbound)) = next else {
                break;
            };
            self.notify(&snapshot);
            if let Some(message) = outbound {
                self.broadcast(&message);
            }
        }

        self.state.borrow_mut().flushing = false;
    }

    fn notify(&self, snapshot: &Rc<Vec<ChatMessage>>) {
        let subscribers: Vec<(u64, Subscriber)> = self
            .state
            .borrow()
            .subscribers
            .iter()
            .map(|(id, subscriber)| (*id, Rc::clone(subscriber)))
            .collect();

        for (id, subscriber) in subscribers {
            if !self.state.borrow().is_subscribed(id) {
                continue;
            }
            self.diagnostics
                .guard(DiagnosticOrigin::ChatSubscriber, || subscriber(snapshot));
        }
    }

    fn broadcast(&self, message: &ChatMessage) {
        let transport = self.state.borrow().transport.clone();
        let Some(transport) = transport else {
            debug!(target: "chat", "No transport installed, '{}' stays local", message.id);
            return;
        };

        let mut outcome: Result<(), TransportError> = Ok(());
        let completed = self
            .diagnostics
            .guard(DiagnosticOrigin::ChatTransport, || outcome = transport.broadcast(message));
        if !completed {
            return;
        }

        match outcome {
            Ok(()) => trace!(target: "chat", "Broadcast '{}'", message.id),
            Err(err) => {
                warn!(target: "chat", "Broadcast of '{}' failed: {}", message.id, err);
                let disconnected = err == TransportError::Disconnected;
                self.diagnostics
                    .report(Diagnostic::new(DiagnosticOrigin::ChatTransport, err.to_string()));
                if disconnected {
                    self.bus.emit(names::DISCONNECT, Payload::Flag(true));
                }
            }
        }
    }

    //--- Subscription -----------------------------------------------------

    /// Registers `callback`, calls it right away with the current list and
    /// again after every append.
    pub fn subscribe<F>(&self, callback: F) -> ChatSubscription
    where
        F: Fn(&[ChatMessage]) + 'static,
    {
        let subscriber: Subscriber = Rc::new(callback);
        let (id, snapshot) = {
            let mut state = self.state.borrow_mut();
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            state.subscribers.push((id, Rc::clone(&subscriber)));
            (id, Rc::clone(&state.messages))
        };

        trace!(target: "chat", "Subscriber {} added", id);
        self.diagnostics
            .guard(DiagnosticOrigin::ChatSubscriber, || subscriber(&snapshot));

        ChatSubscription {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    //--- Query API --------------------------------------------------------

    /// Copy of the current list, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        Vec::clone(&self.state.borrow().messages)
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.state.borrow().messages.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    //--- Teardown ---------------------------------------------------------

    /// Drops every subscriber and the transport. History is kept.
    pub(crate) fn clear_subscribers(&self) {
        let (subscribers, transport) = {
            let mut state = self.state.borrow_mut();
            (std::mem::take(&mut state.subscribers), state.transport.take())
        };
        debug!(target: "chat", "Cleared {} subscribers", subscribers.len());
        drop(subscribers);
        drop(transport);
    }
}

impl fmt::Debug for ChatLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChatLog")
            .field("messages", &state.messages.len())
            .field("subscribers", &state.subscribers.len())
            .field("transport", &state.transport.is_some())
            .finish()
    }
}

//=== ChatSubscription ====================================================

/// Live chat subscription. Dropping it unsubscribes.
pub struct ChatSubscription {
    id: u64,
    state: Weak<RefCell<ChatState>>,
}

impl ChatSubscription {
    /// Removes exactly this subscriber. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let removed = {
            let mut state = state.borrow_mut();
            state
                .subscribers
                .iter()
                .position(|(id, _)| *id == self.id)
                .map(|index| state.subscribers.remove(index))
        };

        if removed.is_some() {
            trace!(target: "chat", "Subscriber {} removed", self.id);
        }
        drop(removed);
    }

    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().is_subscribed(self.id))
    }
}

impl Drop for ChatSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ChatSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSubscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use crossbeam_channel::Receiver;

    //--- Test Helpers -----------------------------------------------------

    fn setup() -> (ChatLog, EventBus, Receiver<Diagnostic>) {
        let (diagnostics, rx) = Diagnostics::channel(8);
        let bus = EventBus::new(diagnostics.clone());
        (ChatLog::new(bus.clone(), diagnostics), bus, rx)
    }

    fn ids_recorder() -> (Rc<RefCell<Vec<Vec<String>>>>, impl Fn(&[ChatMessage]) + 'static) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let callback = move |messages: &[ChatMessage]| {
            sink.borrow_mut()
                .push(messages.iter().map(|m| m.id.clone()).collect());
        };
        (calls, callback)
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Rc<RefCell<Vec<String>>>,
        fail_with: Option<TransportError>,
    }

    impl ChatTransport for RecordingTransport {
        fn broadcast(&self, message: &ChatMessage) -> Result<(), TransportError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.sent.borrow_mut().push(message.id.clone());
            Ok(())
        }
    }

    //=====================================================================
    // Append and Subscribe
    //=====================================================================

    #[test]
    fn subscriber_sees_history_then_each_append() {
        let (chat, _bus, _rx) = setup();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        chat.add(MessageDraft::new("hi").id("m1").sender("Alice").created_at(t0), true);
        let (calls, callback) = ids_recorder();
        let _sub = chat.subscribe(callback);
        assert_eq!(*calls.borrow(), vec![vec!["m1".to_string()]]);

        chat.add(
            MessageDraft::new("there").id("m2").created_at(t0 + Duration::seconds(5)),
            false,
        );
        assert_eq!(
            calls.borrow().last().cloned(),
            Some(vec!["m1".to_string(), "m2".to_string()])
        );
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn insertion_order_is_kept_for_any_origin() {
        let (chat, _bus, _rx) = setup();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        // a remote message with an older timestamp still goes last
        chat.add(MessageDraft::new("local").id("a").created_at(t0), true);
        chat.add(MessageDraft::new("remote").id("b").created_at(t0 - Duration::hours(1)), false);
        chat.add(MessageDraft::new("local").id("c").created_at(t0), true);

        let ids: Vec<_> = chat.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn add_assigns_missing_id() {
        let (chat, _bus, _rx) = setup();
        let message = chat.add("no id", false);
        assert!(!message.id.is_empty());
        assert_eq!(chat.last(), Some(message));
    }

    #[test]
    fn subscribers_notified_in_subscription_order() {
        let (chat, _bus, _rx) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        let _a = chat.subscribe(move |_| first.borrow_mut().push("a"));
        let second = Rc::clone(&order);
        let _b = chat.subscribe(move |_| second.borrow_mut().push("b"));
        order.borrow_mut().clear();

        chat.add("x", false);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn subscriber_may_add_during_notification() {
        let (chat, _bus, _rx) = setup();
        let inner = chat.clone();
        let _echo = chat.subscribe(move |messages| {
            if messages.last().is_some_and(|m| m.body == "ping") {
                inner.add("pong", false);
            }
        });

        chat.add("ping", false);
        let bodies: Vec<_> = chat.messages().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["ping", "pong"]);
    }

    #[test]
    fn nested_add_reaches_later_subscribers_in_order() {
        let (chat, _bus, _rx) = setup();
        let inner = chat.clone();
        let _echo = chat.subscribe(move |messages| {
            if messages.last().is_some_and(|m| m.body == "ping") {
                inner.add("pong", false);
            }
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _watcher = chat.subscribe(move |messages| {
            let bodies: Vec<String> = messages.iter().map(|m| m.body.clone()).collect();
            sink.borrow_mut().push(bodies);
        });

        chat.add("ping", false);
        assert_eq!(
            *seen.borrow(),
            vec![vec![], vec!["ping".to_string()], vec!["ping".to_string(), "pong".to_string()]]
        );
    }

    #[test]
    fn nested_broadcast_follows_outer_broadcast() {
        let (chat, _bus, _rx) = setup();
        let transport = RecordingTransport::default();
        let sent = Rc::clone(&transport.sent);
        chat.set_transport(transport);

        let inner = chat.clone();
        let _echo = chat.subscribe(move |messages| {
            if messages.last().is_some_and(|m| m.body == "ping") {
                inner.add("pong", true);
            }
        });

        chat.add("ping", true);
        let ids: Vec<String> = chat.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(*sent.borrow(), ids);
    }

    //=====================================================================
    // Unsubscribe
    //=====================================================================

    #[test]
    fn unsubscribe_is_idempotent_and_targeted() {
        let (chat, _bus, _rx) = setup();
        let (a_calls, a) = ids_recorder();
        let (b_calls, b) = ids_recorder();

        let sub_a = chat.subscribe(a);
        let _sub_b = chat.subscribe(b);

        sub_a.unsubscribe();
        sub_a.unsubscribe();
        assert!(!sub_a.is_active());
        assert_eq!(chat.subscriber_count(), 1);

        chat.add("after", false);
        assert_eq!(a_calls.borrow().len(), 1);
        assert_eq!(b_calls.borrow().len(), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let (chat, _bus, _rx) = setup();
        let (calls, callback) = ids_recorder();
        {
            let _sub = chat.subscribe(callback);
        }
        chat.add("later", false);
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(chat.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_log_is_harmless() {
        let (chat, bus, _rx) = setup();
        let sub = chat.subscribe(|_| {});
        drop(chat);
        drop(bus);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    //=====================================================================
    // Broadcast
    //=====================================================================

    #[test]
    fn broadcast_only_when_requested() {
        let (chat, _bus, _rx) = setup();
        let sent = Rc::new(RefCell::new(Vec::new()));
        chat.set_transport(RecordingTransport { sent: Rc::clone(&sent), fail_with: None });

        chat.add(MessageDraft::new("out").id("m1"), true);
        chat.add(MessageDraft::new("in").id("m2"), false);

        assert_eq!(*sent.borrow(), vec!["m1"]);
    }

    #[test]
    fn disconnect_keeps_history_and_signals_bus() {
        let (chat, bus, rx) = setup();
        let disconnected = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&disconnected);
        bus.on(names::DISCONNECT, move |p| sink.borrow_mut().push(p.as_flag()));

        chat.set_transport(RecordingTransport {
            fail_with: Some(TransportError::Disconnected),
            ..Default::default()
        });
        chat.add(MessageDraft::new("lost").id("m1"), true);

        assert_eq!(chat.len(), 1);
        assert_eq!(*disconnected.borrow(), vec![Some(true)]);
        let diagnostic = rx.try_recv().expect("failure should be reported");
        assert_eq!(diagnostic.origin, DiagnosticOrigin::ChatTransport);
    }

    #[test]
    fn rejection_reports_without_disconnect() {
        let (chat, bus, rx) = setup();
        let disconnected = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&disconnected);
        bus.on(names::DISCONNECT, move |_| *sink.borrow_mut() += 1);

        chat.set_transport(RecordingTransport {
            fail_with: Some(TransportError::Rejected("too long".into())),
            ..Default::default()
        });
        chat.add("oversized", true);

        assert_eq!(*disconnected.borrow(), 0);
        assert_eq!(
            rx.try_recv().map(|d| d.message),
            Ok("broadcast rejected: too long".to_string())
        );
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let (chat, _bus, rx) = setup();
        let (calls, callback) = ids_recorder();

        let _bad = chat.subscribe(|messages| {
            if !messages.is_empty() {
                panic!("render failed");
            }
        });
        let _good = chat.subscribe(callback);

        chat.add(MessageDraft::new("x").id("m1"), false);
        assert_eq!(calls.borrow().last().cloned(), Some(vec!["m1".to_string()]));
        assert_eq!(rx.try_recv().map(|d| d.origin), Ok(DiagnosticOrigin::ChatSubscriber));
    }

    #[test]
    fn clear_subscribers_keeps_history() {
        let (chat, _bus, _rx) = setup();
        let (calls, callback) = ids_recorder();
        let sub = chat.subscribe(callback);
        chat.add("kept", false);

        chat.clear_subscribers();
        chat.add("unseen", false);

        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(chat.len(), 2);
        assert!(!sub.is_active());
    }
}
