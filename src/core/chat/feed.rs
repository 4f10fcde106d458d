//=========================================================================
// Message Feed
//=========================================================================
//
// Display model of the chat list: the messages plus the "now" their age
// labels are computed against.
//
// Labels are not recomputed per frame or per message. The clock moves
// only on the repeating refresh timer (or `refresh_at`); new messages are
// labelled against the current clock, and a message newer than it reads
// "now". `revision()` bumps whenever the rendered lines would differ.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::trace;

//=== Internal Dependencies ===============================================

use super::{ChatLog, ChatMessage, ChatSubscription};
use crate::core::error::SchedulerError;
use crate::core::scheduler::{Scheduler, TimerHandle};

//=== FeedLine ============================================================

/// One rendered chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLine {
    pub id: String,
    pub from: Option<String>,
    pub body: String,
    pub time_ago: String,
}

//=== Internal State ======================================================

struct FeedState {
    messages: Vec<ChatMessage>,
    now: DateTime<Utc>,
    revision: u64,
}

impl FeedState {
    fn labels(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.time_ago(self.now)).collect()
    }

    fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.labels();
        self.now = now;
        let changed = before != self.labels();
        if changed {
            self.revision += 1;
        }
        changed
    }
}

//=== MessageFeed =========================================================

/// Subscribed, self-refreshing view of a chat log.
pub struct MessageFeed {
    state: Rc<RefCell<FeedState>>,
    _subscription: ChatSubscription,
    _refresh: TimerHandle,
}

impl MessageFeed {
    /// Subscribes to `chat` and refreshes labels every `period`.
    pub fn new(chat: &ChatLog, scheduler: &Scheduler, period: Duration) -> Result<Self, SchedulerError> {
        let state = Rc::new(RefCell::new(FeedState {
            messages: Vec::new(),
            now: Utc::now(),
            revision: 0,
        }));

        let sink = Rc::downgrade(&state);
        let subscription = chat.subscribe(move |messages| {
            if let Some(state) = sink.upgrade() {
                let mut state = state.borrow_mut();
                state.messages = messages.to_vec();
                state.revision += 1;
            }
        });

        let clock = Rc::downgrade(&state);
        let refresh = scheduler.schedule_every(period, move || {
            if let Some(state) = clock.upgrade() {
                let changed = state.borrow_mut().refresh(Utc::now());
                trace!(target: "chat", "Feed refresh (changed: {})", changed);
            }
        })?;

        Ok(Self {
            state,
            _subscription: subscription,
            _refresh: refresh,
        })
    }

    /// Lines in log order, labelled against `now()`.
    pub fn lines(&self) -> Vec<FeedLine> {
        let state = self.state.borrow();
        state
            .messages
            .iter()
            .map(|m| FeedLine {
                id: m.id.clone(),
                from: m.from.clone(),
                body: m.body.clone(),
                time_ago: m.time_ago(state.now),
            })
            .collect()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.state.borrow().now
    }

    /// Moves the clock to `now`. Returns whether any label changed.
    pub fn refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.state.borrow_mut().refresh(now)
    }

    /// Increments whenever the lines need redrawing.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn len(&self) -> usize {
        self.state.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
