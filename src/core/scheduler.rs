//=========================================================================
// Scheduler
//
// Cancellable one-shot and repeating timers for a single-threaded core.
//
// Architecture:
// ```text
//   schedule_after / schedule_every
//         ↓ spawn
//   timer thread ── select! { after/tick, cancel } ──→ fired: Sender<TimerId>
//                                                          ↓
//   session thread ── pump() / pump_timeout() ──→ callback (guarded)
// ```
//
// Responsibilities:
// - Keep callbacks on the session thread; timer threads only send ids
// - Cancel on `TimerHandle::cancel` or drop, waking the timer thread
// - Discard ticks that arrive for timers already cancelled
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, bounded, select, tick, unbounded, Receiver, Sender};
use log::{debug, trace};

//=== Internal Dependencies ===============================================

use crate::core::diagnostics::{DiagnosticOrigin, Diagnostics};
use crate::core::error::SchedulerError;

//=== TimerId =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

//=== Internal State ======================================================

enum Task {
    Once(Box<dyn FnOnce()>),
    Every(Rc<dyn Fn()>),
}

#[derive(Default)]
struct SchedulerState {
    tasks: HashMap<TimerId, Task>,
    next_id: u64,
}

//=== Scheduler ===========================================================

/// Timer registry owned by the session. Clones share the same timers.
#[derive(Clone)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
    fired_tx: Sender<TimerId>,
    fired_rx: Receiver<TimerId>,
    diagnostics: Diagnostics,
}

impl Scheduler {
    pub fn new(diagnostics: Diagnostics) -> Self {
        let (fired_tx, fired_rx) = unbounded();
        Self {
            state: Rc::new(RefCell::new(SchedulerState::default())),
            fired_tx,
            fired_rx,
            diagnostics,
        }
    }

    //--- Scheduling -------------------------------------------------------

    /// Runs `callback` once, at the first pump after `delay` has elapsed.
    pub fn schedule_after<F>(&self, delay: Duration, callback: F) -> Result<TimerHandle, SchedulerError>
    where
        F: FnOnce() + 'static,
    {
        let id = self.next_id();
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let fired = self.fired_tx.clone();

        thread::Builder::new()
            .name(format!("hud-timer-{}", id.0))
            .spawn(move || {
                let deadline = after(delay);
                select! {
                    recv(deadline) -> _ => {
                        let _ = fired.send(id);
                    }
                    recv(cancel_rx) -> _ => {}
                }
            })?;

        self.state.borrow_mut().tasks.insert(id, Task::Once(Box::new(callback)));
        trace!(target: "scheduler", "{:?} scheduled after {:?}", id, delay);
        Ok(self.handle(id, cancel_tx))
    }

    /// Runs `callback` at every pump following each `period` tick.
    ///
    /// A zero `period` is rejected with `SchedulerError::ZeroPeriod`.
    pub fn schedule_every<F>(&self, period: Duration, callback: F) -> Result<TimerHandle, SchedulerError>
    where
        F: Fn() + 'static,
    {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }

        let id = self.next_id();
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let fired = self.fired_tx.clone();

        thread::Builder::new()
            .name(format!("hud-timer-{}", id.0))
            .spawn(move || {
                let ticker = tick(period);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if fired.send(id).is_err() {
                                break;
                            }
                        }
                        recv(cancel_rx) -> _ => break,
                    }
                }
            })?;

        self.state.borrow_mut().tasks.insert(id, Task::Every(Rc::new(callback)));
        trace!(target: "scheduler", "{:?} scheduled every {:?}", id, period);
        Ok(self.handle(id, cancel_tx))
    }

    fn next_id(&self) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        id
    }

    fn handle(&self, id: TimerId, cancel: Sender<()>) -> TimerHandle {
        TimerHandle {
            id,
            state: Rc::downgrade(&self.state),
            cancel: Some(cancel),
        }
    }

    //--- Pumping ----------------------------------------------------------

    /// Runs every callback whose timer has fired. Never blocks.
    ///
    /// Returns the number of callbacks run.
    pub fn pump(&self) -> usize {
        let mut ran = 0;
        while let Ok(id) = self.fired_rx.try_recv() {
            if self.run(id) {
                ran += 1;
            }
        }
        ran
    }

    /// Waits up to `timeout` for a live timer to fire, then pumps.
    ///
    /// Returns the number of callbacks run; `0` on timeout.
    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            match self.fired_rx.recv_deadline(deadline) {
                Ok(id) => {
                    if self.run(id) {
                        return 1 + self.pump();
                    }
                }
                Err(_) => return 0,
            }
        }
    }

    fn run(&self, id: TimerId) -> bool {
        let task = {
            let mut state = self.state.borrow_mut();
            let repeating = match state.tasks.get(&id) {
                Some(Task::Every(callback)) => Some(Rc::clone(callback)),
                _ => None,
            };
            match repeating {
                Some(callback) => Some(Task::Every(callback)),
                None => state.tasks.remove(&id),
            }
        };

        let Some(task) = task else {
            trace!(target: "scheduler", "Discarding tick for cancelled {:?}", id);
            return false;
        };

        trace!(target: "scheduler", "Running {:?}", id);
        match task {
            Task::Once(callback) => self.diagnostics.guard(DiagnosticOrigin::Timer, callback),
            Task::Every(callback) => self.diagnostics.guard(DiagnosticOrigin::Timer, || callback()),
        };
        true
    }

    //--- Query API --------------------------------------------------------

    /// Number of timers that have not fired (one-shot) or been cancelled.
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    //--- Teardown ---------------------------------------------------------

    /// Forgets every pending timer. Their threads exit once their handles
    /// drop; any tick still in flight is discarded.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut self.state.borrow_mut().tasks);
        if !drained.is_empty() {
            debug!(target: "scheduler", "Dropping {} pending timers", drained.len());
        }
        drop(drained);
        while self.fired_rx.try_recv().is_ok() {}
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

//=== TimerHandle =========================================================

/// Owner of one scheduled timer. Dropping it cancels the timer.
pub struct TimerHandle {
    id: TimerId,
    state: Weak<RefCell<SchedulerState>>,
    cancel: Option<Sender<()>>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Whether the callback can still run.
    pub fn is_pending(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().tasks.contains_key(&self.id))
    }

    /// Cancels the timer. Safe to call repeatedly and from inside the
    /// timer's own callback.
    pub fn cancel(&mut self) {
        // Dropping the sender wakes the timer thread.
        if self.cancel.take().is_none() {
            return;
        }

        if let Some(state) = self.state.upgrade() {
            let task = state.borrow_mut().tasks.remove(&self.id);
            if task.is_some() {
                trace!(target: "scheduler", "{:?} cancelled", self.id);
            }
            drop(task);
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
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

    const SHORT: Duration = Duration::from_millis(5);
    const WAIT: Duration = Duration::from_secs(2);

    fn scheduler() -> (Scheduler, Receiver<crate::core::diagnostics::Diagnostic>) {
        let (diagnostics, rx) = Diagnostics::channel(8);
        (Scheduler::new(diagnostics), rx)
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, move || inner.set(inner.get() + 1))
    }

    #[test]
    fn one_shot_runs_only_when_pumped() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let handle = scheduler.schedule_after(SHORT, bump).expect("spawn");
        assert_eq!(count.get(), 0);
        assert!(handle.is_pending());

        assert_eq!(scheduler.pump_timeout(WAIT), 1);
        assert_eq!(count.get(), 1);
        assert!(!handle.is_pending());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_one_shot_never_runs() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let mut handle = scheduler.schedule_after(SHORT, bump).expect("spawn");
        handle.cancel();
        handle.cancel();

        assert_eq!(scheduler.pump_timeout(Duration::from_millis(50)), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn dropping_handle_cancels() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        drop(scheduler.schedule_after(SHORT, bump).expect("spawn"));
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pump_timeout(Duration::from_millis(50)), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn tick_arriving_after_cancel_is_discarded() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let mut handle = scheduler.schedule_after(Duration::from_millis(1), bump).expect("spawn");
        std::thread::sleep(Duration::from_millis(30));
        handle.cancel();

        assert_eq!(scheduler.pump(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn repeating_timer_fires_until_cancelled() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let mut handle = scheduler.schedule_every(SHORT, bump).expect("spawn");
        assert!(scheduler.pump_timeout(WAIT) >= 1);
        assert!(scheduler.pump_timeout(WAIT) >= 1);
        assert!(count.get() >= 2);
        assert!(handle.is_pending());

        handle.cancel();
        let seen = count.get();
        std::thread::sleep(Duration::from_millis(30));
        scheduler.pump();
        assert_eq!(count.get(), seen);
    }

    #[test]
    fn zero_period_is_rejected() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let result = scheduler.schedule_every(Duration::ZERO, bump);
        assert!(matches!(result, Err(SchedulerError::ZeroPeriod)));
        assert_eq!(scheduler.pending(), 0);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(scheduler.pump(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn panicking_timer_is_reported() {
        let (scheduler, rx) = scheduler();

        let _handle = scheduler
            .schedule_after(SHORT, || panic!("timer exploded"))
            .expect("spawn");
        assert_eq!(scheduler.pump_timeout(WAIT), 1);

        let diagnostic = rx.try_recv().expect("panic should be reported");
        assert_eq!(diagnostic.origin, DiagnosticOrigin::Timer);
        assert_eq!(diagnostic.message, "timer exploded");
    }

    #[test]
    fn callback_may_schedule_another_timer() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();
        let slot: Rc<RefCell<Option<TimerHandle>>> = Rc::new(RefCell::new(None));

        let inner = scheduler.clone();
        let sink = Rc::clone(&slot);
        let _first = scheduler
            .schedule_after(SHORT, move || {
                *sink.borrow_mut() = inner.schedule_after(SHORT, bump).ok();
            })
            .expect("spawn");

        assert_eq!(scheduler.pump_timeout(WAIT), 1);
        assert!(slot.borrow().is_some());
        assert_eq!(scheduler.pump_timeout(WAIT), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn shutdown_forgets_pending_timers() {
        let (scheduler, _rx) = scheduler();
        let (count, bump) = counter();

        let handle = scheduler.schedule_after(SHORT, bump).expect("spawn");
        scheduler.shutdown();
        assert!(!handle.is_pending());

        assert_eq!(scheduler.pump_timeout(Duration::from_millis(50)), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn empty_pump_runs_nothing() {
        let (scheduler, _rx) = scheduler();
        assert_eq!(scheduler.pump(), 0);
        assert_eq!(scheduler.pump_timeout(Duration::from_millis(1)), 0);
    }
}
