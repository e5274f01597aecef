use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Refresh cadence while at least one tracker is running
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Refresh cadence while everything is paused
pub const IDLE_INTERVAL: Duration = Duration::from_millis(250);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum PacerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<PacerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(PacerEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(PacerEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<PacerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PacerEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PacerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Token for one live repeating refresh registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshHandle(u64);

/// Host capability that keeps observers refreshing while a timer runs.
pub trait RefreshScheduler {
    fn schedule_repeating(&self) -> RefreshHandle;
    /// Cancelling an unknown or already-cancelled handle is a no-op.
    fn cancel(&self, handle: RefreshHandle);
}

#[derive(Debug, Default)]
struct FrameState {
    next_id: u64,
    live: BTreeSet<RefreshHandle>,
}

/// Frame-driven scheduler: the runner polls it to decide between frame and
/// idle cadence. Clones share the same registrations.
#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<FrameState>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.state.borrow().live.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }
}

impl RefreshScheduler for FrameScheduler {
    fn schedule_repeating(&self) -> RefreshHandle {
        let mut state = self.state.borrow_mut();
        let handle = RefreshHandle(state.next_id);
        state.next_id += 1;
        state.live.insert(handle);
        handle
    }

    fn cancel(&self, handle: RefreshHandle) {
        self.state.borrow_mut().live.remove(&handle);
    }
}

/// Configurable ticker interface
pub trait Ticker {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Ticks at frame cadence while the scheduler has live registrations
#[derive(Clone, Debug)]
pub struct FrameTicker {
    scheduler: FrameScheduler,
    frame: Duration,
    idle: Duration,
}

impl FrameTicker {
    pub fn new(scheduler: FrameScheduler) -> Self {
        Self {
            scheduler,
            frame: FRAME_INTERVAL,
            idle: IDLE_INTERVAL,
        }
    }
}

impl Ticker for FrameTicker {
    fn interval(&self) -> Duration {
        if self.scheduler.is_active() {
            self.frame
        } else {
            self.idle
        }
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> PacerEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => PacerEvent::Tick,
        }
    }
}
