//! Keyboard → motion intents.
//!
//! Each arrow key is either released or pressed.  Pressing emits one
//! `Move` immediately and arms a repeat timer that keeps re-asserting the
//! same intent until the key is released; the session is message-oriented,
//! so sustained motion needs repeated delivery.  Releasing the last held key
//! emits a single `Stop`.
//!
//! Timers belong to the host (`setInterval` in the browser, a tokio task
//! natively) and are reached through [`RepeatTimers`].  A fired timer is fed
//! back through [`InputController::on_repeat`].

use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::Direction;

/// Default re-assertion period while a key is held.
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(100);

/// What the session should tell the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionIntent {
    Move(Direction),
    Stop,
}

/// Host timer capability.
pub trait RepeatTimers {
    type Handle;

    /// Start firing `direction` every `interval` until disarmed.
    fn arm(&mut self, direction: Direction, interval: Duration) -> Self::Handle;

    fn disarm(&mut self, handle: Self::Handle);
}

/// Result of feeding one key event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The key is one of ours; the host should suppress its default action.
    pub handled: bool,
    pub intent: Option<MotionIntent>,
}

impl KeyOutcome {
    const IGNORED: KeyOutcome = KeyOutcome {
        handled: false,
        intent: None,
    };

    fn handled(intent: Option<MotionIntent>) -> Self {
        Self {
            handled: true,
            intent,
        }
    }
}

/// Per-key press state plus the timer armed for each held key.
#[derive(Debug)]
pub struct InputController<H> {
    held: BTreeMap<Direction, H>,
    interval: Duration,
}

impl<H> Default for InputController<H> {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_INTERVAL)
    }
}

impl<H> InputController<H> {
    pub fn new(interval: Duration) -> Self {
        Self {
            held: BTreeMap::new(),
            interval,
        }
    }

    pub fn key_down<T>(&mut self, key: &str, timers: &mut T) -> KeyOutcome
    where
        T: RepeatTimers<Handle = H>,
    {
        let Some(direction) = Direction::from_key(key) else {
            return KeyOutcome::IGNORED;
        };
        if self.held.contains_key(&direction) {
            // platform auto-repeat
            return KeyOutcome::handled(None);
        }
        log::trace!("[input] {} pressed", direction);
        let handle = timers.arm(direction, self.interval);
        self.held.insert(direction, handle);
        KeyOutcome::handled(Some(MotionIntent::Move(direction)))
    }

    pub fn key_up<T>(&mut self, key: &str, timers: &mut T) -> KeyOutcome
    where
        T: RepeatTimers<Handle = H>,
    {
        let Some(direction) = Direction::from_key(key) else {
            return KeyOutcome::IGNORED;
        };
        let Some(handle) = self.held.remove(&direction) else {
            return KeyOutcome::handled(None);
        };
        log::trace!("[input] {} released", direction);
        timers.disarm(handle);
        let intent = self.held.is_empty().then_some(MotionIntent::Stop);
        KeyOutcome::handled(intent)
    }

    /// A repeat timer fired.  Ticks racing a release produce nothing.
    pub fn on_repeat(&self, direction: Direction) -> Option<MotionIntent> {
        self.held
            .contains_key(&direction)
            .then_some(MotionIntent::Move(direction))
    }

    /// Release every held key (teardown, focus loss).
    ///
    /// Each armed timer is disarmed exactly once; returns `Stop` if anything
    /// was held.
    pub fn release_all<T>(&mut self, timers: &mut T) -> Option<MotionIntent>
    where
        T: RepeatTimers<Handle = H>,
    {
        if self.held.is_empty() {
            return None;
        }
        for (_, handle) in std::mem::take(&mut self.held) {
            timers.disarm(handle);
        }
        Some(MotionIntent::Stop)
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains_key(&direction)
    }

    pub fn held(&self) -> impl Iterator<Item = Direction> + '_ {
        self.held.keys().copied()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
