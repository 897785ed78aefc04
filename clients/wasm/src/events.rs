//! Browser callbacks, queued for the next `RoamerClient::poll()`.
//!
//! Every JS callback (WebSocket, keyboard, timers, image loads) only pushes
//! one of these into a shared queue.  All state changes happen in `poll()`,
//! so handlers never re-enter the session.

/// WebSocket lifecycle and traffic, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Open,
    /// One text frame.
    Message(String),
    /// `onclose` or `onerror`.  May arrive twice; the session ignores the
    /// second one.
    Closed { reason: String },
}

/// Arrow-key events from the window.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyEvent {
    /// `KeyboardEvent.key` of a keydown.
    Down(String),
    /// `KeyboardEvent.key` of a keyup.
    Up(String),
    /// The window lost focus; no keyup will follow for held keys.
    Blur,
}
