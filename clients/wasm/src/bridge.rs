//! WASM bridge: WebSocket connection to the world server.
//!
//! ## Threading model
//!
//! WASM is single-threaded.  The WebSocket callbacks and `poll()` run on the
//! same JS event loop, so shared state is `Rc<RefCell<…>>`.
//!
//! ```text
//! web_sys::WebSocket callbacks (onopen / onmessage / onclose / onerror)
//!   push BridgeEvent into state.events
//!
//! JS main frame
//! ─────────────────────────────────────────────────────────
//! RoamerClient::poll()
//!   drain_events()        →  SyncSession::on_open / on_message / on_close
//!   SyncSession outbound  →  BridgeHandle::send
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::events::BridgeEvent;

// ---------------------------------------------------------------------------
// Shared state (single-threaded, Rc/RefCell)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    /// Events waiting for poll().
    events: VecDeque<BridgeEvent>,
    /// Set on `onclose` / `onerror`.
    closed: bool,
}

type SharedState = Rc<RefCell<State>>;

// ---------------------------------------------------------------------------
// Bridge handle (owned by RoamerClient)
// ---------------------------------------------------------------------------

/// Returned by [`spawn`].  Dropping it closes the socket.
pub struct BridgeHandle {
    shared: SharedState,
    ws: web_sys::WebSocket,
    // Keep closures alive for the lifetime of the bridge.
    _onopen: Closure<dyn FnMut()>,
    _onmessage: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _onerror: Closure<dyn FnMut(web_sys::Event)>,
    _onclose: Closure<dyn FnMut(web_sys::CloseEvent)>,
}

impl BridgeHandle {
    /// Drain up to `limit` pending events.  Call from poll().
    pub fn drain_events(&self, limit: usize) -> Vec<BridgeEvent> {
        let mut st = self.shared.borrow_mut();
        let n = limit.min(st.events.len());
        st.events.drain(..n).collect()
    }

    /// Send one text frame.  Returns false if the socket rejected it.
    pub fn send(&self, text: &str) -> bool {
        match self.ws.send_with_str(text) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[bridge] send failed: {:?}", e);
                false
            }
        }
    }

    /// True until the socket reports close or error.
    pub fn is_alive(&self) -> bool {
        !self.shared.borrow().closed
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Open a WebSocket to `endpoint` and return a [`BridgeHandle`] whose event
/// queue starts filling as soon as the browser delivers callbacks.
pub fn spawn(endpoint: &str) -> Result<BridgeHandle, JsValue> {
    let shared: SharedState = Rc::new(RefCell::new(State::default()));

    let ws = web_sys::WebSocket::new(endpoint)?;
    ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

    // ----- onopen -----------------------------------------------------------
    let shared_open = shared.clone();
    let onopen = Closure::<dyn FnMut()>::new(move || {
        log::info!("[bridge] WebSocket open");
        shared_open.borrow_mut().events.push_back(BridgeEvent::Open);
    });
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

    // ----- onmessage --------------------------------------------------------
    let shared_msg = shared.clone();
    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |ev: web_sys::MessageEvent| {
            match ev.data().as_string() {
                Some(text) => shared_msg
                    .borrow_mut()
                    .events
                    .push_back(BridgeEvent::Message(text)),
                None => log::debug!("[bridge] ignoring binary frame"),
            }
        });
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    // ----- onerror ----------------------------------------------------------
    let shared_err = shared.clone();
    let onerror = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        log::error!("[bridge] WebSocket error");
        let mut st = shared_err.borrow_mut();
        st.closed = true;
        st.events.push_back(BridgeEvent::Closed {
            reason: "WebSocket error".into(),
        });
    });
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    // ----- onclose ----------------------------------------------------------
    let shared_close = shared.clone();
    let onclose = Closure::<dyn FnMut(web_sys::CloseEvent)>::new(move |ev: web_sys::CloseEvent| {
        log::info!("[bridge] WebSocket closed: {} ({})", ev.reason(), ev.code());
        let reason = if ev.reason().is_empty() {
            format!("WebSocket closed ({})", ev.code())
        } else {
            ev.reason()
        };
        let mut st = shared_close.borrow_mut();
        st.closed = true;
        st.events.push_back(BridgeEvent::Closed { reason });
    });
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    Ok(BridgeHandle {
        shared,
        ws,
        _onopen: onopen,
        _onmessage: onmessage,
        _onerror: onerror,
        _onclose: onclose,
    })
}
