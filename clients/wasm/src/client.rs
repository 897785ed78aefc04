//! `RoamerClient`: the primary wasm-bindgen export.
//!
//! ## JavaScript usage
//!
//! ```js
//! import init, { RoamerClient } from './pkg/roamer_wasm.js';
//!
//! await init();
//!
//! const client = new RoamerClient('world', 'ws://localhost:8080', 'ann', '/assets/world.png');
//! client.connect();
//!
//! // In your render loop:
//! function tick(now) {
//!   client.poll(now);
//!   requestAnimationFrame(tick);
//! }
//! requestAnimationFrame(tick);
//! ```
//!
//! The canvas is sized to the window on construction and follows window
//! resizes on its own.

use roamer::input::InputController;
use roamer::render::{RenderConfig, Renderer};
use roamer::session::SyncSession;
use roamer::settings::ClientConfig;
use roamer::types::Size;
use wasm_bindgen::prelude::*;

use crate::bridge::{self, BridgeHandle};
use crate::canvas::CanvasSurface;
use crate::events::{BridgeEvent, KeyEvent};
use crate::images::HtmlImageLoader;
use crate::keyboard::KeyboardHandle;
use crate::resize::{self, ResizeHandle};
use crate::timers::{IntervalHandle, IntervalTimers};

/// Upper bound of WebSocket events handled per poll().
const EVENTS_PER_POLL: usize = 256;

// ---------------------------------------------------------------------------
// RoamerClient
// ---------------------------------------------------------------------------

/// Primary Wasm API object.
///
/// Instantiate with `new RoamerClient(canvasId, endpoint, username, worldMapUrl)`.
/// Call `client.connect()` once, then `client.poll()` each animation frame.
#[wasm_bindgen]
pub struct RoamerClient {
    config: ClientConfig,
    surface: CanvasSurface,
    renderer: Renderer,
    session: Option<SyncSession<HtmlImageLoader>>,
    bridge: Option<BridgeHandle>,
    keyboard: Option<KeyboardHandle>,
    window_resize: ResizeHandle,
    input: InputController<IntervalHandle>,
    timers: IntervalTimers,
    /// Timestamp (ms) of the last walk-cycle step.
    last_animation_ms: f64,
}

#[wasm_bindgen]
impl RoamerClient {
    // -----------------------------------------------------------------------
    // Constructor
    // -----------------------------------------------------------------------

    /// Create a client drawing into `<canvas id=canvasId>`, sized to the
    /// window's visible area.
    ///
    /// @param canvasId    - id of the target canvas element
    /// @param endpoint    - WebSocket URL of the world server
    /// @param username    - display name sent with `join_game`
    /// @param worldMapUrl - background image
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        endpoint: &str,
        username: &str,
        world_map_url: &str,
    ) -> Result<RoamerClient, JsValue> {
        let config = ClientConfig {
            endpoint: endpoint.into(),
            username: username.into(),
            world_map_url: world_map_url.into(),
            ..Default::default()
        };
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let surface = CanvasSurface::from_id(canvas_id)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        surface.set_size(resize::window_size(&window)?);
        let window_resize = ResizeHandle::install()?;
        let renderer = Renderer::new(RenderConfig {
            world: config.world_size(),
            ..Default::default()
        });
        let input = InputController::new(config.repeat_interval());

        Ok(Self {
            config,
            surface,
            renderer,
            session: None,
            bridge: None,
            keyboard: None,
            window_resize,
            input,
            timers: IntervalTimers::new()?,
            last_animation_ms: 0.0,
        })
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Open the WebSocket and start a new session.
    ///
    /// No-op while a session is live; safe to call again after it ended.
    #[wasm_bindgen]
    pub fn connect(&mut self) -> Result<(), JsValue> {
        if self.session.as_ref().is_some_and(|s| !s.is_ended()) {
            return Ok(());
        }

        let mut session =
            SyncSession::new(&self.config, self.surface.size(), HtmlImageLoader::new());
        session.begin_connect();

        match bridge::spawn(&self.config.endpoint) {
            Ok(handle) => self.bridge = Some(handle),
            Err(e) => {
                session.on_close(&format!("{e:?}"));
                self.session = Some(session);
                return Err(e);
            }
        }
        self.session = Some(session);

        if self.keyboard.is_none() {
            self.keyboard = Some(KeyboardHandle::install()?);
        }
        Ok(())
    }

    /// Stop moving, close the WebSocket and stop all loads and timers.
    #[wasm_bindgen]
    pub fn disconnect(&mut self) {
        self.release_keys();
        self.flush();
        if let Some(session) = self.session.as_mut() {
            session.teardown();
            session.loader_mut().cancel_all();
        }
        self.bridge = None;
        self.keyboard = None;
    }

    // -----------------------------------------------------------------------
    // poll(): must be called each animation frame
    // -----------------------------------------------------------------------

    /// Apply everything the browser delivered since the last call, send
    /// queued intents, and redraw if anything changed.
    ///
    /// @param nowMs - `performance.now()` / the rAF timestamp
    #[wasm_bindgen]
    pub fn poll(&mut self, now_ms: f64) {
        if let Some(size) = self.window_resize.take() {
            self.resize(size.width, size.height);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        // WebSocket, in arrival order.
        if let Some(bridge) = &self.bridge {
            for event in bridge.drain_events(EVENTS_PER_POLL) {
                match event {
                    BridgeEvent::Open => session.on_open(),
                    BridgeEvent::Message(text) => session.on_message(&text),
                    BridgeEvent::Closed { reason } => session.on_close(&reason),
                }
            }
        }

        // Keyboard.
        if let Some(keyboard) = &self.keyboard {
            for event in keyboard.drain() {
                let intent = match event {
                    KeyEvent::Down(key) => self.input.key_down(&key, &mut self.timers).intent,
                    KeyEvent::Up(key) => self.input.key_up(&key, &mut self.timers).intent,
                    KeyEvent::Blur => self.input.release_all(&mut self.timers),
                };
                if let Some(intent) = intent {
                    session.on_intent(intent);
                }
            }
        }

        // Repeat ticks.
        for direction in self.timers.drain_fired() {
            if let Some(intent) = self.input.on_repeat(direction) {
                session.on_intent(intent);
            }
        }

        // Image loads.
        for (key, result) in session.loader_mut().drain_completed() {
            session.on_asset_loaded(&key, result);
        }

        // Walk cycle.
        if now_ms - self.last_animation_ms >= self.config.animation_interval_ms as f64 {
            self.last_animation_ms = now_ms;
            session.advance_animation();
        }

        let ended = session.is_ended();
        self.flush();

        if let Some(session) = self.session.as_mut() {
            session.render_if_dirty(&self.renderer, &mut self.surface);
        }

        if ended {
            self.release_keys();
            self.bridge = None;
        }
    }

    /// Resize the canvas.  Window resizes are applied automatically; call
    /// this to override the size.
    #[wasm_bindgen]
    pub fn resize(&mut self, width: f32, height: f32) {
        let size = Size::new(width, height);
        self.surface.set_size(size);
        if let Some(session) = self.session.as_mut() {
            session.resize(size);
            // resizing a canvas wipes it
            session.mark_dirty();
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `"disconnected"` | `"connecting"` | `"connected"` | `"joined"` | `"ended"`
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.session
            .as_ref()
            .map_or("disconnected", |s| s.state().as_str())
            .to_string()
    }

    /// Why the server refused the last join, if it did.
    #[wasm_bindgen(js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.last_error())
            .map(str::to_string)
    }

    /// Id assigned by the server on join.
    #[wasm_bindgen(js_name = playerId)]
    pub fn player_id(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.world().local_id())
            .map(str::to_string)
    }

    /// True while the WebSocket is open (or still opening).
    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.bridge.as_ref().is_some_and(|b| b.is_alive())
    }

    /// Number of mirrored players (including ourselves).
    #[wasm_bindgen(js_name = playerCount)]
    pub fn player_count(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |s| s.world().player_count() as u32)
    }

    /// Current camera rectangle as `[x, y, width, height]`.
    #[wasm_bindgen]
    pub fn viewport(&self) -> Vec<f32> {
        let vp = self
            .session
            .as_ref()
            .map(|s| s.viewport())
            .unwrap_or_default();
        vec![vp.x, vp.y, vp.width, vp.height]
    }

    /// Number of images loaded so far.
    #[wasm_bindgen(js_name = loadedImageCount)]
    pub fn loaded_image_count(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |s| s.assets().ready_count() as u32)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

impl RoamerClient {
    /// Send everything the session queued.
    fn flush(&mut self) {
        let (Some(session), Some(bridge)) = (self.session.as_mut(), self.bridge.as_ref()) else {
            return;
        };
        for text in session.drain_outbound() {
            if !bridge.send(&text) {
                break;
            }
        }
    }

    /// Disarm every repeat timer and tell the server to stop.
    fn release_keys(&mut self) {
        if let Some(intent) = self.input.release_all(&mut self.timers) {
            if let Some(session) = self.session.as_mut() {
                session.on_intent(intent);
            }
        }
        for _ in self.timers.drain_fired() {}
    }
}

impl Drop for RoamerClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
