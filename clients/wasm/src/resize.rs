//! Window size tracking.
//!
//! The canvas always fills the window's visible area.  The `resize` listener
//! only raises a flag; `poll()` re-reads the size and applies it.

use std::cell::Cell;
use std::rc::Rc;

use roamer::types::Size;
use wasm_bindgen::prelude::*;

/// Visible dimensions of the browser window.
pub fn window_size(window: &web_sys::Window) -> Result<Size, JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Size::new(width as f32, height as f32))
}

/// Installed `resize` listener.  Dropping the handle removes it.
pub struct ResizeHandle {
    window: web_sys::Window,
    pending: Rc<Cell<bool>>,
    on_resize: Closure<dyn FnMut()>,
}

impl ResizeHandle {
    pub fn install() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let pending = Rc::new(Cell::new(false));

        let flag = pending.clone();
        let on_resize = Closure::<dyn FnMut()>::new(move || flag.set(true));
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            pending,
            on_resize,
        })
    }

    /// New window size if a resize happened since the last call.
    pub fn take(&self) -> Option<Size> {
        if !self.pending.replace(false) {
            return None;
        }
        match window_size(&self.window) {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("[resize] cannot read window size: {:?}", e);
                None
            }
        }
    }
}

impl Drop for ResizeHandle {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref());
    }
}
