//! Window keyboard listeners.
//!
//! Only the four arrow keys are queued, and only those have their default
//! action (page scrolling) suppressed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use roamer::types::Direction;
use wasm_bindgen::prelude::*;
use web_sys::KeyboardEvent;

use crate::events::KeyEvent;

type Queue = Rc<RefCell<VecDeque<KeyEvent>>>;

/// Installed listeners.  Dropping the handle removes them.
pub struct KeyboardHandle {
    window: web_sys::Window,
    queue: Queue,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
    keyup: Closure<dyn FnMut(KeyboardEvent)>,
    blur: Closure<dyn FnMut()>,
}

impl KeyboardHandle {
    pub fn install() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let queue: Queue = Rc::new(RefCell::new(VecDeque::new()));

        let q = queue.clone();
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |ev: KeyboardEvent| {
            let key = ev.key();
            if Direction::from_key(&key).is_some() {
                ev.prevent_default();
                q.borrow_mut().push_back(KeyEvent::Down(key));
            }
        });

        let q = queue.clone();
        let keyup = Closure::<dyn FnMut(KeyboardEvent)>::new(move |ev: KeyboardEvent| {
            let key = ev.key();
            if Direction::from_key(&key).is_some() {
                ev.prevent_default();
                q.borrow_mut().push_back(KeyEvent::Up(key));
            }
        });

        let q = queue.clone();
        let blur = Closure::<dyn FnMut()>::new(move || {
            q.borrow_mut().push_back(KeyEvent::Blur);
        });

        window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            queue,
            keydown,
            keyup,
            blur,
        })
    }

    pub fn drain(&self) -> Vec<KeyEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl Drop for KeyboardHandle {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("keydown", self.keydown.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("keyup", self.keyup.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("blur", self.blur.as_ref().unchecked_ref());
    }
}
