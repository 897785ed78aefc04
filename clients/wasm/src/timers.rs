//! `setInterval`-backed [`RepeatTimers`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use roamer::input::RepeatTimers;
use roamer::types::Direction;
use wasm_bindgen::prelude::*;

/// One armed interval.  The tick closure lives as long as the handle.
pub struct IntervalHandle {
    id: Option<i32>,
    _tick: Closure<dyn FnMut()>,
}

pub struct IntervalTimers {
    window: web_sys::Window,
    fired: Rc<RefCell<VecDeque<Direction>>>,
}

impl IntervalTimers {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        Ok(Self {
            window,
            fired: Rc::new(RefCell::new(VecDeque::new())),
        })
    }

    /// Directions whose interval fired since the last call.
    pub fn drain_fired(&self) -> Vec<Direction> {
        self.fired.borrow_mut().drain(..).collect()
    }
}

impl RepeatTimers for IntervalTimers {
    type Handle = IntervalHandle;

    fn arm(&mut self, direction: Direction, interval: Duration) -> IntervalHandle {
        let fired = self.fired.clone();
        let tick = Closure::<dyn FnMut()>::new(move || {
            fired.borrow_mut().push_back(direction);
        });
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval.as_millis().min(i32::MAX as u128) as i32,
            )
            .map_err(|e| log::warn!("[timers] setInterval failed: {:?}", e))
            .ok();
        IntervalHandle { id, _tick: tick }
    }

    fn disarm(&mut self, handle: IntervalHandle) {
        if let Some(id) = handle.id {
            self.window.clear_interval_with_handle(id);
        }
    }
}
