//! `HtmlImageElement` loader.
//!
//! `load` creates an `<img>`, wires `onload` / `onerror` and sets `src`.  The
//! callbacks only queue the outcome; `poll()` collects it with
//! [`HtmlImageLoader::drain_completed`] and feeds it to the session.  The
//! element and its closures stay in `inflight` until then, so a closure is
//! never dropped while it is running.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use roamer::assets::{AssetError, Bitmap, ImageLoader};
use roamer::types::Size;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

/// A decoded image ready to be drawn onto the canvas.
#[derive(Debug, Clone)]
pub struct WebBitmap {
    pub element: HtmlImageElement,
    pub width: u32,
    pub height: u32,
}

impl Bitmap for WebBitmap {
    fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }
}

pub type Completion = (String, Result<WebBitmap, AssetError>);

struct Inflight {
    element: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

#[derive(Default)]
pub struct HtmlImageLoader {
    done: Rc<RefCell<VecDeque<Completion>>>,
    inflight: HashMap<String, Inflight>,
}

impl HtmlImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes reported since the last call, in completion order.
    pub fn drain_completed(&mut self) -> Vec<Completion> {
        let completed: Vec<Completion> = self.done.borrow_mut().drain(..).collect();
        for (key, _) in &completed {
            self.inflight.remove(key);
        }
        completed
    }

    /// Detach every pending load; their outcomes are never reported.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.inflight.drain() {
            pending.element.set_onload(None);
            pending.element.set_onerror(None);
        }
        self.done.borrow_mut().clear();
    }

    fn fail(&self, key: &str, url: &str, reason: String) {
        self.done.borrow_mut().push_back((
            key.to_string(),
            Err(AssetError::LoadFailed {
                url: url.to_string(),
                reason,
            }),
        ));
    }
}

impl ImageLoader for HtmlImageLoader {
    type Bitmap = WebBitmap;

    fn load(&mut self, key: &str, url: &str) {
        let element = match HtmlImageElement::new() {
            Ok(el) => el,
            Err(e) => {
                self.fail(key, url, format!("{e:?}"));
                return;
            }
        };

        let done = self.done.clone();
        let img = element.clone();
        let load_key = key.to_string();
        let onload = Closure::<dyn FnMut()>::new(move || {
            let bitmap = WebBitmap {
                width: img.natural_width(),
                height: img.natural_height(),
                element: img.clone(),
            };
            done.borrow_mut().push_back((load_key.clone(), Ok(bitmap)));
        });

        let done = self.done.clone();
        let err_key = key.to_string();
        let err_url = url.to_string();
        let onerror = Closure::<dyn FnMut()>::new(move || {
            done.borrow_mut().push_back((
                err_key.clone(),
                Err(AssetError::LoadFailed {
                    url: err_url.clone(),
                    reason: "image failed to load".into(),
                }),
            ));
        });

        element.set_onload(Some(onload.as_ref().unchecked_ref()));
        element.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        element.set_src(url);

        self.inflight.insert(
            key.to_string(),
            Inflight {
                element,
                _onload: onload,
                _onerror: onerror,
            },
        );
    }
}
