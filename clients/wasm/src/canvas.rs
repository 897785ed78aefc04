//! Canvas 2D [`Surface`].

use roamer::render::Surface;
use roamer::types::{Rect, Size};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::images::WebBitmap;

const BACKGROUND: &str = "#1d2b1f";
const LABEL_FONT: &str = "12px sans-serif";
const LABEL_COLOR: &str = "#ffffff";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up `<canvas id=…>` and take its 2D context.
    pub fn from_id(id: &str) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{id}'")))?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        Ok(Self { canvas, ctx })
    }

    pub fn size(&self) -> Size {
        Size::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    pub fn set_size(&self, size: Size) {
        self.canvas.set_width(size.width.max(0.0) as u32);
        self.canvas.set_height(size.height.max(0.0) as u32);
    }
}

impl Surface for CanvasSurface {
    type Bitmap = WebBitmap;

    fn clear(&mut self, size: Size) {
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx
            .fill_rect(0.0, 0.0, size.width as f64, size.height as f64);
    }

    fn draw_image(&mut self, bitmap: &WebBitmap, src: Rect, dst: Rect) {
        let drawn = self
            .ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &bitmap.element,
                src.x as f64,
                src.y as f64,
                src.width as f64,
                src.height as f64,
                dst.x as f64,
                dst.y as f64,
                dst.width as f64,
                dst.height as f64,
            );
        if let Err(e) = drawn {
            log::warn!("[canvas] draw_image failed: {:?}", e);
        }
    }

    fn draw_label(&mut self, text: &str, x: f32, y: f32) {
        self.ctx.set_font(LABEL_FONT);
        self.ctx.set_text_align("center");
        self.ctx.set_fill_style_str(LABEL_COLOR);
        if let Err(e) = self.ctx.fill_text(text, x as f64, y as f64) {
            log::warn!("[canvas] fill_text failed: {:?}", e);
        }
    }
}
