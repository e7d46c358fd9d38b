//! Canvas 2D replay of a [`Scene`]

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::LumenError;
use crate::scene::{Color, Primitive, Scene, Stroke};
use crate::transform::Point;

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// Draws scenes onto a canvas, scaled to its CSS size and pixel density
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: u32,
    height: u32,
    dpr: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, LumenError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "not a 2d context")?;

        let mut renderer = Self {
            canvas,
            ctx,
            width: 0,
            height: 0,
            dpr: 0.0,
        };
        renderer.fit();
        log::debug!(
            "canvas renderer: {}x{} @{}x",
            renderer.width,
            renderer.height,
            renderer.dpr
        );
        Ok(renderer)
    }

    /// Resize the backing store when the CSS size or pixel ratio changed
    fn fit(&mut self) {
        let dpr = device_pixel_ratio();
        let cw = self.canvas.client_width().max(0) as u32;
        let ch = self.canvas.client_height().max(0) as u32;
        if cw != self.width || ch != self.height || dpr != self.dpr {
            self.width = cw;
            self.height = ch;
            self.dpr = dpr;
            self.canvas.set_width((cw as f64 * dpr) as u32);
            self.canvas.set_height((ch as f64 * dpr) as u32);
        }
    }

    pub fn draw(&mut self, scene: &Scene) {
        self.fit();
        // unlaid-out canvases fall back to the scene's own size
        let css_w = if self.width > 0 { self.width as f64 } else { scene.width };
        let css_h = if self.height > 0 { self.height as f64 } else { scene.height };
        let sx = self.dpr * css_w / scene.width.max(1.0);
        let sy = self.dpr * css_h / scene.height.max(1.0);

        let ctx = &self.ctx;
        ctx.set_transform(sx, 0.0, 0.0, sy, 0.0, 0.0).ok();
        ctx.set_fill_style_str(&scene.background.to_css());
        ctx.fill_rect(0.0, 0.0, scene.width, scene.height);

        for primitive in &scene.primitives {
            self.draw_primitive(primitive);
        }
    }

    fn draw_primitive(&self, primitive: &Primitive) {
        let ctx = &self.ctx;
        match primitive {
            Primitive::Polyline {
                points,
                stroke,
                fill,
            } => {
                if points.len() < 2 {
                    return;
                }
                self.path(points);
                if let Some(color) = fill {
                    ctx.close_path();
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill();
                }
                self.apply_stroke(stroke);
                ctx.stroke();
                self.clear_stroke();
            }
            Primitive::Line { from, to, stroke } => {
                self.path(&[*from, *to]);
                self.apply_stroke(stroke);
                ctx.stroke();
                self.clear_stroke();
            }
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                ctx.begin_path();
                if ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI).is_err() {
                    return;
                }
                self.fill_and_stroke(*fill, stroke.as_ref());
            }
            Primitive::Rect {
                origin,
                width,
                height,
                fill,
                stroke,
            } => {
                ctx.begin_path();
                ctx.rect(origin.x, origin.y, *width, *height);
                self.fill_and_stroke(*fill, stroke.as_ref());
            }
            Primitive::Text {
                at,
                content,
                color,
                size,
                anchor,
                rotate,
            } => {
                ctx.save();
                ctx.set_font(&format!("{}px sans-serif", size));
                ctx.set_text_align(anchor.as_canvas());
                ctx.set_text_baseline("middle");
                ctx.set_fill_style_str(&color.to_css());
                if *rotate != 0.0 {
                    ctx.translate(at.x, at.y).ok();
                    ctx.rotate(rotate.to_radians()).ok();
                    ctx.fill_text(content, 0.0, 0.0).ok();
                } else {
                    ctx.fill_text(content, at.x, at.y).ok();
                }
                ctx.restore();
            }
        }
    }

    fn path(&self, points: &[Point]) {
        let ctx = &self.ctx;
        ctx.begin_path();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            ctx.move_to(first.x, first.y);
        }
        for p in iter {
            ctx.line_to(p.x, p.y);
        }
    }

    fn fill_and_stroke(&self, fill: Option<Color>, stroke: Option<&Stroke>) {
        if let Some(color) = fill {
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill();
        }
        if let Some(stroke) = stroke {
            self.apply_stroke(stroke);
            self.ctx.stroke();
            self.clear_stroke();
        }
    }

    fn apply_stroke(&self, stroke: &Stroke) {
        let ctx = &self.ctx;
        ctx.set_stroke_style_str(&stroke.color.to_css());
        ctx.set_line_width(stroke.width);
        if !stroke.dash.is_empty() {
            let dash: js_sys::Array = stroke
                .dash
                .iter()
                .map(|d| wasm_bindgen::JsValue::from_f64(*d))
                .collect();
            ctx.set_line_dash(&dash).ok();
        }
        if stroke.glow > 0.0 {
            ctx.set_shadow_blur(stroke.glow);
            ctx.set_shadow_color(&stroke.color.to_css());
        }
    }

    fn clear_stroke(&self) {
        let ctx = &self.ctx;
        ctx.set_line_dash(&js_sys::Array::new()).ok();
        ctx.set_shadow_blur(0.0);
    }
}
