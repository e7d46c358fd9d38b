//! Scene Graph
//!
//! Renderer output: a flat list of vector primitives in viewport pixels. A
//! [`Scene`] can be exported to SVG markup for native use, serialized to JSON, or
//! replayed onto a canvas 2D context by the `wasm` front-end.

use serde::{Deserialize, Serialize};

use crate::sample::SampleSequence;
use crate::transform::{Point, ScreenTransform};

// =============================================================================
// Color
// =============================================================================

/// RGBA color, serialized as a CSS color string
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity 0.0-1.0
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// `#rrggbb` when opaque, `rgba(...)` otherwise
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse `#rrggbb` or `rgba(r, g, b, a)`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let inner = s.strip_prefix("rgba(")?.strip_suffix(')')?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return None;
        }
        Some(Self::rgba(
            parts[0].parse().ok()?,
            parts[1].parse().ok()?,
            parts[2].parse().ok()?,
            parts[3].parse().ok()?,
        ))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_css()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s).ok_or_else(|| format!("invalid color: {}", s))
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// Outline style for paths and shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    /// Dash pattern in pixels; empty for solid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
    /// Shadow blur radius for glowing traces; 0 for none
    #[serde(default)]
    pub glow: f64,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Vec::new(),
            glow: 0.0,
        }
    }

    pub fn dashed(color: Color, width: f64, on: f64, off: f64) -> Self {
        Self {
            dash: vec![on, off],
            ..Self::solid(color, width)
        }
    }

    pub fn with_glow(mut self, blur: f64) -> Self {
        self.glow = blur;
        self
    }
}

/// Horizontal alignment of text relative to its anchor point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }

    /// Canvas `textAlign` value
    pub fn as_canvas(&self) -> &'static str {
        match self {
            TextAnchor::Start => "left",
            TextAnchor::Middle => "center",
            TextAnchor::End => "right",
        }
    }
}

/// One drawable element in viewport pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Primitive {
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
        /// Fill between the path and its closing segment
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
    Text {
        at: Point,
        content: String,
        color: Color,
        size: f64,
        #[serde(default)]
        anchor: TextAnchor,
        /// Rotation in degrees about `at`
        #[serde(default)]
        rotate: f64,
    },
}

// =============================================================================
// Scene
// =============================================================================

/// Drawing produced by one render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Color,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new(width: f64, height: f64, background: Color) -> Self {
        Self {
            width,
            height,
            background,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.push(Primitive::Line { from, to, stroke });
    }

    pub fn polyline(&mut self, points: Vec<Point>, stroke: Stroke) {
        self.push(Primitive::Polyline {
            points,
            stroke,
            fill: None,
        });
    }

    pub fn circle(&mut self, center: Point, radius: f64, fill: Color) {
        self.push(Primitive::Circle {
            center,
            radius,
            fill: Some(fill),
            stroke: None,
        });
    }

    pub fn ring(&mut self, center: Point, radius: f64, stroke: Stroke) {
        self.push(Primitive::Circle {
            center,
            radius,
            fill: None,
            stroke: Some(stroke),
        });
    }

    pub fn rect(&mut self, origin: Point, width: f64, height: f64, fill: Option<Color>, stroke: Option<Stroke>) {
        self.push(Primitive::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
        });
    }

    pub fn text(&mut self, at: Point, content: impl Into<String>, color: Color, size: f64, anchor: TextAnchor) {
        self.push(Primitive::Text {
            at,
            content: content.into(),
            color,
            size,
            anchor,
            rotate: 0.0,
        });
    }

    // -------------------------------------------------------------------------
    // Plot helpers
    // -------------------------------------------------------------------------

    /// Draw a sample sequence as a solid polyline
    pub fn trace(&mut self, t: &ScreenTransform, samples: &SampleSequence, color: Color, width: f64) {
        self.polyline(t.map_all(samples), Stroke::solid(color, width));
    }

    /// Draw a sample sequence with a custom stroke
    pub fn trace_styled(&mut self, t: &ScreenTransform, samples: &SampleSequence, stroke: Stroke) {
        self.polyline(t.map_all(samples), stroke);
    }

    /// Draw a sample sequence closed down to `baseline` and filled
    pub fn area(&mut self, t: &ScreenTransform, samples: &SampleSequence, baseline: f64, fill: Color, stroke: Stroke) {
        let mut points = t.map_all(samples);
        if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
            points.push(Point::new(t.map_x(last.x), t.map_y(baseline)));
            points.push(Point::new(t.map_x(first.x), t.map_y(baseline)));
        }
        self.push(Primitive::Polyline {
            points,
            stroke,
            fill: Some(fill),
        });
    }

    /// Light grid lines at the given world positions
    pub fn grid(&mut self, t: &ScreenTransform, xs: &[f64], ys: &[f64], color: Color) {
        let vp = t.viewport;
        for &x in xs {
            let px = t.map_x(x);
            self.line(
                Point::new(px, vp.top),
                Point::new(px, vp.bottom()),
                Stroke::solid(color, 0.5),
            );
        }
        for &y in ys {
            let py = t.map_y(y);
            self.line(
                Point::new(vp.left, py),
                Point::new(vp.right(), py),
                Stroke::solid(color, 0.5),
            );
        }
    }

    /// Left and bottom axis lines with optional titles
    pub fn axes(&mut self, t: &ScreenTransform, color: Color, x_title: Option<&str>, y_title: Option<&str>) {
        let vp = t.viewport;
        let stroke = Stroke::solid(color, 1.0);
        self.line(
            Point::new(vp.left, vp.bottom()),
            Point::new(vp.right(), vp.bottom()),
            stroke.clone(),
        );
        self.line(Point::new(vp.left, vp.top), Point::new(vp.left, vp.bottom()), stroke);
        if let Some(title) = x_title {
            self.text(
                Point::new(vp.left + vp.width / 2.0, vp.bottom() + 28.0),
                title,
                color,
                12.0,
                TextAnchor::Middle,
            );
        }
        if let Some(title) = y_title {
            self.push(Primitive::Text {
                at: Point::new(vp.left - 32.0, vp.top + vp.height / 2.0),
                content: title.to_string(),
                color,
                size: 12.0,
                anchor: TextAnchor::Middle,
                rotate: -90.0,
            });
        }
    }

    /// Tick labels along the bottom axis
    pub fn x_labels(&mut self, t: &ScreenTransform, ticks: &[(f64, String)], color: Color) {
        let y = t.viewport.bottom() + 14.0;
        for (x, label) in ticks {
            self.text(Point::new(t.map_x(*x), y), label.clone(), color, 10.0, TextAnchor::Middle);
        }
    }

    /// Tick labels along the left axis
    pub fn y_labels(&mut self, t: &ScreenTransform, ticks: &[(f64, String)], color: Color) {
        let x = t.viewport.left - 6.0;
        for (y, label) in ticks {
            self.text(Point::new(x, t.map_y(*y) + 3.0), label.clone(), color, 10.0, TextAnchor::End);
        }
    }

    /// Vertical line spanning the viewport at world `x`
    pub fn vline(&mut self, t: &ScreenTransform, x: f64, stroke: Stroke) {
        let px = t.map_x(x);
        self.line(
            Point::new(px, t.viewport.top),
            Point::new(px, t.viewport.bottom()),
            stroke,
        );
    }

    /// Horizontal line spanning the viewport at world `y`
    pub fn hline(&mut self, t: &ScreenTransform, y: f64, stroke: Stroke) {
        let py = t.map_y(y);
        self.line(
            Point::new(t.viewport.left, py),
            Point::new(t.viewport.right(), py),
            stroke,
        );
    }

    // -------------------------------------------------------------------------
    // SVG export
    // -------------------------------------------------------------------------

    /// Render the scene as a standalone SVG document
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
            self.width, self.height, self.width, self.height
        ));
        svg.push_str(&format!(
            "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            self.background.to_css()
        ));

        for primitive in &self.primitives {
            svg.push_str("  ");
            svg.push_str(&Self::svg_element(primitive));
            svg.push('\n');
        }

        svg.push_str("</svg>\n");
        svg
    }

    fn svg_element(primitive: &Primitive) -> String {
        match primitive {
            Primitive::Polyline {
                points,
                stroke,
                fill,
            } => {
                let coords: Vec<String> = points
                    .iter()
                    .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                    .collect();
                let tag = if fill.is_some() { "polygon" } else { "polyline" };
                format!(
                    "<{} points=\"{}\" fill=\"{}\"{}/>",
                    tag,
                    coords.join(" "),
                    fill.map(|c| c.to_css()).unwrap_or_else(|| "none".into()),
                    Self::svg_stroke(Some(stroke))
                )
            }
            Primitive::Line { from, to, stroke } => format!(
                "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"{}/>",
                from.x,
                from.y,
                to.x,
                to.y,
                Self::svg_stroke(Some(stroke))
            ),
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            } => format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"{}/>",
                center.x,
                center.y,
                radius,
                fill.map(|c| c.to_css()).unwrap_or_else(|| "none".into()),
                Self::svg_stroke(stroke.as_ref())
            ),
            Primitive::Rect {
                origin,
                width,
                height,
                fill,
                stroke,
            } => format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"{}/>",
                origin.x,
                origin.y,
                width,
                height,
                fill.map(|c| c.to_css()).unwrap_or_else(|| "none".into()),
                Self::svg_stroke(stroke.as_ref())
            ),
            Primitive::Text {
                at,
                content,
                color,
                size,
                anchor,
                rotate,
            } => {
                let transform = if *rotate != 0.0 {
                    format!(" transform=\"rotate({} {:.2} {:.2})\"", rotate, at.x, at.y)
                } else {
                    String::new()
                };
                format!(
                    "<text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"{}\"{}>{}</text>",
                    at.x,
                    at.y,
                    color.to_css(),
                    size,
                    anchor.as_svg(),
                    transform,
                    escape_xml(content)
                )
            }
        }
    }

    fn svg_stroke(stroke: Option<&Stroke>) -> String {
        let Some(stroke) = stroke else {
            return String::new();
        };
        let mut attrs = format!(
            " stroke=\"{}\" stroke-width=\"{}\"",
            stroke.color.to_css(),
            stroke.width
        );
        if !stroke.dash.is_empty() {
            let dash: Vec<String> = stroke.dash.iter().map(|d| d.to_string()).collect();
            attrs.push_str(&format!(" stroke-dasharray=\"{}\"", dash.join(",")));
        }
        attrs
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
