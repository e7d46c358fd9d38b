//! World-to-Screen Transforms
//!
//! Maps evaluated samples into a widget's viewport. Each axis is either linear
//! or logarithmic (base 10, used for frequency sweeps and dB plots); the y axis is
//! flipped so larger values draw higher on screen.

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Smallest value a logarithmic axis will take the log of
pub const LOG_FLOOR: f64 = 1e-12;

/// Screen-space point (pixels, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis scaling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    /// log10 of the value; non-positive values pin to [`LOG_FLOOR`]
    Log10,
}

/// World-space extent of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub scale: AxisScale,
}

impl Axis {
    pub const fn linear(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            scale: AxisScale::Linear,
        }
    }

    pub const fn log10(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            scale: AxisScale::Log10,
        }
    }

    fn warp(&self, v: f64) -> f64 {
        match self.scale {
            AxisScale::Linear => v,
            AxisScale::Log10 => libm::log10(v.max(LOG_FLOOR)),
        }
    }

    fn unwarp(&self, w: f64) -> f64 {
        match self.scale {
            AxisScale::Linear => w,
            AxisScale::Log10 => libm::pow(10.0, w),
        }
    }

    /// Position of `v` along the axis, 0 at `min` and 1 at `max` (not clamped)
    pub fn fraction(&self, v: f64) -> f64 {
        let lo = self.warp(self.min);
        let hi = self.warp(self.max);
        let span = hi - lo;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        (self.warp(v) - lo) / span
    }

    /// Inverse of [`Axis::fraction`]
    pub fn value_at(&self, fraction: f64) -> f64 {
        let lo = self.warp(self.min);
        let hi = self.warp(self.max);
        self.unwarp(lo + fraction * (hi - lo))
    }
}

/// Pixel rectangle a plot is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Fixed mapping from world coordinates to viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenTransform {
    pub x: Axis,
    pub y: Axis,
    pub viewport: Viewport,
}

impl ScreenTransform {
    pub const fn new(x: Axis, y: Axis, viewport: Viewport) -> Self {
        Self { x, y, viewport }
    }

    pub fn map_x(&self, x: f64) -> f64 {
        self.viewport.left + self.x.fraction(x) * self.viewport.width
    }

    pub fn map_y(&self, y: f64) -> f64 {
        self.viewport.bottom() - self.y.fraction(y) * self.viewport.height
    }

    pub fn map(&self, sample: Sample) -> Point {
        Point::new(self.map_x(sample.x), self.map_y(sample.y))
    }

    pub fn map_all<'a>(&self, samples: impl IntoIterator<Item = &'a Sample>) -> Vec<Point> {
        samples.into_iter().map(|&s| self.map(s)).collect()
    }

    /// World x for a pixel column
    pub fn invert_x(&self, px: f64) -> f64 {
        if self.viewport.width.abs() < f64::EPSILON {
            return self.x.min;
        }
        self.x
            .value_at((px - self.viewport.left) / self.viewport.width)
    }
}

/// Power ratio in decibels, with non-positive ratios pinned to the log floor
pub fn to_db(ratio: f64) -> f64 {
    10.0 * libm::log10(ratio.max(LOG_FLOOR))
}
