// Overlay composite: stamp image + delete affordance at its top-right corner

use std::fmt;

use image::{Rgba, RgbaImage, imageops};

use super::interaction::InteractionPolicy;
use crate::raster::EncodedRaster;

const AFFORDANCE_FILL: Rgba<u8> = Rgba([220, 53, 69, 255]);
const AFFORDANCE_MARK: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Identity of an overlay on its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub(crate) u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Half-open containment: left/top edges inclusive, right/bottom exclusive.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A placed stamp: the scaled stamp image with a delete affordance whose
/// visibility follows the pointer.
#[derive(Debug, Clone)]
pub struct Overlay {
    source: EncodedRaster,
    image: RgbaImage,
    scale: f32,
    left: f32,
    top: f32,
    affordance_size: u32,
    affordance_image: RgbaImage,
    affordance_visible: bool,
    policy: InteractionPolicy,
}

impl Overlay {
    /// Build a composite from an already-scaled stamp image.
    ///
    /// `scale` is the factor applied to the source raster. The affordance is
    /// clamped so it never exceeds the image itself.
    pub fn new(
        source: EncodedRaster,
        image: RgbaImage,
        scale: f32,
        affordance_size: u32,
        policy: InteractionPolicy,
    ) -> Self {
        let affordance_size = affordance_size
            .min(image.width())
            .min(image.height())
            .max(1);
        Self {
            source,
            affordance_image: affordance_glyph(affordance_size),
            image,
            scale,
            left: 0.0,
            top: 0.0,
            affordance_size,
            affordance_visible: false,
            policy,
        }
    }

    pub fn source(&self) -> &EncodedRaster {
        &self.source
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn position(&self) -> (f32, f32) {
        (self.left, self.top)
    }

    pub fn set_position(&mut self, left: f32, top: f32) {
        self.left = left;
        self.top = top;
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.top += dy;
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn policy(&self) -> InteractionPolicy {
        self.policy
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.left,
            y: self.top,
            width: self.width() as f32,
            height: self.height() as f32,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.bounds().contains(x, y)
    }

    pub fn affordance_size(&self) -> u32 {
        self.affordance_size
    }

    /// Hit region of the delete affordance (top-right corner of the image).
    pub fn affordance_bounds(&self) -> Rect {
        let size = self.affordance_size as f32;
        Rect {
            x: self.left + self.width() as f32 - size,
            y: self.top,
            width: size,
            height: size,
        }
    }

    pub fn affordance_visible(&self) -> bool {
        self.affordance_visible
    }

    pub(crate) fn set_affordance_visible(&mut self, visible: bool) {
        self.affordance_visible = visible;
    }

    /// A hidden affordance is not hit-testable.
    pub fn hits_affordance(&self, x: f32, y: f32) -> bool {
        self.affordance_visible && self.affordance_bounds().contains(x, y)
    }

    pub(crate) fn paint(&self, canvas: &mut RgbaImage) {
        imageops::overlay(
            canvas,
            &self.image,
            self.left.round() as i64,
            self.top.round() as i64,
        );
        if self.affordance_visible {
            let rect = self.affordance_bounds();
            imageops::overlay(
                canvas,
                &self.affordance_image,
                rect.x.round() as i64,
                rect.y.round() as i64,
            );
        }
    }
}

/// Red square with a white cross.
fn affordance_glyph(size: u32) -> RgbaImage {
    let stroke = (size / 8).max(1) as i64;
    let inset = (size / 4) as i64;
    let last = size as i64 - 1;
    RgbaImage::from_fn(size, size, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let inside = x >= inset && x <= last - inset && y >= inset && y <= last - inset;
        let on_diagonal = (x - y).abs() < stroke || (x + y - last).abs() < stroke;
        if inside && on_diagonal {
            AFFORDANCE_MARK
        } else {
            AFFORDANCE_FILL
        }
    })
}
