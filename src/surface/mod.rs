pub mod interaction;
pub mod overlay;

use std::sync::atomic::{AtomicU64, Ordering};

use image::{Rgba, RgbaImage, imageops};
use tracing::{debug, info};

use crate::error::StampError;
use crate::raster::EncodedRaster;
use interaction::{OverlayEffect, OverlayEvent, effects_for};
use overlay::{Overlay, OverlayId};

/// Largest width or height the surface will rasterize.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

const DEFAULT_BACKGROUND_COLOR: Rgba<u8> = Rgba([0xf0, 0xf0, 0xf0, 0xff]);

/// Default position for overlays added without an explicit one.
pub const DEFAULT_OVERLAY_POSITION: (f32, f32) = (10.0, 10.0);

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a surface instance. A replaced surface gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

/// Host container geometry and layout constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    /// Fixed surface width, taken from the hosting container.
    pub container_width: u32,
    /// Initial surface height.
    pub container_height: u32,
    /// Horizontal space left around the background; width budget is
    /// `container_width - margin`.
    pub margin: u32,
    /// Surface height as a multiple of the background's rendered height.
    pub height_ratio: f32,
    pub background_color: Rgba<u8>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            container_width: 800,
            container_height: 1000,
            margin: 20,
            height_ratio: 1.4,
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

#[derive(Debug, Clone)]
struct Background {
    image: RgbaImage,
    digest: String,
    width_budget: u32,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: OverlayId,
    last_x: f32,
    last_y: f32,
}

/// An effect the surface applied to an overlay in response to pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedEffect {
    pub overlay: OverlayId,
    pub effect: OverlayEffect,
}

/// The single drawing surface: one optional background page plus stamp
/// overlays painted in insertion order.
///
/// The background is immovable and never selectable. At most one overlay is
/// active; it only becomes active through pointer input and is cleared when
/// removed.
#[derive(Debug)]
pub struct OverlaySurface {
    id: SurfaceId,
    config: SurfaceConfig,
    height: u32,
    background: Option<Background>,
    overlays: Vec<(OverlayId, Overlay)>,
    next_overlay: u64,
    active: Option<OverlayId>,
    hovered: Option<OverlayId>,
    drag: Option<Drag>,
}

impl OverlaySurface {
    pub fn new(config: SurfaceConfig) -> crate::error::Result<Self> {
        if config.container_width <= config.margin {
            return Err(StampError::config(format!(
                "container width {} must exceed margin {}",
                config.container_width, config.margin
            )));
        }
        if !(config.height_ratio >= 1.0) {
            return Err(StampError::config(format!(
                "height ratio must be >= 1.0, got {}",
                config.height_ratio
            )));
        }
        Ok(Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            config,
            height: config.container_height,
            background: None,
            overlays: Vec::new(),
            next_overlay: 1,
            active: None,
            hovered: None,
            drag: None,
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.container_width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width the background is scaled to: container width minus margin.
    pub fn width_budget(&self) -> u32 {
        self.config.container_width - self.config.margin
    }

    /// Top-left corner of the background on the surface.
    pub fn background_origin(&self) -> (u32, u32) {
        let inset = self.config.margin / 2;
        (inset, inset)
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Rendered (scaled) size of the background.
    pub fn background_size(&self) -> Option<(u32, u32)> {
        self.background.as_ref().map(|bg| bg.image.dimensions())
    }

    /// Replace the background with `raster` scaled to `width_budget` pixels
    /// wide, preserving aspect ratio.
    ///
    /// The surface grows to `rendered_height * height_ratio` (never shrinks)
    /// and existing overlays are left untouched. Re-binding the same raster
    /// at the same budget is a no-op.
    pub fn bind_background(
        &mut self,
        raster: &EncodedRaster,
        width_budget: u32,
    ) -> crate::error::Result<()> {
        if width_budget == 0 {
            return Err(StampError::config("background width budget must be > 0"));
        }

        let digest = raster.digest();
        if let Some(bg) = &self.background
            && bg.digest == digest
            && bg.width_budget == width_budget
        {
            debug!(surface = self.id.0, "background unchanged, skipping rebind");
            return Ok(());
        }

        let decoded = raster.decode().map_err(|e| match e {
            StampError::InvalidRasterFormat(_) => e,
            other => StampError::invalid_raster(other.to_string()),
        })?;
        let (w, h) = decoded.dimensions();
        let (_, top) = self.background_origin();
        let required = scaled_height(w, h, width_budget).and_then(|rendered_height| {
            let ratio_height = (rendered_height as f32 * self.config.height_ratio).ceil() as f64;
            let required = ratio_height.max((top as f64) + rendered_height as f64);
            (required <= MAX_SURFACE_DIMENSION as f64).then_some(required as u32)
        });
        let Some(required) = required else {
            return Err(StampError::render_target(format!(
                "{w}x{h} background at {width_budget} px wide would exceed {MAX_SURFACE_DIMENSION} px"
            )));
        };

        let image = scale_to_width(&decoded, width_budget)?;
        let rendered_height = image.height();
        self.height = self.height.max(required);

        info!(
            surface = self.id.0,
            width = image.width(),
            height = rendered_height,
            surface_height = self.height,
            "background bound"
        );
        self.background = Some(Background {
            image,
            digest,
            width_budget,
        });
        Ok(())
    }

    /// [`bind_background`](Self::bind_background) from a `data:image/` URL.
    pub fn bind_background_data_url(
        &mut self,
        url: &str,
        width_budget: u32,
    ) -> crate::error::Result<()> {
        let raster = EncodedRaster::from_data_url(url)?;
        self.bind_background(&raster, width_budget)
    }

    /// Insert `overlay` at `position` (or [`DEFAULT_OVERLAY_POSITION`]).
    ///
    /// The new overlay paints on top and does not become active.
    pub fn add_overlay(&mut self, mut overlay: Overlay, position: Option<(f32, f32)>) -> OverlayId {
        let (left, top) = position.unwrap_or(DEFAULT_OVERLAY_POSITION);
        overlay.set_position(left, top);
        let id = OverlayId(self.next_overlay);
        self.next_overlay += 1;
        self.overlays.push((id, overlay));
        debug!(surface = self.id.0, %id, left, top, "overlay added");
        id
    }

    /// Remove an overlay by identity. Unknown ids are a no-op.
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.overlays.iter().position(|(oid, _)| *oid == id)?;
        let (_, overlay) = self.overlays.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        debug!(surface = self.id.0, %id, "overlay removed");
        Some(overlay)
    }

    pub fn active_overlay(&self) -> Option<OverlayId> {
        self.active
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays
            .iter()
            .find(|(oid, _)| *oid == id)
            .map(|(_, o)| o)
    }

    fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays
            .iter_mut()
            .find(|(oid, _)| *oid == id)
            .map(|(_, o)| o)
    }

    /// Overlays in paint order (bottom first).
    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, o)| (*id, o))
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Drop the background and every overlay; height returns to the
    /// container height.
    pub fn clear(&mut self) {
        self.background = None;
        self.overlays.clear();
        self.active = None;
        self.hovered = None;
        self.drag = None;
        self.height = self.config.container_height;
        debug!(surface = self.id.0, "surface cleared");
    }

    /// Topmost overlay under the point, if any.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<OverlayId> {
        self.overlays
            .iter()
            .rev()
            .find(|(_, o)| o.contains(x, y))
            .map(|(id, _)| *id)
    }

    /// Pointer moved to `(x, y)`: drag the active overlay if a drag is in
    /// progress, then update hover state.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Vec<AppliedEffect> {
        if let Some(drag) = self.drag {
            let (dx, dy) = (x - drag.last_x, y - drag.last_y);
            if let Some(overlay) = self.overlay_mut(drag.id) {
                overlay.translate(dx, dy);
            }
            self.drag = Some(Drag {
                last_x: x,
                last_y: y,
                ..drag
            });
        }

        let mut applied = Vec::new();
        let target = self.hit_test(x, y);
        if target != self.hovered {
            if let Some(previous) = self.hovered.take() {
                applied.extend(self.dispatch(previous, OverlayEvent::PointerLeave, x, y));
            }
            if let Some(next) = target {
                applied.extend(self.dispatch(next, OverlayEvent::PointerEnter, x, y));
            }
            self.hovered = target;
        }
        applied
    }

    /// Pointer pressed at `(x, y)`.
    ///
    /// Pressing a visible delete affordance removes its composite; pressing
    /// an overlay elsewhere selects it and starts a drag; pressing empty
    /// space (or the background) clears the selection.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Vec<AppliedEffect> {
        self.drag = None;
        let mut applied = self.pointer_move(x, y);

        let Some(id) = self.hit_test(x, y) else {
            self.active = None;
            return applied;
        };
        let event = match self.overlay(id) {
            Some(o) if o.hits_affordance(x, y) => OverlayEvent::AffordancePressed,
            _ => OverlayEvent::BodyPressed,
        };
        applied.extend(self.dispatch(id, event, x, y));
        applied
    }

    /// Pointer released: end any drag.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    fn dispatch(&mut self, id: OverlayId, event: OverlayEvent, x: f32, y: f32) -> Vec<AppliedEffect> {
        let Some(policy) = self.overlay(id).map(Overlay::policy) else {
            return Vec::new();
        };

        let mut applied = Vec::new();
        for effect in effects_for(policy, event) {
            match effect {
                OverlayEffect::ShowDeleteAffordance | OverlayEffect::HideDeleteAffordance => {
                    let visible = effect == OverlayEffect::ShowDeleteAffordance;
                    if let Some(overlay) = self.overlay_mut(id) {
                        overlay.set_affordance_visible(visible);
                    }
                }
                OverlayEffect::RemoveComposite => {
                    self.remove_overlay(id);
                }
                OverlayEffect::SelectAndDrag => {
                    self.active = Some(id);
                    self.drag = Some(Drag {
                        id,
                        last_x: x,
                        last_y: y,
                    });
                }
            }
            applied.push(AppliedEffect {
                overlay: id,
                effect,
            });
            if effect == OverlayEffect::RemoveComposite {
                break;
            }
        }
        applied
    }

    /// Flatten background and overlays into one bitmap at 1:1 surface scale.
    pub fn render(&self) -> crate::error::Result<RgbaImage> {
        let (width, height) = (self.width(), self.height);
        if width == 0 || height == 0 || width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION
        {
            return Err(StampError::render_target(format!(
                "cannot allocate a {width}x{height} render target"
            )));
        }

        let mut canvas = RgbaImage::from_pixel(width, height, self.config.background_color);
        if let Some(bg) = &self.background {
            let (left, top) = self.background_origin();
            imageops::overlay(&mut canvas, &bg.image, left as i64, top as i64);
        }
        for (_, overlay) in &self.overlays {
            overlay.paint(&mut canvas);
        }
        Ok(canvas)
    }

    /// [`render`](Self::render) and encode as PNG. Read-only.
    pub fn serialize_to_raster(&self) -> crate::error::Result<EncodedRaster> {
        EncodedRaster::encode_png(&self.render()?)
    }
}

/// Height of a `w`x`h` image scaled to `width`, or `None` when it would not
/// fit in [`MAX_SURFACE_DIMENSION`].
pub(crate) fn scaled_height(w: u32, h: u32, width: u32) -> Option<u32> {
    if w == 0 || width == 0 || width > MAX_SURFACE_DIMENSION {
        return None;
    }
    let height = (h as f64 * width as f64 / w as f64).round().max(1.0);
    (height <= MAX_SURFACE_DIMENSION as f64).then_some(height as u32)
}

/// Scale `image` to exactly `width` pixels wide, preserving aspect ratio.
///
/// Fails before allocating when the result would exceed
/// [`MAX_SURFACE_DIMENSION`] on either axis.
pub(crate) fn scale_to_width(image: &RgbaImage, width: u32) -> crate::error::Result<RgbaImage> {
    let (w, h) = image.dimensions();
    let height = scaled_height(w, h, width).ok_or_else(|| {
        StampError::render_target(format!(
            "{w}x{h} image scaled to {width} px wide exceeds {MAX_SURFACE_DIMENSION} px"
        ))
    })?;
    if w == width {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, imageops::FilterType::Triangle))
}
