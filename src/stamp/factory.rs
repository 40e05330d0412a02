// Stamp source -> overlay composite placed on the surface

use tracing::{debug, warn};

use super::StampSource;
use crate::error::StampError;
use crate::surface::interaction::STAMP_POLICY;
use crate::surface::overlay::{Overlay, OverlayId};
use crate::surface::{OverlaySurface, scale_to_width};

/// Staggered default positions so repeated placements do not stack exactly.
///
/// Placement `n` (wrapping after `columns * rows`) lands at
/// `origin + (n % columns, n / columns) * step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementGrid {
    pub origin: (f32, f32),
    pub step: f32,
    pub columns: u32,
    pub rows: u32,
}

impl Default for PlacementGrid {
    fn default() -> Self {
        Self {
            origin: (50.0, 50.0),
            step: 20.0,
            columns: 5,
            rows: 5,
        }
    }
}

impl PlacementGrid {
    pub fn position(&self, placement: u32) -> (f32, f32) {
        let columns = self.columns.max(1);
        let n = placement % (columns * self.rows.max(1));
        let (col, row) = (n % columns, n / columns);
        (
            self.origin.0 + col as f32 * self.step,
            self.origin.1 + row as f32 * self.step,
        )
    }
}

#[derive(Debug, Default)]
pub struct OverlayFactory {
    grid: PlacementGrid,
    placements: u32,
}

impl OverlayFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(grid: PlacementGrid) -> Self {
        Self {
            grid,
            placements: 0,
        }
    }

    /// Number of default-position placements made so far.
    pub fn placements(&self) -> u32 {
        self.placements
    }

    /// Build a stamp composite from `source` and insert it at the next
    /// staggered position.
    pub fn create_and_place(
        &mut self,
        surface: &mut OverlaySurface,
        source: &StampSource,
        stamp_width: u32,
        affordance_size: u32,
    ) -> crate::error::Result<OverlayId> {
        self.create_and_place_at(surface, source, stamp_width, affordance_size, None)
    }

    /// Like [`create_and_place`](Self::create_and_place) but with an optional
    /// explicit position. Only default placements advance the stagger.
    ///
    /// A stamp that fails to decode is logged and reported as
    /// [`StampError::ImageLoadFailure`]; the surface is left untouched.
    pub fn create_and_place_at(
        &mut self,
        surface: &mut OverlaySurface,
        source: &StampSource,
        stamp_width: u32,
        affordance_size: u32,
        position: Option<(f32, f32)>,
    ) -> crate::error::Result<OverlayId> {
        if stamp_width == 0 {
            return Err(StampError::config("stamp width must be > 0"));
        }

        let decoded = source.raster.decode().map_err(|e| {
            warn!(stamp = %source.name, error = %e, "stamp image failed to load");
            StampError::image_load(format!("stamp '{}': {e}", source.name))
        })?;

        let scale = stamp_width as f32 / decoded.width() as f32;
        let image = scale_to_width(&decoded, stamp_width).inspect_err(|e| {
            warn!(stamp = %source.name, error = %e, "stamp too large to place");
        })?;
        let overlay = Overlay::new(
            source.raster.clone(),
            image,
            scale,
            affordance_size,
            STAMP_POLICY,
        );

        let position = match position {
            Some(p) => p,
            None => {
                let p = self.grid.position(self.placements);
                self.placements += 1;
                p
            }
        };
        let id = surface.add_overlay(overlay, Some(position));
        debug!(stamp = %source.name, %id, "stamp placed");
        Ok(id)
    }
}
