pub mod tiling;

use image::{DynamicImage, imageops};
use tracing::info;

use crate::error::StampError;
use crate::pdf::writer::PaginatedWriter;
use crate::raster::EncodedRaster;
use crate::surface::OverlaySurface;
use tiling::plan_tiles;

/// Flatten the surface into a single PNG.
///
/// A surface without a background has nothing worth exporting and fails
/// with [`StampError::EmptySurface`]. The surface is never modified.
pub fn export_raster(surface: &OverlaySurface) -> crate::error::Result<EncodedRaster> {
    if !surface.has_background() {
        return Err(StampError::EmptySurface);
    }
    let raster = surface.serialize_to_raster()?;
    info!(
        width = surface.width(),
        height = surface.height(),
        bytes = raster.len(),
        "exported surface raster"
    );
    Ok(raster)
}

/// Flatten the surface and lay it out over `page_width_mm` x
/// `page_height_mm` pages, returning the PDF bytes.
///
/// See [`tiling::plan_tiles`] for how tall content is split.
pub fn export_paginated(
    surface: &OverlaySurface,
    page_width_mm: f64,
    page_height_mm: f64,
) -> crate::error::Result<Vec<u8>> {
    if !surface.has_background() {
        return Err(StampError::EmptySurface);
    }

    let canvas = surface.render()?;
    let plan = plan_tiles(canvas.width(), canvas.height(), page_width_mm, page_height_mm)?;
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut writer = PaginatedWriter::new(page_width_mm, page_height_mm);
    for tile in &plan.tiles {
        let slice = imageops::crop_imm(&rgb, 0, tile.src_y, rgb.width(), tile.src_height).to_image();
        writer.add_image_page(&slice, page_width_mm, tile.dest_height_mm)?;
    }

    info!(
        pages = plan.page_count(),
        content_height_mm = plan.content_height_mm,
        "exported paginated document"
    );
    writer.finish()
}
