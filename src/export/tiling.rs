// Tall raster -> fixed-size pages: vertical slices at page-width scale

use crate::error::StampError;

/// Tolerance for "fits on one page" and page-count comparisons, in mm.
const MM_EPSILON: f64 = 1e-6;

/// One vertical slice of the source raster and the height it occupies on
/// its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub src_y: u32,
    pub src_height: u32,
    pub dest_height_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Height of the whole raster when scaled to the page width.
    pub content_height_mm: f64,
    pub tiles: Vec<Tile>,
}

impl TilePlan {
    pub fn page_count(&self) -> usize {
        self.tiles.len()
    }
}

/// Split a `width_px` x `height_px` raster into pages of
/// `page_width_mm` x `page_height_mm`.
///
/// The raster is scaled to the page width. Content that fits one page gives
/// one tile; taller content is cut into page-height slices, the last one
/// kept at actual size rather than stretched. Slices are contiguous and
/// cover every source row exactly once.
pub fn plan_tiles(
    width_px: u32,
    height_px: u32,
    page_width_mm: f64,
    page_height_mm: f64,
) -> crate::error::Result<TilePlan> {
    crate::config::settings::validate_page_size(page_width_mm, page_height_mm)?;
    if width_px == 0 || height_px == 0 {
        return Err(StampError::render_target(format!(
            "cannot paginate a {width_px}x{height_px} raster"
        )));
    }

    let px_per_mm = width_px as f64 / page_width_mm;
    let content_height_mm = height_px as f64 / px_per_mm;

    if content_height_mm <= page_height_mm + MM_EPSILON {
        return Ok(TilePlan {
            page_width_mm,
            page_height_mm,
            content_height_mm,
            tiles: vec![Tile {
                src_y: 0,
                src_height: height_px,
                dest_height_mm: content_height_mm,
            }],
        });
    }

    let slice_px = page_height_mm * px_per_mm;
    let page_count = (content_height_mm / page_height_mm - MM_EPSILON).ceil() as u32;

    let mut tiles = Vec::with_capacity(page_count as usize);
    let mut src_y = 0u32;
    for i in 1..=page_count {
        if src_y >= height_px {
            break;
        }
        let end = if i == page_count {
            height_px
        } else {
            ((i as f64 * slice_px).round() as u32).clamp(src_y + 1, height_px)
        };
        let src_height = end - src_y;
        tiles.push(Tile {
            src_y,
            src_height,
            dest_height_mm: src_height as f64 / px_per_mm,
        });
        src_y = end;
    }

    Ok(TilePlan {
        page_width_mm,
        page_height_mm,
        content_height_mm,
        tiles,
    })
}
