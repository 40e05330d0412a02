pub mod generator;
pub mod state;

use crate::raster::EncodedRaster;

/// One rasterized page of the source document.
///
/// Immutable once produced; `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page_number: u32,
    pub raster: EncodedRaster,
    pub pixel_width: u32,
    pub pixel_height: u32,
}
