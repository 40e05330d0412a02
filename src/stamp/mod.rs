pub mod factory;
pub mod registry;

use crate::raster::EncodedRaster;

/// A registered stamp image available for placement. Duplicate content is
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampSource {
    pub name: String,
    pub raster: EncodedRaster,
}
