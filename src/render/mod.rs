#[cfg(feature = "pdfium")]
pub mod pdfium;

use image::DynamicImage;

/// Pixel size of a page rendered at a given scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Compute the viewport for a page of `width_pts` x `height_pts` at `scale`.
    ///
    /// Each axis is rounded to the nearest pixel and clamped to at least one
    /// pixel.
    pub fn for_page(width_pts: f32, height_pts: f32, scale: f32) -> Self {
        let px = |pts: f32| ((pts * scale).round() as u32).max(1);
        Self {
            width: px(width_pts),
            height: px(height_pts),
        }
    }
}

/// An open document inside the rendering library.
///
/// Page numbers are 1-based.
pub trait RenderSession {
    fn page_count(&self) -> u32;

    /// Page size in PDF points (1/72 inch).
    fn page_size_pts(&self, page_number: u32) -> crate::error::Result<(f32, f32)>;

    /// Rasterize a page into a bitmap of exactly `viewport` pixels.
    fn render(&self, page_number: u32, viewport: Viewport) -> crate::error::Result<DynamicImage>;
}

/// The document-rendering library.
///
/// Opening a document yields a session that only lives for the duration of
/// `f`; the library may keep thread-affine state, so a session is never
/// handed across threads.
pub trait DocumentRenderer: Send + Sync {
    fn with_session(
        &self,
        bytes: &[u8],
        f: &mut dyn FnMut(&dyn RenderSession) -> crate::error::Result<()>,
    ) -> crate::error::Result<()>;
}
