// pdfium-render wrapper: document bytes -> per-page DynamicImage (in-memory only)

use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;

use super::{DocumentRenderer, RenderSession, Viewport};

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(crate::error::StampError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(crate::error::StampError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path.to_str().ok_or_else(|| {
        crate::error::StampError::render("pdfium library path contains non-UTF-8 characters")
    })?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
    Ok(Pdfium::new(bindings))
}

/// [`DocumentRenderer`] backed by the pdfium shared library.
///
/// The library is bound inside [`DocumentRenderer::with_session`], on the
/// calling thread, and released when the session closure returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

struct PdfiumSession<'doc, 'lib> {
    document: &'doc PdfDocument<'lib>,
}

impl<'lib> PdfiumSession<'_, 'lib> {
    fn page(&self, page_number: u32) -> crate::error::Result<PdfPage<'lib>> {
        let index = page_number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| {
                crate::error::StampError::render(format!(
                    "page number {page_number} out of range"
                ))
            })?;
        Ok(self.document.pages().get(index)?)
    }
}

impl RenderSession for PdfiumSession<'_, '_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn page_size_pts(&self, page_number: u32) -> crate::error::Result<(f32, f32)> {
        let page = self.page(page_number)?;
        Ok((page.width().value, page.height().value))
    }

    fn render(&self, page_number: u32, viewport: Viewport) -> crate::error::Result<DynamicImage> {
        let page = self.page(page_number)?;
        let width = i32::try_from(viewport.width)
            .map_err(|_| crate::error::StampError::render("viewport width exceeds i32 range"))?;
        let height = i32::try_from(viewport.height)
            .map_err(|_| crate::error::StampError::render("viewport height exceeds i32 range"))?;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page.render_with_config(&config)?;
        Ok(bitmap.as_image())
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn with_session(
        &self,
        bytes: &[u8],
        f: &mut dyn FnMut(&dyn RenderSession) -> crate::error::Result<()>,
    ) -> crate::error::Result<()> {
        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None)?;
        let session = PdfiumSession {
            document: &document,
        };
        f(&session)
    }
}
