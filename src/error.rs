use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No document provided")]
    NoDocumentProvided,

    #[error("Document load timed out after {timeout_ms} ms")]
    LoadTimeout { timeout_ms: u64 },

    #[error("Page {page} render failure: {message}")]
    PageRenderFailure { page: u32, message: String },

    #[error("Invalid raster format: {0}")]
    InvalidRasterFormat(String),

    #[error("Image load failure: {0}")]
    ImageLoadFailure(String),

    #[error("Surface has no background to export")]
    EmptySurface,

    #[error("Render target unavailable: {0}")]
    RenderTargetUnavailable(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Stamp upload error: {0}")]
    StampUploadError(String),

    #[error("Page {0} is not available for selection")]
    PageNotAvailable(u32),

    #[error("No stamp registered at index {0}")]
    StampNotFound(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`StampError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl StampError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an invalid raster format error.
    invalid_raster => InvalidRasterFormat,
    /// Create an image load failure.
    image_load => ImageLoadFailure,
    /// Create a render target unavailable error.
    render_target => RenderTargetUnavailable,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a render (backend) error.
    render => RenderError,
    /// Create a stamp upload error.
    stamp_upload => StampUploadError,
}

impl StampError {
    /// Create a page render failure for a 1-based page number.
    pub fn page_render(page: u32, msg: impl Into<String>) -> Self {
        Self::PageRenderFailure {
            page,
            message: msg.into(),
        }
    }
}

impl From<lopdf::Error> for StampError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_yml::Error> for StampError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<base64::DecodeError> for StampError {
    fn from(e: base64::DecodeError) -> Self {
        Self::InvalidRasterFormat(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for StampError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for StampError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageLoadFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StampError>;
