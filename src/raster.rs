// Encoded raster handling: data URLs <-> image bytes <-> RgbaImage

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};

use crate::error::StampError;

const DATA_URL_IMAGE_PREFIX: &str = "data:image/";

/// Encoded image bytes (PNG, JPEG, ...) as produced by page rendering or
/// supplied by a stamp upload.
///
/// The bytes are reference-counted so page images and stamp sources can be
/// cloned into the session and the surface without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRaster {
    bytes: Arc<[u8]>,
}

impl EncodedRaster {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse a `data:image/<type>;base64,<payload>` URL.
    ///
    /// Anything that is not a base64 image data URL is rejected with
    /// [`StampError::InvalidRasterFormat`].
    pub fn from_data_url(url: &str) -> crate::error::Result<Self> {
        if !url.starts_with(DATA_URL_IMAGE_PREFIX) {
            return Err(StampError::invalid_raster(
                "expected a data:image/ URL",
            ));
        }
        let (metadata, payload) = url
            .split_once(',')
            .ok_or_else(|| StampError::invalid_raster("missing comma in data URL"))?;
        let is_base64 = metadata
            .split(';')
            .skip(1)
            .any(|param| param.trim().eq_ignore_ascii_case("base64"));
        if !is_base64 {
            return Err(StampError::invalid_raster(
                "only base64-encoded image data URLs are supported",
            ));
        }
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self::from_bytes(bytes))
    }

    /// Encode an RGBA bitmap as PNG.
    pub fn encode_png(image: &RgbaImage) -> crate::error::Result<Self> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| StampError::render_target(format!("PNG encode failed: {e}")))?;
        Ok(Self::from_bytes(buf.into_inner()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sniff the embedded encoding from the magic bytes.
    pub fn format(&self) -> crate::error::Result<ImageFormat> {
        image::guess_format(self.as_bytes())
            .map_err(|_| StampError::invalid_raster("unrecognized image encoding"))
    }

    /// MIME type of the sniffed encoding.
    pub fn mime_type(&self) -> crate::error::Result<&'static str> {
        Ok(self.format()?.to_mime_type())
    }

    /// Render as a base64 data URL, e.g. `data:image/png;base64,...`.
    pub fn to_data_url(&self) -> crate::error::Result<String> {
        let mime = self.mime_type()?;
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(self.as_bytes())))
    }

    /// Decode into an RGBA bitmap.
    pub fn decode(&self) -> crate::error::Result<RgbaImage> {
        let format = self.format()?;
        let image = image::load_from_memory_with_format(self.as_bytes(), format)?;
        Ok(image.to_rgba8())
    }

    /// SHA-256 of the encoded bytes, lowercase hex.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.as_bytes()))
    }
}
