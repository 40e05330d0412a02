// Stamp uploads: type filter + hard cap on registered sources

use std::path::Path;

use image::ImageFormat;
use tracing::{debug, warn};

use super::StampSource;
use crate::raster::EncodedRaster;

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// One file offered for stamp upload.
#[derive(Debug, Clone)]
pub struct StampUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl StampUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file, taking its MIME type from the extension the way a file
    /// picker would.
    pub fn from_path(path: &Path) -> crate::error::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or(UNKNOWN_MIME_TYPE);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_type, bytes))
    }
}

/// Outcome of one [`StampRegistry::register`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampUploadReport {
    pub accepted: usize,
    /// Dropped silently for not matching the allowed type.
    pub rejected_type: usize,
    /// Dropped because the registry ran out of slots.
    pub rejected_over_cap: usize,
    /// User-facing message, present when anything hit the cap.
    pub warning: Option<String>,
}

/// The set of stamp sources available for placement, capped at `max`.
#[derive(Debug, Clone)]
pub struct StampRegistry {
    max: usize,
    allowed_type: String,
    stamps: Vec<StampSource>,
}

impl StampRegistry {
    pub fn new(max: usize, allowed_type: impl Into<String>) -> Self {
        Self {
            max,
            allowed_type: allowed_type.into(),
            stamps: Vec::new(),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn allowed_type(&self) -> &str {
        &self.allowed_type
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.stamps.len() >= self.max
    }

    pub fn remaining_slots(&self) -> usize {
        self.max.saturating_sub(self.stamps.len())
    }

    pub fn stamps(&self) -> &[StampSource] {
        &self.stamps
    }

    pub fn get(&self, index: usize) -> Option<&StampSource> {
        self.stamps.get(index)
    }

    /// Register uploads in order.
    ///
    /// Files of another type are filtered out without a warning; files
    /// beyond the remaining slot count are truncated with one.
    pub fn register(&mut self, uploads: Vec<StampUpload>) -> StampUploadReport {
        let offered = uploads.len();
        let typed: Vec<StampUpload> = uploads
            .into_iter()
            .filter(|u| u.mime_type == self.allowed_type)
            .collect();
        let rejected_type = offered - typed.len();
        if rejected_type > 0 {
            debug!(
                rejected_type,
                allowed = %self.allowed_type,
                "filtered stamp uploads by type"
            );
        }

        let remaining = self.remaining_slots();
        let rejected_over_cap = typed.len().saturating_sub(remaining);
        let accepted = typed.len() - rejected_over_cap;

        self.stamps.extend(typed.into_iter().take(accepted).map(|u| StampSource {
            name: u.name,
            raster: EncodedRaster::from_bytes(u.bytes),
        }));

        let warning = (rejected_over_cap > 0).then(|| {
            format!(
                "At most {} stamp images can be registered: {} slot(s) were free, {} image(s) rejected",
                self.max, remaining, rejected_over_cap
            )
        });
        if let Some(message) = &warning {
            warn!("{message}");
        }

        StampUploadReport {
            accepted,
            rejected_type,
            rejected_over_cap,
            warning,
        }
    }

    /// Remove the source at `index`; later sources shift down.
    pub fn remove(&mut self, index: usize) -> Option<StampSource> {
        (index < self.stamps.len()).then(|| self.stamps.remove(index))
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}
