// Uploaded document handle: validated PDF bytes shared with the render worker

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::pdf::reader::PdfReader;

/// An uploaded paginated document.
///
/// Created on upload and replaced on the next upload or removal. The bytes
/// are held behind an `Arc` so a thumbnail run can hand its own clone to the
/// render worker; that clone is dropped as soon as the run ends, whether it
/// completed, failed or timed out.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    bytes: Arc<[u8]>,
    page_count: u32,
    /// (幅, 高さ) pt、ページ順
    page_sizes: Vec<(f64, f64)>,
    digest: String,
}

impl Document {
    /// Validate `bytes` as a PDF and record its page count and page sizes.
    ///
    /// A page whose MediaBox is missing, empty or oversized rejects the
    /// whole document.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> crate::error::Result<Self> {
        let name = name.into();
        let reader = PdfReader::from_bytes(&bytes)?;
        let page_count = reader.page_count();
        if page_count == 0 {
            return Err(crate::error::StampError::pdf_read(format!(
                "document '{name}' has no pages"
            )));
        }
        let page_sizes = (1..=page_count)
            .map(|n| reader.page_dimensions(n))
            .collect::<crate::error::Result<Vec<_>>>()?;
        let digest = hex::encode(Sha256::digest(&bytes));
        Ok(Self {
            name,
            bytes: bytes.into(),
            page_count,
            page_sizes,
            digest,
        })
    }

    /// Read and validate a PDF from disk.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Size of page `page_number` (1-based) in points.
    pub fn page_size_pts(&self, page_number: u32) -> Option<(f64, f64)> {
        let index = usize::try_from(page_number).ok()?.checked_sub(1)?;
        self.page_sizes.get(index).copied()
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// SHA-256 of the document bytes, lowercase hex.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A shared handle to the bytes for a render worker.
    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Number of live handles to the byte buffer (this document included).
    pub fn byte_handle_count(&self) -> usize {
        Arc::strong_count(&self.bytes)
    }
}
