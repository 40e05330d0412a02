// Session state: active document, thumbnails, selected page, stamps, surface

use tracing::{debug, info};

use crate::config::merged::MergedConfig;
use crate::document::Document;
use crate::error::StampError;
use crate::export;
use crate::raster::EncodedRaster;
use crate::selection::{Key, SelectionController};
use crate::stamp::factory::OverlayFactory;
use crate::stamp::registry::{StampRegistry, StampUpload, StampUploadReport};
use crate::surface::overlay::OverlayId;
use crate::surface::{OverlaySurface, SurfaceConfig};
use crate::thumbnail::PageImage;
use crate::thumbnail::generator::ThumbnailGenerator;
use crate::thumbnail::state::{RunTicket, ThumbnailTracker};

/// Everything one editing session holds.
///
/// Created once and mutated only through its methods. Removing the document
/// clears the page list, the selection and the surface; registered stamps
/// survive document changes.
pub struct DocumentSession {
    document: Option<Document>,
    thumbnails: ThumbnailTracker,
    selected_page: Option<PageImage>,
    stamps: StampRegistry,
    surface: OverlaySurface,
    factory: OverlayFactory,
    selection: SelectionController,
    stamp_width: u32,
    affordance_size: u32,
}

impl DocumentSession {
    pub fn new(config: &MergedConfig) -> crate::error::Result<Self> {
        let surface = OverlaySurface::new(config.surface_config())?;
        let mut selection = SelectionController::new();
        selection.bind(&surface);
        Ok(Self {
            document: None,
            thumbnails: ThumbnailTracker::new(),
            selected_page: None,
            stamps: StampRegistry::new(config.max_stamps, config.allowed_stamp_type.clone()),
            surface,
            factory: OverlayFactory::new(),
            selection,
            stamp_width: config.stamp_width_px,
            affordance_size: config.delete_affordance_px,
        })
    }

    // ---- document ----

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Make `document` the active one, replacing any previous document and
    /// everything derived from it.
    pub fn upload_document(&mut self, document: Document) {
        info!(
            document = document.name(),
            pages = document.page_count(),
            bytes = document.byte_size(),
            digest = document.digest(),
            "document uploaded"
        );
        self.drop_derived_state();
        self.document = Some(document);
    }

    /// Drop the active document. The surface is cleared with it.
    pub fn remove_document(&mut self) -> Option<Document> {
        let removed = self.document.take();
        if let Some(doc) = &removed {
            info!(document = doc.name(), "document removed");
        }
        self.drop_derived_state();
        removed
    }

    fn drop_derived_state(&mut self) {
        self.thumbnails.reset();
        self.selected_page = None;
        self.surface.clear();
    }

    // ---- thumbnails ----

    pub fn thumbnails(&self) -> &ThumbnailTracker {
        &self.thumbnails
    }

    /// Start a thumbnail run for the active document.
    ///
    /// Without a document the visible state becomes the "no document" error
    /// and `None` is returned.
    pub fn begin_thumbnail_run(&mut self) -> Option<(RunTicket, Document)> {
        match &self.document {
            Some(doc) => Some((self.thumbnails.begin_for(doc.digest()), doc.clone())),
            None => {
                self.thumbnails.no_document();
                None
            }
        }
    }

    /// Publish a run started with [`begin_thumbnail_run`](Self::begin_thumbnail_run).
    /// Superseded runs are discarded and `false` is returned.
    pub fn finish_thumbnail_run(
        &mut self,
        ticket: RunTicket,
        result: crate::error::Result<Vec<PageImage>>,
    ) -> bool {
        self.thumbnails.finish(ticket, result)
    }

    /// Render every page of the active document and publish the result.
    ///
    /// Returns the page count on success. On failure the page list shows
    /// the error and the error is returned as well.
    pub fn load_thumbnails(
        &mut self,
        generator: &ThumbnailGenerator,
    ) -> crate::error::Result<usize> {
        let Some((ticket, document)) = self.begin_thumbnail_run() else {
            return Err(StampError::NoDocumentProvided);
        };
        match generator.generate(Some(&document)) {
            Ok(pages) => {
                let count = pages.len();
                self.thumbnails.finish(ticket, Ok(pages));
                Ok(count)
            }
            Err(e) => {
                self.thumbnails.fail(ticket, &e);
                Err(e)
            }
        }
    }

    // ---- page selection ----

    pub fn selected_page(&self) -> Option<&PageImage> {
        self.selected_page.as_ref()
    }

    /// Bind rendered page `page_number` as the surface background.
    ///
    /// Overlays already on the surface stay where they are.
    pub fn select_page(&mut self, page_number: u32) -> crate::error::Result<()> {
        let page = self
            .thumbnails
            .page(page_number)
            .cloned()
            .ok_or(StampError::PageNotAvailable(page_number))?;
        let budget = self.surface.width_budget();
        self.surface.bind_background(&page.raster, budget)?;
        debug!(page_number, "page selected");
        self.selected_page = Some(page);
        Ok(())
    }

    // ---- stamps ----

    pub fn stamps(&self) -> &StampRegistry {
        &self.stamps
    }

    pub fn register_stamps(&mut self, uploads: Vec<StampUpload>) -> StampUploadReport {
        self.stamps.register(uploads)
    }

    /// Unregister a stamp source. Overlays already placed from it remain.
    pub fn remove_stamp(&mut self, index: usize) -> crate::error::Result<()> {
        self.stamps
            .remove(index)
            .map(|_| ())
            .ok_or(StampError::StampNotFound(index))
    }

    pub fn clear_stamps(&mut self) {
        self.stamps.clear();
    }

    /// Place stamp `index` at the factory's next default position.
    pub fn place_stamp(&mut self, index: usize) -> crate::error::Result<OverlayId> {
        self.place_stamp_at(index, None)
    }

    pub fn place_stamp_at(
        &mut self,
        index: usize,
        position: Option<(f32, f32)>,
    ) -> crate::error::Result<OverlayId> {
        let source = self
            .stamps
            .get(index)
            .ok_or(StampError::StampNotFound(index))?;
        self.factory.create_and_place_at(
            &mut self.surface,
            source,
            self.stamp_width,
            self.affordance_size,
            position,
        )
    }

    // ---- surface ----

    pub fn surface(&self) -> &OverlaySurface {
        &self.surface
    }

    /// Pointer events go straight to the surface.
    pub fn surface_mut(&mut self) -> &mut OverlaySurface {
        &mut self.surface
    }

    /// Swap in a fresh surface (e.g. the host container was resized).
    ///
    /// The delete-key binding moves to the new surface and the selected page
    /// is re-bound as its background; overlays are not carried over.
    pub fn replace_surface(&mut self, config: SurfaceConfig) -> crate::error::Result<()> {
        let mut surface = OverlaySurface::new(config)?;
        if let Some(page) = &self.selected_page {
            let budget = surface.width_budget();
            surface.bind_background(&page.raster, budget)?;
        }
        self.selection.unbind();
        self.selection.bind(&surface);
        self.surface = surface;
        Ok(())
    }

    /// Route a key press to the bound surface.
    pub fn press_key(&mut self, key: Key) -> Option<OverlayId> {
        self.selection.handle_key(key, &mut self.surface)
    }

    // ---- export ----

    pub fn export_raster(&self) -> crate::error::Result<EncodedRaster> {
        export::export_raster(&self.surface)
    }

    pub fn export_paginated(
        &self,
        page_width_mm: f64,
        page_height_mm: f64,
    ) -> crate::error::Result<Vec<u8>> {
        export::export_paginated(&self.surface, page_width_mm, page_height_mm)
    }
}
