// Document -> ordered page rasters, sequential, bounded by a load timeout

use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::PageImage;
use crate::document::Document;
use crate::error::StampError;
use crate::raster::EncodedRaster;
use crate::render::{DocumentRenderer, RenderSession, Viewport};

/// Messages from the render worker to the consuming [`PageStream`].
enum WorkerMessage {
    Ready { page_count: u32 },
    Page(crate::error::Result<PageImage>),
    Failed(StampError),
}

/// Turns a [`Document`] into page rasters.
///
/// Each run opens the document on a dedicated worker thread. The caller
/// waits at most `timeout` for the document to become ready; after that,
/// pages are rendered strictly one after another, in ascending page order.
pub struct ThumbnailGenerator {
    renderer: Arc<dyn DocumentRenderer>,
    scale: f32,
    timeout: Duration,
}

impl ThumbnailGenerator {
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        scale: f32,
        timeout: Duration,
    ) -> crate::error::Result<Self> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(StampError::config(format!(
                "render scale must be > 0, got {scale}"
            )));
        }
        if timeout.is_zero() {
            return Err(StampError::config("thumbnail timeout must be > 0"));
        }
        Ok(Self {
            renderer,
            scale,
            timeout,
        })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open `document` and return a lazy stream over its pages.
    ///
    /// Fails with [`StampError::NoDocumentProvided`] when `document` is
    /// `None` and with [`StampError::LoadTimeout`] when the document is not
    /// ready within the timeout. A timed-out worker is abandoned: it notices
    /// the dropped receiver on its next send and exits.
    pub fn start(&self, document: Option<&Document>) -> crate::error::Result<PageStream> {
        let document = document.ok_or(StampError::NoDocumentProvided)?;

        let (tx, rx) = mpsc::sync_channel(0);
        let renderer = Arc::clone(&self.renderer);
        let bytes = document.shared_bytes();
        let scale = self.scale;

        thread::Builder::new()
            .name("thumbnail-render".to_string())
            .spawn(move || run_worker(renderer.as_ref(), bytes, scale, tx))?;

        match rx.recv_timeout(self.timeout) {
            Ok(WorkerMessage::Ready { page_count }) => {
                debug!(
                    document = document.name(),
                    page_count, "document ready for rendering"
                );
                Ok(PageStream {
                    rx: Some(rx),
                    page_count,
                    next_page: 1,
                })
            }
            Ok(WorkerMessage::Failed(e)) => Err(e),
            Ok(WorkerMessage::Page(_)) => Err(StampError::render(
                "render worker sent a page before the document was ready",
            )),
            Err(RecvTimeoutError::Timeout) => {
                let timeout_ms = saturating_millis(self.timeout);
                warn!(
                    document = document.name(),
                    digest = document.digest(),
                    timeout_ms,
                    "document load timed out"
                );
                Err(StampError::LoadTimeout { timeout_ms })
            }
            Err(RecvTimeoutError::Disconnected) => Err(StampError::render(
                "render worker exited before the document was ready",
            )),
        }
    }

    /// Render every page of `document`.
    ///
    /// All-or-nothing: any failure discards the pages rendered so far.
    pub fn generate(&self, document: Option<&Document>) -> crate::error::Result<Vec<PageImage>> {
        let pages = self
            .start(document)?
            .collect::<crate::error::Result<Vec<_>>>()?;
        info!(pages = pages.len(), "thumbnail generation complete");
        Ok(pages)
    }
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Worker body: open the document, report readiness, then render and send
/// pages one at a time. The rendezvous channel means page N+1 is not started
/// until page N has been taken by the consumer.
fn run_worker(
    renderer: &dyn DocumentRenderer,
    bytes: Arc<[u8]>,
    scale: f32,
    tx: SyncSender<WorkerMessage>,
) {
    let result = renderer.with_session(&bytes, &mut |session: &dyn RenderSession| {
        let page_count = session.page_count();
        if tx.send(WorkerMessage::Ready { page_count }).is_err() {
            return Ok(());
        }
        for page_number in 1..=page_count {
            let page = render_page(session, page_number, scale);
            let failed = page.is_err();
            if tx.send(WorkerMessage::Page(page)).is_err() || failed {
                return Ok(());
            }
        }
        Ok(())
    });

    if let Err(e) = result {
        let _ = tx.send(WorkerMessage::Failed(e));
    }
}

fn render_page(
    session: &dyn RenderSession,
    page_number: u32,
    scale: f32,
) -> crate::error::Result<PageImage> {
    let fail = |e: StampError| match e {
        StampError::PageRenderFailure { .. } => e,
        other => StampError::page_render(page_number, other.to_string()),
    };

    let (width_pts, height_pts) = session.page_size_pts(page_number).map_err(fail)?;
    let viewport = Viewport::for_page(width_pts, height_pts, scale);
    let bitmap = session.render(page_number, viewport).map_err(fail)?;

    if (bitmap.width(), bitmap.height()) != (viewport.width, viewport.height) {
        return Err(StampError::page_render(
            page_number,
            format!(
                "rendered {}x{} but viewport is {}x{}",
                bitmap.width(),
                bitmap.height(),
                viewport.width,
                viewport.height
            ),
        ));
    }

    let raster = EncodedRaster::encode_png(&bitmap.to_rgba8()).map_err(fail)?;
    debug!(
        page_number,
        width = viewport.width,
        height = viewport.height,
        "rendered page"
    );

    Ok(PageImage {
        page_number,
        raster,
        pixel_width: viewport.width,
        pixel_height: viewport.height,
    })
}

/// Lazy, finite, non-restartable sequence of rendered pages.
///
/// Yields pages 1..=N in order. After the first error the stream is
/// exhausted.
pub struct PageStream {
    rx: Option<Receiver<WorkerMessage>>,
    page_count: u32,
    next_page: u32,
}

impl PageStream {
    /// Page count reported by the open document.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }
}

impl Iterator for PageStream {
    type Item = crate::error::Result<PageImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let rx = self.rx.as_ref()?;
        if self.next_page > self.page_count {
            self.rx = None;
            return None;
        }

        let expected = self.next_page;
        let item = match rx.recv() {
            Ok(WorkerMessage::Page(Ok(page))) if page.page_number == expected => Ok(page),
            Ok(WorkerMessage::Page(Ok(page))) => Err(StampError::page_render(
                expected,
                format!("received page {} out of order", page.page_number),
            )),
            Ok(WorkerMessage::Page(Err(e))) | Ok(WorkerMessage::Failed(e)) => Err(e),
            Ok(WorkerMessage::Ready { .. }) => Err(StampError::render(
                "render worker reported readiness twice",
            )),
            Err(_) => Err(StampError::page_render(
                expected,
                "render worker exited before the page was delivered",
            )),
        };

        match &item {
            Ok(_) => self.next_page += 1,
            Err(_) => self.rx = None,
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rx.is_none() {
            return (0, Some(0));
        }
        let remaining = (self.page_count + 1).saturating_sub(self.next_page) as usize;
        (0, Some(remaining))
    }
}

impl FusedIterator for PageStream {}
