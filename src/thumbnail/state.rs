// Visible thumbnail state: idle / loading / error / ready, latest run wins

use tracing::debug;

use super::PageImage;
use crate::error::StampError;

/// What the page list shows.
///
/// `Ready` only ever holds the complete, dense page list of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailState {
    Idle,
    Loading,
    Error(String),
    Ready(Vec<PageImage>),
}

/// Identifies one generation run. Only the most recently issued ticket may
/// publish a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

#[derive(Debug)]
pub struct ThumbnailTracker {
    state: ThumbnailState,
    latest: u64,
    /// SHA-256 of the document the latest run was started for.
    document_digest: Option<String>,
}

impl Default for ThumbnailTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailTracker {
    pub fn new() -> Self {
        Self {
            state: ThumbnailState::Idle,
            latest: 0,
            document_digest: None,
        }
    }

    pub fn state(&self) -> &ThumbnailState {
        &self.state
    }

    /// Start a new run, superseding any run still in flight.
    pub fn begin(&mut self) -> RunTicket {
        self.latest += 1;
        self.state = ThumbnailState::Loading;
        self.document_digest = None;
        RunTicket(self.latest)
    }

    /// [`begin`](Self::begin) tagged with the digest of the document being
    /// rendered.
    pub fn begin_for(&mut self, document_digest: &str) -> RunTicket {
        let ticket = self.begin();
        self.document_digest = Some(document_digest.to_string());
        debug!(ticket = ticket.0, document = document_digest, "thumbnail run started");
        ticket
    }

    /// Digest of the document behind the current state, if the latest run
    /// was tagged.
    pub fn document_digest(&self) -> Option<&str> {
        self.document_digest.as_deref()
    }

    /// Publish a run's outcome. Returns `false` (and changes nothing) when
    /// the ticket has been superseded.
    pub fn finish(
        &mut self,
        ticket: RunTicket,
        result: crate::error::Result<Vec<PageImage>>,
    ) -> bool {
        match result {
            Ok(pages) => self.publish(ticket, ThumbnailState::Ready(pages)),
            Err(e) => self.fail(ticket, &e),
        }
    }

    /// Publish a failed run without consuming the error.
    pub fn fail(&mut self, ticket: RunTicket, error: &StampError) -> bool {
        self.publish(ticket, ThumbnailState::Error(error_message(error)))
    }

    fn publish(&mut self, ticket: RunTicket, state: ThumbnailState) -> bool {
        if ticket.0 != self.latest {
            debug!(
                ticket = ticket.0,
                latest = self.latest,
                "discarding superseded thumbnail run"
            );
            return false;
        }
        self.state = state;
        true
    }

    /// Show the "no document" error and invalidate in-flight runs.
    pub fn no_document(&mut self) {
        self.latest += 1;
        self.state = ThumbnailState::Error(error_message(&StampError::NoDocumentProvided));
        self.document_digest = None;
    }

    /// Back to idle, invalidating in-flight runs.
    pub fn reset(&mut self) {
        self.latest += 1;
        self.state = ThumbnailState::Idle;
        self.document_digest = None;
    }

    /// Pages of a ready run; empty in every other state.
    pub fn pages(&self) -> &[PageImage] {
        match &self.state {
            ThumbnailState::Ready(pages) => pages,
            _ => &[],
        }
    }

    /// Look up a ready page by its 1-based number.
    pub fn page(&self, page_number: u32) -> Option<&PageImage> {
        self.pages().iter().find(|p| p.page_number == page_number)
    }
}

fn error_message(e: &StampError) -> String {
    format!("PDF processing failed: {e}")
}
