// Delete-key handling scoped to the mounted surface

use tracing::{debug, warn};

use crate::surface::overlay::OverlayId;
use crate::surface::{OverlaySurface, SurfaceId};

/// Keyboard signals the controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Other,
}

/// Routes the global delete-key signal to the currently mounted surface.
///
/// The binding is installed with [`bind`](Self::bind) when a surface becomes
/// available and torn down with [`unbind`](Self::unbind) (or replaced by the
/// next `bind`). Key presses aimed at any other surface are ignored.
#[derive(Debug, Default)]
pub struct SelectionController {
    bound: Option<SurfaceId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, surface: &OverlaySurface) {
        self.bound = Some(surface.id());
        debug!(surface = ?self.bound, "delete key bound");
    }

    pub fn unbind(&mut self) {
        if self.bound.take().is_some() {
            debug!("delete key unbound");
        }
    }

    pub fn bound_surface(&self) -> Option<SurfaceId> {
        self.bound
    }

    /// Remove the surface's active overlay, if there is one.
    pub fn on_delete_key(surface: &mut OverlaySurface) -> Option<OverlayId> {
        let id = surface.active_overlay()?;
        surface.remove_overlay(id).map(|_| id)
    }

    /// Dispatch a key press. Only [`Key::Delete`] on the bound surface has
    /// an effect.
    pub fn handle_key(&self, key: Key, surface: &mut OverlaySurface) -> Option<OverlayId> {
        if key != Key::Delete {
            return None;
        }
        if self.bound != Some(surface.id()) {
            warn!(
                bound = ?self.bound,
                surface = ?surface.id(),
                "delete key ignored: surface is not bound"
            );
            return None;
        }
        Self::on_delete_key(surface)
    }
}
