use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::StorageApi;
use crate::i18n::Msg;
use crate::types::{Node, NodeId};
use crate::ui::Surface;
use crate::view::render_listing;

/// The main view's position in the tree.
///
/// Failures never reach the caller: they are rendered as an inline error and
/// the view stays usable.
pub struct Navigator {
    api: Arc<dyn StorageApi>,
    surface: Surface,
    current: Mutex<Option<Node>>,
}

/// What the last navigation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Rendered,
    ErrorShown,
}

impl Navigator {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface) -> Self {
        Self { api, surface, current: Mutex::new(None) }
    }

    /// Snapshot of the viewed node.
    pub fn current(&self) -> Option<Node> {
        self.lock().clone()
    }

    /// Id of the viewed node; `None` at root or before the first load.
    pub fn current_id(&self) -> Option<NodeId> {
        self.lock().as_ref().and_then(|n| n.id)
    }

    pub async fn open(&self, id: Option<NodeId>) -> NavOutcome {
        debug!("navigate to {:?}", id);
        match self.api.fetch_node(id).await {
            Ok(node) => {
                let view = render_listing(&node, self.surface.messages.as_ref());
                *self.lock() = Some(node);
                self.surface.ui.show_listing(&view);
                NavOutcome::Rendered
            }
            Err(e) => {
                warn!("failed to load node {:?}: {}", id, e);
                self.surface
                    .ui
                    .show_error(&self.surface.messages.with_detail(Msg::ErrorPrefix, &e));
                NavOutcome::ErrorShown
            }
        }
    }

    /// Parent of the viewed node, or root when there is none.
    pub async fn go_up(&self) -> NavOutcome {
        let parent = self.lock().as_ref().and_then(|n| n.parent_id);
        self.open(parent).await
    }

    pub async fn go_home(&self) -> NavOutcome {
        self.open(None).await
    }

    /// Reload the viewed node.
    pub async fn refresh(&self) -> NavOutcome {
        let id = self.current_id();
        self.open(id).await
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Node>> {
        // never held across an await
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
