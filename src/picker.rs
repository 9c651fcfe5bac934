use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::StorageApi;
use crate::error::{ClientError, ClientResult};
use crate::i18n::Msg;
use crate::navigation::NavOutcome;
use crate::types::{Node, NodeId};
use crate::ui::Surface;
use crate::view::render_picker;

/// Modal sub-navigator for choosing a destination folder.
///
/// Owns its own position, separate from the main [`Navigator`](crate::navigation::Navigator),
/// so browsing here never moves the main view. The *candidate* is what
/// [`choose`](FolderPicker::choose) hands to the caller; it starts out as the
/// viewed folder and can be pointed at a visible subfolder without entering it.
pub struct FolderPicker {
    api: Arc<dyn StorageApi>,
    surface: Surface,
    title: String,
    failure_msg: Msg,
    viewed: Option<Node>,
    candidate: Option<NodeId>,
    error: Option<String>,
    open: bool,
}

impl FolderPicker {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface, title: impl Into<String>) -> Self {
        Self {
            api,
            surface,
            title: title.into(),
            failure_msg: Msg::OperationFailed,
            viewed: None,
            candidate: None,
            error: None,
            open: false,
        }
    }

    /// Message prefix for alerts raised when the completion callback fails.
    pub fn with_failure_message(mut self, msg: Msg) -> Self {
        self.failure_msg = msg;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn candidate(&self) -> Option<NodeId> {
        self.candidate
    }

    pub fn viewed(&self) -> Option<&Node> {
        self.viewed.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Show the modal and load `start_id` (root for `None`).
    pub async fn open(&mut self, start_id: Option<NodeId>) -> NavOutcome {
        self.open = true;
        self.load(start_id).await
    }

    /// Enter a visible subfolder; the candidate follows.
    pub async fn drill_into(&mut self, child_id: NodeId) -> ClientResult<NavOutcome> {
        self.visible_dir(child_id)?;
        Ok(self.load(Some(child_id)).await)
    }

    /// Point the candidate at a visible subfolder without entering it.
    pub fn select_child(&mut self, child_id: NodeId) -> ClientResult<()> {
        self.visible_dir(child_id)?;
        self.candidate = Some(child_id);
        self.render();
        Ok(())
    }

    /// Parent of the viewed folder, or root.
    pub async fn back(&mut self) -> NavOutcome {
        let parent = self.viewed.as_ref().and_then(|n| n.parent_id);
        self.load(parent).await
    }

    pub async fn home(&mut self) -> NavOutcome {
        self.load(None).await
    }

    /// Hand the candidate to `on_pick`.
    ///
    /// The picker closes only when the callback succeeds. A failing callback
    /// is reported to the user and leaves the picker open with its state
    /// intact, so the user can pick again.
    pub async fn choose<F, Fut, T>(&mut self, on_pick: F) -> ClientResult<T>
    where
        F: FnOnce(NodeId) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let Some(target) = self.candidate.filter(|_| self.open) else {
            self.surface.ui.alert(&self.surface.tr(Msg::SelectTargetFolder));
            return Err(ClientError::NoSelection);
        };
        debug!("picker '{}' chose {}", self.title, target);
        match on_pick(target).await {
            Ok(value) => {
                self.close();
                Ok(value)
            }
            Err(e) => {
                warn!("picker '{}' callback failed for {}: {}", self.title, target, e);
                self.surface.alert(self.failure_msg, &e);
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.surface.ui.close_modal();
        }
    }

    fn visible_dir(&self, child_id: NodeId) -> ClientResult<&Node> {
        self.viewed
            .as_ref()
            .and_then(|n| n.child(child_id))
            .filter(|c| c.is_dir)
            .ok_or_else(|| ClientError::validation("destination", format!("#{} is not a folder here", child_id)))
    }

    async fn load(&mut self, id: Option<NodeId>) -> NavOutcome {
        let outcome = match self.api.fetch_node(id).await {
            Ok(node) => {
                self.candidate = node.id;
                self.viewed = Some(node);
                self.error = None;
                NavOutcome::Rendered
            }
            Err(e) => {
                warn!("picker failed to load {:?}: {}", id, e);
                self.error = Some(e.to_string());
                NavOutcome::ErrorShown
            }
        };
        self.render();
        outcome
    }

    fn render(&self) {
        if !self.open {
            return;
        }
        let view = render_picker(
            &self.title,
            self.viewed.as_ref(),
            self.candidate,
            self.error.as_deref(),
            self.surface.messages.as_ref(),
        );
        self.surface.ui.show_picker(&view);
    }
}
