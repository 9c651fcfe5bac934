//! Copy and move with destination picking and overwrite confirmation.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::StorageApi;
use crate::error::{ClientError, ClientResult, OptionExt};
use crate::i18n::Msg;
use crate::navigation::Navigator;
use crate::picker::FolderPicker;
use crate::types::{Node, NodeId, TransferKind, TransferRequest};
use crate::ui::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    AwaitingDestination,
    AwaitingConfirmation,
    Submitting,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { name: String },
    /// The user declined to overwrite; nothing was sent.
    Declined,
}

struct Messages {
    title: Msg,
    done: Msg,
    failed: Msg,
}

fn messages(kind: TransferKind) -> Messages {
    match kind {
        TransferKind::Copy => Messages { title: Msg::CopyDestinationTitle, done: Msg::Copied, failed: Msg::CopyFailed },
        TransferKind::Move => Messages { title: Msg::MoveDestinationTitle, done: Msg::Moved, failed: Msg::MoveFailed },
    }
}

/// One copy or move workflow: source lookup, destination picker, conflict
/// check, confirmation, request.
pub struct TransferCoordinator {
    api: Arc<dyn StorageApi>,
    surface: Surface,
    kind: TransferKind,
    phase: TransferPhase,
    source: Option<Node>,
    src_id: Option<NodeId>,
    picker: Option<FolderPicker>,
}

impl TransferCoordinator {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface, kind: TransferKind) -> Self {
        Self { api, surface, kind, phase: TransferPhase::Idle, source: None, src_id: None, picker: None }
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    pub fn source(&self) -> Option<&Node> {
        self.source.as_ref()
    }

    /// The open destination picker, if any.
    pub fn picker_mut(&mut self) -> Option<&mut FolderPicker> {
        self.picker.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.picker.as_ref().is_some_and(|p| p.is_open())
    }

    /// Fetch the source and open the picker at `start` (the main view's
    /// current folder).
    pub async fn begin(&mut self, src_id: NodeId, start: Option<NodeId>) -> ClientResult<()> {
        let source = match self.api.fetch_node(Some(src_id)).await {
            Ok(node) => node,
            Err(e) => {
                warn!("{:?}: source #{} unavailable: {}", self.kind, src_id, e);
                self.surface.alert(Msg::SourceUnavailable, &e);
                self.phase = TransferPhase::Failed;
                return Err(ClientError::SourceUnavailable(Box::new(e)));
            }
        };

        let msgs = messages(self.kind);
        let mut picker = FolderPicker::new(self.api.clone(), self.surface.clone(), self.surface.tr(msgs.title))
            .with_failure_message(msgs.failed);
        picker.open(start).await;

        self.source = Some(source);
        self.src_id = Some(src_id);
        self.picker = Some(picker);
        self.phase = TransferPhase::AwaitingDestination;
        Ok(())
    }

    /// Confirm the picker's candidate as destination and run the transfer.
    ///
    /// On failure the picker stays open and `choose` may be called again.
    pub async fn choose(&mut self, nav: &Navigator) -> ClientResult<TransferOutcome> {
        let Some(mut picker) = self.picker.take() else {
            return Err(ClientError::NoSelection);
        };
        let source = self.source.clone().ok_or_not_found("transfer source")?;

        let result = picker.choose(|dst| self.resolve(source, dst, nav)).await;
        match &result {
            Err(ClientError::NoSelection) => {}
            Err(_) => self.phase = TransferPhase::Failed,
            Ok(_) => {}
        }
        if picker.is_open() {
            self.picker = Some(picker);
        }
        result
    }

    /// Abandon the workflow without sending anything.
    pub fn cancel(&mut self) {
        if let Some(mut picker) = self.picker.take() {
            picker.cancel();
        }
        self.phase = TransferPhase::Idle;
    }

    async fn resolve(&mut self, source: Node, dst_id: NodeId, nav: &Navigator) -> ClientResult<TransferOutcome> {
        let src_id = self.src_id.ok_or_not_found("transfer source")?;
        let destination = self
            .api
            .fetch_node(Some(dst_id))
            .await
            .map_err(|e| ClientError::DestinationUnavailable(Box::new(e)))?;

        let mut overwrite = None;
        if destination.find_conflict(&source.name, source.is_dir).is_some() {
            self.phase = TransferPhase::AwaitingConfirmation;
            if !self.surface.ui.confirm(&self.surface.tr(Msg::OverwritePrompt)) {
                info!("{:?} #{} -> #{} declined at overwrite prompt", self.kind, src_id, dst_id);
                self.phase = TransferPhase::Idle;
                return Ok(TransferOutcome::Declined);
            }
            overwrite = Some(true);
        }

        self.phase = TransferPhase::Submitting;
        let req = TransferRequest { src_id, dst_id, overwrite };
        let receipt = self
            .api
            .transfer(self.kind, &req)
            .await
            .map_err(|e| ClientError::RequestFailed(Box::new(e)))?;

        let name = receipt.name.unwrap_or_default();
        info!("{:?} #{} -> #{} done as '{}'", self.kind, src_id, dst_id, name);
        self.phase = TransferPhase::Done;
        self.surface.status(messages(self.kind).done, &name);
        nav.refresh().await;
        Ok(TransferOutcome::Completed { name })
    }
}
