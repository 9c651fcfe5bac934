use std::sync::Arc;
use std::time::Duration;

use crate::actions::NodeActions;
use crate::api::{HttpStorage, StorageApi};
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::i18n::Catalog;
use crate::navigation::{NavOutcome, Navigator};
use crate::picker::FolderPicker;
use crate::transfer::{TransferCoordinator, TransferOutcome};
use crate::types::{FileSource, NodeId, TransferKind, UploadReceipt};
use crate::ui::{Surface, Ui};
use crate::upload::{UploadCoordinator, UploadRequest};

/// One browsing session: the main view plus the workflows that act on it.
///
/// At most one copy/move workflow is open at a time, mirroring the single
/// modal slot of the page.
pub struct Session {
    api: Arc<dyn StorageApi>,
    surface: Surface,
    nav: Navigator,
    actions: NodeActions,
    uploads: UploadCoordinator,
    transfer: Option<TransferCoordinator>,
}

impl Session {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface, upload_close_delay: Duration) -> Self {
        Self {
            nav: Navigator::new(api.clone(), surface.clone()),
            actions: NodeActions::new(api.clone(), surface.clone()),
            uploads: UploadCoordinator::new(api.clone(), surface.clone(), upload_close_delay),
            transfer: None,
            api,
            surface,
        }
    }

    /// HTTP transport and message catalog from configuration. The progress
    /// stream gets the same time to come up as any JSON request.
    pub fn from_config(cfg: &AppConfig, ui: Arc<dyn Ui>) -> ClientResult<Self> {
        let api: Arc<dyn StorageApi> = Arc::new(HttpStorage::new(&cfg.server)?);
        let surface = Surface::new(ui, Arc::new(Catalog::new(cfg.locale())));
        let mut session = Self::new(api, surface, Duration::from_millis(cfg.upload.close_delay_ms));
        session.uploads = session.uploads.with_progress_open_timeout(cfg.server.request_timeout());
        Ok(session)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Initial load: the root listing.
    pub async fn start(&self) -> NavOutcome {
        self.nav.go_home().await
    }

    pub async fn open(&self, id: Option<NodeId>) -> NavOutcome {
        self.nav.open(id).await
    }

    pub async fn up(&self) -> NavOutcome {
        self.nav.go_up().await
    }

    pub async fn home(&self) -> NavOutcome {
        self.nav.go_home().await
    }

    pub async fn create_folder(&self, name: &str) -> ClientResult<UploadReceipt> {
        self.actions.create_folder(name, &self.nav).await
    }

    pub async fn rename(&self, id: NodeId, new_name: &str) -> ClientResult<()> {
        self.actions.rename(id, new_name, &self.nav).await
    }

    pub async fn delete(&self, id: NodeId) -> ClientResult<()> {
        self.actions.delete(id, &self.nav).await
    }

    pub async fn download(&self, id: NodeId, inline: bool) -> ClientResult<Vec<u8>> {
        self.actions.download(id, inline).await
    }

    /// Upload into the folder the main view currently shows.
    pub async fn upload(&self, file: Option<FileSource>, name: Option<String>) -> ClientResult<UploadReceipt> {
        let req = UploadRequest { file, name, parent_id: self.nav.current_id() };
        self.uploads.submit(req, &self.nav).await
    }

    /// Start copy/move of `src_id`; the picker opens at the main view's folder.
    pub async fn begin_transfer(&mut self, kind: TransferKind, src_id: NodeId) -> ClientResult<()> {
        if let Some(mut previous) = self.transfer.take() {
            previous.cancel();
        }
        let mut coordinator = TransferCoordinator::new(self.api.clone(), self.surface.clone(), kind);
        coordinator.begin(src_id, self.nav.current_id()).await?;
        self.transfer = Some(coordinator);
        Ok(())
    }

    /// Picker of the open copy/move workflow.
    pub fn transfer_picker(&mut self) -> Option<&mut FolderPicker> {
        self.transfer.as_mut().and_then(|t| t.picker_mut())
    }

    pub fn transfer(&self) -> Option<&TransferCoordinator> {
        self.transfer.as_ref()
    }

    /// Confirm the picker's candidate. The workflow is dropped once its
    /// picker has closed; on failure it stays open for another attempt.
    pub async fn choose_destination(&mut self) -> ClientResult<TransferOutcome> {
        let coordinator = self.transfer.as_mut().ok_or(ClientError::NoSelection)?;
        let result = coordinator.choose(&self.nav).await;
        if !coordinator.is_active() {
            self.transfer = None;
        }
        result
    }

    pub fn cancel_transfer(&mut self) {
        if let Some(mut coordinator) = self.transfer.take() {
            coordinator.cancel();
        }
    }
}
