//! Single-request node actions: create folder, rename, delete, download.
//!
//! Each one validates its input, sends one request, and on success updates the
//! status line, closes the dialog and refreshes the main view. Failures become
//! an alert and leave the view alone.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::StorageApi;
use crate::error::{validation, ClientError, ClientResult};
use crate::i18n::Msg;
use crate::navigation::Navigator;
use crate::types::{DeleteRequest, NodeId, RenameRequest, UploadReceipt};
use crate::ui::Surface;

pub struct NodeActions {
    api: Arc<dyn StorageApi>,
    surface: Surface,
}

impl NodeActions {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface) -> Self {
        Self { api, surface }
    }

    /// New folder under the main view's current node.
    pub async fn create_folder(&self, name: &str, nav: &Navigator) -> ClientResult<UploadReceipt> {
        let name = self.require(name, "filename", Msg::EnterFolderName)?;
        let parent = nav.current_id();
        match self.api.create_folder(&name, parent).await {
            Ok(receipt) => {
                info!("created folder '{}' under {:?}", name, parent);
                self.surface.ui.close_modal();
                self.surface.status(Msg::FolderCreated, &receipt.label());
                nav.refresh().await;
                Ok(receipt)
            }
            Err(e) => Err(self.fail(Msg::CreateFolderFailed, e)),
        }
    }

    pub async fn rename(&self, id: NodeId, new_name: &str, nav: &Navigator) -> ClientResult<()> {
        let new_name = self.require(new_name, "new_name", Msg::EnterNewName)?;
        let req = RenameRequest { src_id: id, new_name };
        match self.api.rename(&req).await {
            Ok(_) => {
                info!("renamed #{} to '{}'", id, req.new_name);
                self.surface.ui.set_status(&self.surface.tr(Msg::Renamed));
                self.surface.ui.close_modal();
                nav.refresh().await;
                Ok(())
            }
            Err(e) => Err(self.fail(Msg::RenameFailed, e)),
        }
    }

    /// Deletes without asking; confirmation is the caller's dialog.
    pub async fn delete(&self, id: NodeId, nav: &Navigator) -> ClientResult<()> {
        match self.api.delete(&DeleteRequest { src_id: id }).await {
            Ok(_) => {
                info!("deleted #{}", id);
                self.surface.ui.set_status(&self.surface.tr(Msg::Deleted));
                self.surface.ui.close_modal();
                nav.refresh().await;
                Ok(())
            }
            Err(e) => Err(self.fail(Msg::DeleteFailed, e)),
        }
    }

    /// Raw bytes of a file node.
    pub async fn download(&self, id: NodeId, inline: bool) -> ClientResult<Vec<u8>> {
        self.api.fetch_file(id, inline).await.map_err(|e| self.fail(Msg::DownloadFailed, e))
    }

    fn require(&self, value: &str, field: &str, prompt: Msg) -> ClientResult<String> {
        validation::required_name(value, field).inspect_err(|_| {
            self.surface.ui.alert(&self.surface.tr(prompt));
        })
    }

    fn fail(&self, msg: Msg, e: ClientError) -> ClientError {
        warn!("{:?}: {}", msg, e);
        self.surface.alert(msg, &e);
        e
    }
}
