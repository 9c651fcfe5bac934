//! File upload with a server-push progress side channel.
//!
//! Two suspension chains race inside one task: the progress stream (advisory)
//! and the primary `POST /upload` (authoritative). Whatever the progress
//! stream says, the primary response decides the outcome.

use std::future::pending;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ProgressStream, StorageApi};
use crate::error::{validation, ClientError, ClientResult};
use crate::i18n::Msg;
use crate::navigation::Navigator;
use crate::types::{FileSource, NodeId, UploadPayload, UploadReceipt};
use crate::ui::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What the upload dialog collected.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<FileSource>,
    /// Explicit target name; blank means "use the file's own name".
    pub name: Option<String>,
    pub parent_id: Option<NodeId>,
}

struct UploadState {
    phase: UploadPhase,
    /// Cancelling stops listening to progress, nothing else.
    listener: Option<CancellationToken>,
    last_percent: u8,
}

/// How long the progress stream may take to come up before the upload goes
/// out without it.
pub const DEFAULT_PROGRESS_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct UploadCoordinator {
    api: Arc<dyn StorageApi>,
    surface: Surface,
    close_delay: Duration,
    progress_open_timeout: Duration,
    state: Mutex<UploadState>,
}

/// Client-generated id tying one upload attempt to its progress stream.
/// Unrelated to the node id the server assigns.
pub fn correlation_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("u{}{}", millis, &suffix[..8])
}

impl UploadCoordinator {
    pub fn new(api: Arc<dyn StorageApi>, surface: Surface, close_delay: Duration) -> Self {
        Self {
            api,
            surface,
            close_delay,
            progress_open_timeout: DEFAULT_PROGRESS_OPEN_TIMEOUT,
            state: Mutex::new(UploadState { phase: UploadPhase::Idle, listener: None, last_percent: 0 }),
        }
    }

    pub fn with_progress_open_timeout(mut self, timeout: Duration) -> Self {
        self.progress_open_timeout = timeout;
        self
    }

    pub fn phase(&self) -> UploadPhase {
        self.lock().phase
    }

    /// Last percentage shown on the progress bar.
    pub fn last_percent(&self) -> u8 {
        self.lock().last_percent
    }

    pub fn is_busy(&self) -> bool {
        self.phase() == UploadPhase::Submitting
    }

    /// Upload `req.file` and refresh `nav` on success.
    ///
    /// Rejected with `UploadInProgress` while another submission is in
    /// flight. Controls are disabled for the duration and re-enabled on
    /// every way out, including this future being dropped.
    pub async fn submit(&self, req: UploadRequest, nav: &Navigator) -> ClientResult<UploadReceipt> {
        let Some(file) = req.file else {
            self.surface.ui.alert(&self.surface.tr(Msg::SelectFileToUpload));
            return Err(ClientError::validation("file", "no file selected"));
        };
        let target_name = target_name(req.name.as_deref(), &file.name).inspect_err(|e| {
            warn!("upload rejected before sending: {}", e);
            self.surface.alert(Msg::UploadFailed, e);
        })?;

        let guard = self.enter()?;
        let upload_id = correlation_id();
        let token = CancellationToken::new();
        self.lock().listener = Some(token.clone());
        self.show_progress(0);

        let progress = self.open_progress(&upload_id, &token).await;

        let payload = UploadPayload { upload_id: upload_id.clone(), target_name, parent_id: req.parent_id, file };
        info!("uploading '{}' ({} bytes) as {}", payload.target_name, payload.file.bytes.len(), upload_id);
        let result = self.race(&payload, progress, &token).await;

        match result {
            Ok(receipt) => {
                self.show_progress(100);
                guard.finish(UploadPhase::Succeeded);
                info!("upload {} finished as node {:?}", upload_id, receipt.node_id);
                self.surface.status(Msg::Uploaded, &receipt.label());
                nav.refresh().await;
                if !self.close_delay.is_zero() {
                    tokio::time::sleep(self.close_delay).await;
                }
                self.surface.ui.close_modal();
                Ok(receipt)
            }
            Err(e) => {
                guard.finish(UploadPhase::Failed);
                warn!("upload {} failed: {}", upload_id, e);
                self.surface.alert(Msg::UploadFailed, &e);
                Err(e)
            }
        }
    }

    /// The user closed the dialog. Stops listening to progress; an in-flight
    /// upload keeps running to completion in the background.
    pub fn dismiss(&self) -> bool {
        let listener = self.lock().listener.take();
        self.surface.ui.close_modal();
        match listener {
            Some(token) => {
                info!("upload dialog dismissed, in-flight upload continues without progress");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Bring up the progress stream before the payload goes out. Bounded by
    /// a timeout and by dismissal; either way the upload proceeds without it.
    async fn open_progress(&self, upload_id: &str, token: &CancellationToken) -> Option<ProgressStream> {
        let opening = tokio::time::timeout(self.progress_open_timeout, self.api.open_progress(upload_id));
        tokio::select! {
            opened = opening => match opened {
                Ok(Ok(stream)) => Some(stream),
                Ok(Err(e)) => {
                    warn!("progress stream for {} unavailable, continuing without: {}", upload_id, e);
                    None
                }
                Err(_) => {
                    warn!(
                        "progress stream for {} not up after {:?}, continuing without",
                        upload_id, self.progress_open_timeout
                    );
                    None
                }
            },
            _ = token.cancelled() => {
                debug!("dialog dismissed while opening progress for {}", upload_id);
                None
            }
        }
    }

    async fn race(
        &self,
        payload: &UploadPayload,
        mut progress: Option<ProgressStream>,
        token: &CancellationToken,
    ) -> ClientResult<UploadReceipt> {
        let primary = self.api.upload_file(payload);
        tokio::pin!(primary);
        loop {
            let listening = progress.is_some();
            tokio::select! {
                res = &mut primary => return res,
                ev = next_percent(&mut progress), if listening => match ev {
                    Some(Ok(pct)) => {
                        self.show_progress(pct);
                        if pct >= 100 {
                            debug!("progress for {} reached 100, closing stream", payload.upload_id);
                            progress = None;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("progress stream for {} broke: {}", payload.upload_id, e);
                        progress = None;
                    }
                    None => progress = None,
                },
                _ = token.cancelled(), if listening => {
                    debug!("stopped listening to progress for {}", payload.upload_id);
                    progress = None;
                }
            }
        }
    }

    fn enter(&self) -> ClientResult<SubmitGuard<'_>> {
        {
            let mut st = self.lock();
            if st.phase == UploadPhase::Submitting {
                return Err(ClientError::UploadInProgress);
            }
            st.phase = UploadPhase::Submitting;
        }
        self.surface.ui.set_controls_enabled(false);
        Ok(SubmitGuard { owner: self })
    }

    fn show_progress(&self, percent: u8) {
        self.lock().last_percent = percent;
        self.surface.ui.show_progress(percent);
    }

    fn lock(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Explicit name when given, else the file's own name.
fn target_name(explicit: Option<&str>, file_name: &str) -> ClientResult<String> {
    match validation::optional_name(explicit, "filename")? {
        Some(name) => Ok(name),
        None => validation::required_name(file_name, "filename"),
    }
}

async fn next_percent(progress: &mut Option<ProgressStream>) -> Option<ClientResult<u8>> {
    match progress {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}

/// Holds the in-flight slot. Dropping it re-enables the controls and, when
/// no terminal phase was recorded, marks the attempt failed.
struct SubmitGuard<'a> {
    owner: &'a UploadCoordinator,
}

impl SubmitGuard<'_> {
    fn finish(&self, phase: UploadPhase) {
        self.owner.lock().phase = phase;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        {
            let mut st = self.owner.lock();
            if st.phase == UploadPhase::Submitting {
                st.phase = UploadPhase::Failed;
            }
            st.listener = None;
        }
        self.owner.surface.ui.set_controls_enabled(true);
    }
}
