//! Transport to the storage service.
//!
//! [`StorageApi`] is the seam every coordinator talks through; [`HttpStorage`]
//! is the `reqwest` implementation. Calls are plain request/response with no
//! retries; the caller decides what a failure means.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::*;

/// Server-push progress: one percentage (0-100) per event.
pub type ProgressStream = BoxStream<'static, ClientResult<u8>>;

#[async_trait]
pub trait StorageApi: Send + Sync {
    /// `GET /node/` for `None`, `GET /node/{id}` otherwise. The node comes
    /// back with its immediate children.
    async fn fetch_node(&self, id: Option<NodeId>) -> ClientResult<Node>;

    /// `GET /file/{id}`; `inline` asks for inline rather than attachment
    /// disposition.
    async fn fetch_file(&self, id: NodeId, inline: bool) -> ClientResult<Vec<u8>>;

    async fn create_folder(&self, name: &str, parent_id: Option<NodeId>) -> ClientResult<UploadReceipt>;

    async fn upload_file(&self, payload: &UploadPayload) -> ClientResult<UploadReceipt>;

    /// Opens `GET /upload/progress?upload_id=...`. Resolves once the stream
    /// is established, so events sent afterwards are not missed.
    async fn open_progress(&self, upload_id: &str) -> ClientResult<ProgressStream>;

    async fn transfer(&self, kind: TransferKind, req: &TransferRequest) -> ClientResult<TransferReceipt>;

    async fn rename(&self, req: &RenameRequest) -> ClientResult<Ack>;

    async fn delete(&self, req: &DeleteRequest) -> ClientResult<Ack>;
}

#[derive(Clone)]
pub struct HttpStorage {
    client: Client,
    base: Url,
    request_timeout: std::time::Duration,
}

impl HttpStorage {
    pub fn new(cfg: &ServerConfig) -> ClientResult<Self> {
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| ClientError::validation("server.base_url", e.to_string()))?;
        // No overall timeout on the client: uploads and the progress stream
        // may legitimately run long. JSON calls get a per-request timeout.
        let client = Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { client, base, request_timeout: cfg.request_timeout() })
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::validation("path", format!("{}: {}", path, e)))
    }

    async fn send(&self, req: RequestBuilder) -> ClientResult<Response> {
        let resp = req.send().await?;
        check_status(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!("GET {}", path);
        let resp = self.send(self.client.get(self.url(path)?).timeout(self.request_timeout)).await?;
        Ok(resp.json().await?)
    }

    /// POST a JSON body. A success status with an unparseable body decodes
    /// to `T::default()`.
    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        debug!("POST {}", path);
        let resp = self
            .send(self.client.post(self.url(path)?).json(body).timeout(self.request_timeout))
            .await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            debug!("POST {} returned non-JSON body ({}), treating as acknowledgment", path, e);
            T::default()
        }))
    }

    async fn post_upload(&self, form: Form) -> ClientResult<UploadReceipt> {
        let resp = self.send(self.client.post(self.url("/upload")?).multipart(form)).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.trim().to_string()
    };
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(format!("{}: {}", url, message)));
    }
    Err(ClientError::Transport { status: status.as_u16(), message })
}

#[async_trait]
impl StorageApi for HttpStorage {
    async fn fetch_node(&self, id: Option<NodeId>) -> ClientResult<Node> {
        let path = match id {
            Some(id) => format!("/node/{}", id),
            None => "/node/".to_string(),
        };
        let node: Node = self.get_json(&path).await?;
        Ok(node.normalized())
    }

    async fn fetch_file(&self, id: NodeId, inline: bool) -> ClientResult<Vec<u8>> {
        let mut url = self.url(&format!("/file/{}", id))?;
        if inline {
            url.query_pairs_mut().append_pair("inline", "1");
        }
        debug!("GET {}", url.path());
        let resp = self.send(self.client.get(url)).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn create_folder(&self, name: &str, parent_id: Option<NodeId>) -> ClientResult<UploadReceipt> {
        debug!("POST /upload (folder '{}' under {:?})", name, parent_id);
        let mut form = Form::new().text("filename", name.to_string()).text("is_dir", "true");
        if let Some(parent) = parent_id {
            form = form.text("oya_id", parent.to_string());
        }
        self.post_upload(form).await
    }

    async fn upload_file(&self, payload: &UploadPayload) -> ClientResult<UploadReceipt> {
        debug!(
            "POST /upload (file '{}', {} bytes, upload_id={})",
            payload.target_name,
            payload.file.bytes.len(),
            payload.upload_id
        );
        let mut form = Form::new()
            .text("filename", payload.target_name.clone())
            .text("is_dir", "false");
        if let Some(parent) = payload.parent_id {
            form = form.text("oya_id", parent.to_string());
        }
        form = form.text("upload_id", payload.upload_id.clone());
        let part = Part::bytes(payload.file.bytes.clone())
            .file_name(payload.file.name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| ClientError::validation("file", e.to_string()))?;
        form = form.part("file", part);
        self.post_upload(form).await
    }

    async fn open_progress(&self, upload_id: &str) -> ClientResult<ProgressStream> {
        let mut url = self.url("/upload/progress")?;
        url.query_pairs_mut().append_pair("upload_id", upload_id);
        debug!("GET /upload/progress?upload_id={}", upload_id);
        let resp = self
            .send(self.client.get(url).header(reqwest::header::ACCEPT, "text/event-stream"))
            .await?;
        Ok(sse_percentages(resp))
    }

    async fn transfer(&self, kind: TransferKind, req: &TransferRequest) -> ClientResult<TransferReceipt> {
        self.post_json(kind.endpoint(), req).await
    }

    async fn rename(&self, req: &RenameRequest) -> ClientResult<Ack> {
        self.post_json::<_, serde_json::Value>("/rename", req).await.map(|_| Ack)
    }

    async fn delete(&self, req: &DeleteRequest) -> ClientResult<Ack> {
        self.post_json::<_, serde_json::Value>("/delete", req).await.map(|_| Ack)
    }
}

/// Turns an SSE response body into a stream of percentages.
///
/// Only `data:` lines are read; comments, keep-alives and other fields are
/// skipped, as are data lines that are not numbers.
fn sse_percentages(resp: Response) -> ProgressStream {
    let bytes = resp.bytes_stream().boxed();
    stream::unfold((bytes, Vec::<u8>::new()), |(mut bytes, mut buf)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(pct) = parse_data_line(&line) {
                    return Some((Ok(pct), (bytes, buf)));
                }
                continue;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => return Some((Err(ClientError::from(e)), (bytes, buf))),
                None => return None,
            }
        }
    })
    .boxed()
}

pub(crate) fn parse_data_line(line: &[u8]) -> Option<u8> {
    let line = std::str::from_utf8(line).ok()?.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?.trim();
    let value: f64 = data.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 100.0).round() as u8)
}
