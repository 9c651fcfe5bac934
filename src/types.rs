//! Wire types shared by the transport and the coordinators.
//!
//! Field names follow the storage service: the parent id travels as
//! `oya_id` and the children of a listing as `ko`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub type NodeId = u64;

/// An entry in the storage hierarchy, either a directory or a file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Node {
    /// Absent for the root node.
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default, rename = "oya_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Only present when the node was fetched as a listing target.
    #[serde(default, rename = "ko", skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Enforces the listing invariants on a freshly decoded node: files carry
    /// no children, and every child points back at this node.
    pub fn normalized(mut self) -> Self {
        if !self.is_dir {
            if self.children.as_ref().is_some_and(|c| !c.is_empty()) {
                tracing::debug!("dropping children of file node {:?}", self.id);
            }
            self.children = None;
            return self;
        }
        let own_id = self.id;
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.parent_id.is_none() {
                    child.parent_id = own_id;
                }
                if !child.is_dir {
                    child.children = None;
                }
            }
        }
        self
    }

    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Directory-type children only, in listing order.
    pub fn child_dirs(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|c| c.is_dir)
    }

    pub fn child(&self, id: NodeId) -> Option<&Node> {
        self.children().iter().find(|c| c.id == Some(id))
    }

    /// Existing child sharing both `name` and directory/file type.
    ///
    /// Same name with a different type is not a conflict.
    pub fn find_conflict(&self, name: &str, is_dir: bool) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name && c.is_dir == is_dir)
    }

    /// Display name; the root may come back nameless.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "/"
        } else {
            &self.name
        }
    }

    /// Path for headers: the server-provided path, else a best guess from the
    /// name.
    pub fn display_path(&self) -> String {
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            return path.to_string();
        }
        let name = self.display_name();
        if name == "/" {
            "/".to_string()
        } else if self.parent_id.is_some() {
            format!("/{}", name)
        } else {
            name.to_string()
        }
    }
}

/// Which of the two transfer endpoints to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Copy,
    Move,
}

impl TransferKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            TransferKind::Copy => "/copy",
            TransferKind::Move => "/move",
        }
    }
}

/// Body of `POST /copy` and `POST /move`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TransferRequest {
    pub src_id: NodeId,
    pub dst_id: NodeId,
    /// Omitted entirely unless the user confirmed an overwrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// Body of `POST /rename`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RenameRequest {
    pub src_id: NodeId,
    pub new_name: String,
}

/// Body of `POST /delete`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeleteRequest {
    pub src_id: NodeId,
}

/// Response of copy/move. Empty when the body was not JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TransferReceipt {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `POST /upload`, for both files and folders.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct UploadReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UploadReceipt {
    /// Name for the status line, falling back to the node id.
    pub fn label(&self) -> String {
        match (&self.name, self.node_id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => id.to_string(),
            _ => String::new(),
        }
    }
}

/// Bare acknowledgment of rename/delete. The body is never inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack;

/// A local file chosen for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    /// Original file name, used when no explicit target name is given.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything `POST /upload` needs for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub upload_id: String,
    pub target_name: String,
    pub parent_id: Option<NodeId>,
    pub file: FileSource,
}
