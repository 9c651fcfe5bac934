//! Pure rendering: node + children in, view models out.

use chrono::{DateTime, FixedOffset, Local};

use crate::i18n::{Msg, Translate};
use crate::types::{Node, NodeId};

/// Per-row actions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Open,
    Download,
    Copy,
    Move,
    Rename,
    Delete,
}

impl RowAction {
    pub fn msg(self) -> Msg {
        match self {
            RowAction::Open => Msg::Open,
            RowAction::Download => Msg::Download,
            RowAction::Copy => Msg::Copy,
            RowAction::Move => Msg::Move,
            RowAction::Rename => Msg::Rename,
            RowAction::Delete => Msg::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub id: Option<NodeId>,
    /// Directories get a trailing `/`.
    pub label: String,
    pub is_dir: bool,
    pub size: String,
    pub updated: String,
    /// Open for directories, Download for files; always `actions[0]`.
    pub actions: Vec<RowAction>,
}

impl ListingRow {
    pub fn primary(&self) -> RowAction {
        self.actions[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingView {
    pub path: String,
    pub crumb: String,
    pub rows: Vec<ListingRow>,
    /// Set when the directory has no children.
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerEntry {
    pub id: Option<NodeId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerView {
    pub title: String,
    /// `"<path> (#<id>)"` of the viewed folder.
    pub location: String,
    /// Directory children only.
    pub entries: Vec<PickerEntry>,
    pub candidate: String,
    /// Shown instead of entries: "no subfolders" hint or an inline error.
    pub notice: Option<String>,
}

/// Human size with one decimal, `-` when unknown.
pub fn format_size(size: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let Some(n) = size else {
        return "-".to_string();
    };
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

pub fn format_timestamp(ts: Option<&DateTime<FixedOffset>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

fn id_label(id: Option<NodeId>) -> String {
    id.map(|id| format!("#{}", id)).unwrap_or_else(|| "#-".to_string())
}

pub fn render_listing(node: &Node, messages: &dyn Translate) -> ListingView {
    let crumb = format!("{} {}", node.display_name(), id_label(node.id));
    let children = node.children();
    let rows: Vec<ListingRow> = children.iter().map(render_row).collect();
    let empty_message = rows.is_empty().then(|| messages.translate(Msg::EmptyDirectory));
    ListingView { path: node.display_path(), crumb, rows, empty_message }
}

fn render_row(child: &Node) -> ListingRow {
    let (label, primary, size) = if child.is_dir {
        (format!("{}/", child.name), RowAction::Open, "-".to_string())
    } else {
        // zero-byte files show "-" like unknown sizes
        (child.name.clone(), RowAction::Download, format_size(child.size.filter(|s| *s > 0)))
    };
    ListingRow {
        id: child.id,
        label,
        is_dir: child.is_dir,
        size,
        updated: format_timestamp(child.updated_at.as_ref()),
        actions: vec![primary, RowAction::Copy, RowAction::Move, RowAction::Rename, RowAction::Delete],
    }
}

pub fn render_picker(
    title: &str,
    node: Option<&Node>,
    candidate: Option<NodeId>,
    error: Option<&str>,
    messages: &dyn Translate,
) -> PickerView {
    let location = node
        .map(|n| {
            let path = n.path.clone().filter(|p| !p.is_empty()).unwrap_or_else(|| n.display_name().to_string());
            format!("{} ({})", path, id_label(n.id))
        })
        .unwrap_or_default();
    let entries: Vec<PickerEntry> = node
        .map(|n| n.child_dirs().map(|c| PickerEntry { id: c.id, name: c.name.clone() }).collect())
        .unwrap_or_default();
    let candidate = candidate
        .map(|id| id.to_string())
        .unwrap_or_else(|| messages.translate(Msg::NothingSelected));
    let notice = match error {
        Some(err) => Some(format!("{}: {}", messages.translate(Msg::ErrorPrefix), err)),
        None if entries.is_empty() => Some(messages.translate(Msg::NoSubfolders)),
        None => None,
    };
    PickerView { title: title.to_string(), location, entries, candidate, notice }
}
