//! User-facing message lookup.
//!
//! The core never hard-codes text; it asks a [`Translate`] implementation for
//! a [`Msg`]. Two catalogs ship with the crate.

use std::fmt;
use std::str::FromStr;

/// Keys for every user-facing string the core emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Msg {
    // listing
    EmptyDirectory,
    ErrorPrefix,
    Open,
    Download,
    Copy,
    Move,
    Rename,
    Delete,
    // picker
    NoSubfolders,
    NothingSelected,
    SelectTargetFolder,
    CopyDestinationTitle,
    MoveDestinationTitle,
    OperationFailed,
    // transfer
    SourceUnavailable,
    OverwritePrompt,
    Copied,
    Moved,
    CopyFailed,
    MoveFailed,
    // actions
    EnterFolderName,
    FolderCreated,
    CreateFolderFailed,
    SelectFileToUpload,
    Uploaded,
    UploadFailed,
    EnterNewName,
    Renamed,
    RenameFailed,
    DeleteConfirm,
    Deleted,
    DeleteFailed,
    DownloadFailed,
}

/// The message-lookup capability the core is parameterized by.
pub trait Translate: Send + Sync {
    fn translate(&self, key: Msg) -> String;

    /// `"<message>: <detail>"`, the shape of every status line and alert that
    /// carries a name or an error.
    fn with_detail(&self, key: Msg, detail: &dyn fmt::Display) -> String {
        format!("{}: {}", self.translate(key), detail)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Ok(Locale::En),
            "ja" | "ja-jp" | "ja_jp" => Ok(Locale::Ja),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Built-in static catalog for one locale.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl Translate for Catalog {
    fn translate(&self, key: Msg) -> String {
        match self.locale {
            Locale::En => english(key),
            Locale::Ja => japanese(key),
        }
        .to_string()
    }
}

fn english(key: Msg) -> &'static str {
    match key {
        Msg::EmptyDirectory => "Directory is empty",
        Msg::ErrorPrefix => "Error",
        Msg::Open => "Open",
        Msg::Download => "Download",
        Msg::Copy => "Copy",
        Msg::Move => "Move",
        Msg::Rename => "Rename",
        Msg::Delete => "Delete",
        Msg::NoSubfolders => "No folders here. This location will be selected",
        Msg::NothingSelected => "(none)",
        Msg::SelectTargetFolder => "Please select a target folder",
        Msg::CopyDestinationTitle => "Select copy destination",
        Msg::MoveDestinationTitle => "Select move destination",
        Msg::OperationFailed => "Operation failed",
        Msg::SourceUnavailable => "Cannot read source",
        Msg::OverwritePrompt => "An item with the same name exists in the destination. Overwrite?",
        Msg::Copied => "Copied",
        Msg::Moved => "Moved",
        Msg::CopyFailed => "Copy failed",
        Msg::MoveFailed => "Move failed",
        Msg::EnterFolderName => "Please enter a folder name",
        Msg::FolderCreated => "Created",
        Msg::CreateFolderFailed => "Folder creation failed",
        Msg::SelectFileToUpload => "Please select a file to upload",
        Msg::Uploaded => "Upload succeeded",
        Msg::UploadFailed => "Upload failed",
        Msg::EnterNewName => "Please enter a new name",
        Msg::Renamed => "Renamed",
        Msg::RenameFailed => "Rename failed",
        Msg::DeleteConfirm => "Really delete?",
        Msg::Deleted => "Deleted",
        Msg::DeleteFailed => "Delete failed",
        Msg::DownloadFailed => "Download failed",
    }
}

fn japanese(key: Msg) -> &'static str {
    match key {
        Msg::EmptyDirectory => "フォルダは空です",
        Msg::ErrorPrefix => "エラー",
        Msg::Open => "開く",
        Msg::Download => "ダウンロード",
        Msg::Copy => "コピー",
        Msg::Move => "移動",
        Msg::Rename => "名前を変更",
        Msg::Delete => "削除",
        Msg::NoSubfolders => "フォルダがありません。この場所が選択されます",
        Msg::NothingSelected => "(なし)",
        Msg::SelectTargetFolder => "対象フォルダを選択してください",
        Msg::CopyDestinationTitle => "コピー先フォルダを選択",
        Msg::MoveDestinationTitle => "移動先フォルダを選択",
        Msg::OperationFailed => "操作に失敗しました",
        Msg::SourceUnavailable => "ソース情報を取得できません",
        Msg::OverwritePrompt => "宛先フォルダに同じ名前の項目があります。上書きしますか？",
        Msg::Copied => "コピーされました",
        Msg::Moved => "移動しました",
        Msg::CopyFailed => "コピー失敗",
        Msg::MoveFailed => "移動失敗",
        Msg::EnterFolderName => "名前を入力してください",
        Msg::FolderCreated => "作成成功",
        Msg::CreateFolderFailed => "フォルダ作成失敗",
        Msg::SelectFileToUpload => "アップロードするファイルを選択してください",
        Msg::Uploaded => "アップロード成功",
        Msg::UploadFailed => "アップロード失敗",
        Msg::EnterNewName => "新しい名前を入力してください",
        Msg::Renamed => "名前が変更されました",
        Msg::RenameFailed => "名前の変更に失敗しました",
        Msg::DeleteConfirm => "本当に削除しますか？",
        Msg::Deleted => "削除されました",
        Msg::DeleteFailed => "削除失敗",
        Msg::DownloadFailed => "ダウンロード失敗",
    }
}
