//! The presentation seam.
//!
//! Coordinators never print or draw; they push everything through [`Ui`].
//! Implementations use interior mutability, since the core only holds shared
//! references.

use std::sync::Arc;

use crate::i18n::{Msg, Translate};
use crate::view::{ListingView, PickerView};

pub trait Ui: Send + Sync {
    /// Replace the main list with a rendered listing.
    fn show_listing(&self, view: &ListingView);
    /// Replace the main list with an inline error banner.
    fn show_error(&self, message: &str);
    /// Non-blocking status line.
    fn set_status(&self, message: &str);
    /// Blocking notice for failed actions.
    fn alert(&self, message: &str);
    /// Yes/no question. `false` means declined.
    fn confirm(&self, message: &str) -> bool;
    /// Render the folder picker modal.
    fn show_picker(&self, view: &PickerView);
    /// Upload progress in percent.
    fn show_progress(&self, percent: u8);
    /// Enable or disable the controls of the open modal.
    fn set_controls_enabled(&self, enabled: bool);
    /// Close whatever modal is open.
    fn close_modal(&self);
}

/// A UI plus the message catalog it speaks. Cheap to clone.
#[derive(Clone)]
pub struct Surface {
    pub ui: Arc<dyn Ui>,
    pub messages: Arc<dyn Translate>,
}

impl Surface {
    pub fn new(ui: Arc<dyn Ui>, messages: Arc<dyn Translate>) -> Self {
        Self { ui, messages }
    }

    pub fn tr(&self, key: Msg) -> String {
        self.messages.translate(key)
    }

    pub fn status(&self, key: Msg, detail: &dyn std::fmt::Display) {
        self.ui.set_status(&self.messages.with_detail(key, detail));
    }

    pub fn alert(&self, key: Msg, detail: &dyn std::fmt::Display) {
        self.ui.alert(&self.messages.with_detail(key, detail));
    }
}
