//! # NetFS Client Library
//!
//! Client side of the NetFS hierarchical file store: browse a tree of folders
//! and files, pick destinations, and copy, move, upload, rename, delete and
//! download nodes over the service's HTTP API.
//!
//! ## Architecture
//!
//! The client is built using:
//! - **Reqwest**: HTTP transport, multipart uploads and the SSE progress stream
//! - **Tokio**: single-threaded cooperative runtime; every request is an await point
//! - **Serde**: JSON wire types
//! - **Tracing**: structured logging of every request and action
//!
//! ## Core Components
//!
//! - [`api`]: `StorageApi` transport seam and its HTTP implementation
//! - [`navigation`]: main view position (open, up, home)
//! - [`picker`]: modal folder picker with its own position and candidate
//! - [`transfer`]: copy/move workflow with conflict detection and overwrite prompt
//! - [`upload`]: upload with a correlated progress stream
//! - [`actions`]: create folder, rename, delete, download
//! - [`view`]: pure rendering of listings and picker views
//! - [`ui`]: presentation trait the core reports to
//! - [`i18n`]: message catalogs
//! - [`session`]: wires the above over one transport and one UI
//! - [`config`]: layered configuration
//! - [`error`]: error taxonomy

pub mod actions;
pub mod api;
pub mod config;
pub mod error;
pub mod i18n;
pub mod navigation;
pub mod picker;
pub mod session;
pub mod transfer;
pub mod types;
pub mod ui;
pub mod upload;
pub mod view;

#[cfg(test)]
mod tests;
