//! Integration and unit tests for the NetFS client.
//!
//! Most modules drive the real `reqwest` transport against an in-memory
//! storage service served by axum on an ephemeral port (see [`support`]).
//!
//! ## Test Modules
//!
//! - **navigation_tests**: main view open/up/home and inline errors
//! - **picker_tests**: folder picker position, candidate and completion
//! - **transfer_tests**: copy/move conflict detection and overwrite prompt
//! - **upload_tests**: upload with progress stream, guard and dismissal
//! - **actions_tests**: create folder, rename, delete, download
//! - **config_tests**: configuration loading and validation
//! - **error_tests**: error taxonomy and input validation
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test
//! cargo test upload_tests
//! ```

pub mod support;
