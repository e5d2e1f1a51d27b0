//! LSP Protocol Implementation
//!
//! Publishes the structural findings of census files as diagnostics and
//! adds record-level hover, completion and document symbols.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod server;

pub use backend::Backend;
