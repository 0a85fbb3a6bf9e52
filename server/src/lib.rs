//! The analytics backend's library surface: configuration, import adapter
//! seam, persistence, the five-stage pipeline, and the typed API layer
//! standing in for the external HTTP shell. `main.rs` is a thin CLI
//! wrapper around this crate, keeping it thin over `api`/`pipeline`/
//! `persistence` rather than growing its own logic.

pub mod api;
pub mod config;
pub mod import;
pub mod persistence;
pub mod pipeline;
