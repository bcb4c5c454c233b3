//! Pricer core: glues the recognition engine to the price store.
//!
//! The GUI shell, global hotkeys, screen capture, and overlay rendering live
//! outside this crate; callers hand in captured pixel buffers and render the
//! returned overlay text and hints.

pub mod config;
pub mod format;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{InventoryHint, ItemCheck, ItemReading, Pricer};
