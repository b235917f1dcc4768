//! Application layer - use cases and orchestration.
//!
//! This layer contains the export engine, message rendering
//! and session listing.

pub mod exporter;
pub mod formatter;
pub mod listing;

pub use exporter::{ExportCompletion, Exporter};
pub use listing::{format_sessions_table, list_sessions};
