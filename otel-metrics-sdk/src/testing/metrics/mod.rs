//! In-Memory metrics exporter for testing purpose.

/// The `in_memory_exporter` module provides in-memory metrics functionalities.
/// For detailed usage and examples, see `in_memory_exporter`.
pub mod in_memory_exporter;
pub use in_memory_exporter::{ExportedRecord, InMemoryExporter, InMemoryExporterBuilder};
