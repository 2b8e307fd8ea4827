// src/pipeline/mod.rs
// =============================================================================
// The concurrent fetch pipeline.
//
// Submodules:
// - pool: producer/consumer worker pool over the disallowed entries
// - report: per-entry outcomes and the summary handed back to the caller
// =============================================================================

mod pool;
mod report;

pub use pool::Pipeline;
pub use report::ScanReport;
