// src/output/mod.rs
// =============================================================================
// Everything the scan leaves on disk.
//
// Submodules:
// - writer: stores found bodies and the list of reachable URLs
// =============================================================================

mod writer;

pub use writer::{prepare_output_dir, write_success_list, FileWriter, ResourceWriter};
