// src/robots/mod.rs
// =============================================================================
// robots.txt handling.
//
// Submodules:
// - parser: extracts the Disallow entries and resolves them to absolute URLs
// =============================================================================

mod parser;

pub use parser::RobotsParser;
