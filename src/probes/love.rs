//! Love2D directory probe.
//!
//! A `conf.lua` is the Love2D configuration convention, so its
//! containing directory is launchable with the `love` runtime as-is.
//! The candidate's path is the directory, not the file.

use crate::types::{Candidate, Flavor};

/// Classify the directory holding a `conf.lua` as a Love2D game.
///
/// `dir` may be empty for a top-level `conf.lua`; the sniffer's wrapper
/// then falls back to the file's own name.
pub fn probe(dir: &str) -> Option<Candidate> {
    Some(Candidate::new(Flavor::Love).with_path(dir))
}
