//! Utility modules for the document pipeline.

pub mod fs;
pub mod log;
pub mod tool;
