//! Utility functions for display formatting.

pub mod format;
