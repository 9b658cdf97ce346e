//! Core module - Shared data structures and utilities
//!
//! This module provides:
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Page and script reading
//! - Common utilities (hashing, page discovery)

pub mod file_reader;
pub mod model;
pub mod render;
pub mod util;
