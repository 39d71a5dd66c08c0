//! Ahrefs CLI Core Library
//!
//! Shared constants, response models and the render shape used by the
//! `ahrefs` command line client.

pub mod api;
pub mod models;
pub mod shape;

// Re-export commonly used types
pub use api::*;
pub use shape::{Field, Node, Shape, WireName};
