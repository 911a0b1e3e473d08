//! Core types for agentree.

pub mod content;
pub mod generation;

pub use content::*;
pub use generation::*;
