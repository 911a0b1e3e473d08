//! Agent loop primitives (events, invocations, runners).

pub mod events;
pub mod invocation;
pub mod runner;
pub mod types;

pub use events::*;
pub use runner::*;
pub use types::*;
