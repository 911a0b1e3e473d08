//! Agents, their topology, and session storage.

pub mod agent;
pub mod session;
pub mod topology;

pub use agent::Agent;
pub use session::{InMemorySessionService, Session, SessionKey, SessionService};
pub use topology::{AgentSpec, Topology, TopologyBuilder, TopologyFile};
