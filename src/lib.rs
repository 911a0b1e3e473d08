//! agentree: hierarchical, delegating LLM agents.
//!
//! A tree of [`agent::Agent`]s is declared up front and validated as a whole.
//! Sub-agents are exposed to their parents as tools through
//! [`tools::AgentTool`], so a parent delegates simply by calling a function.
//! A [`agent_loop::Runner`] turns one user query into a lazy stream of
//! [`agent_loop::Event`]s, and [`driver`] reduces that stream to the single
//! answer shown to the user.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentree::prelude::*;
//!
//! # async fn example() -> agentree::error::Result<()> {
//! let config = AgentreeConfig::from_env();
//! let topology = agentree::report::report_topology(&config)?;
//!
//! let sessions = Arc::new(InMemorySessionService::new());
//! sessions
//!     .create_session(&config.app_name, &config.user_id, Some(&config.session_id))
//!     .await?;
//!
//! let runner = AgentRunner::new(
//!     config.app_name.clone(),
//!     Arc::clone(topology.root()),
//!     sessions,
//!     Arc::new(GoogleProvider::new(&config)?),
//!     &config,
//! );
//! let mut out = std::io::stdout();
//! call_agent(&runner, &config.user_id, &config.session_id, "Write a report on: tides", &mut out)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod report;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
