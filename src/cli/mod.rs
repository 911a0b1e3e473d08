//! Command-line arguments for the agentree binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AgentreeConfig;
use crate::report::{report_query, DEFAULT_TOPIC};

/// Run a tree of delegating agents against a query.
#[derive(Parser, Debug)]
#[command(name = "agentree", version, about = "Run a tree of delegating Gemini agents")]
pub struct Cli {
    /// Report topic; repeat to send several queries over the same session
    #[arg(short, long = "topic", value_name = "TOPIC")]
    pub topics: Vec<String>,

    /// Model for every agent except the planner (report writer only)
    #[arg(short, long, conflicts_with = "topology")]
    pub model: Option<String>,

    /// Model for the SearchPlanner agent (report writer only)
    #[arg(long, conflicts_with = "topology")]
    pub planner_model: Option<String>,

    /// User that owns the session
    #[arg(long)]
    pub user_id: Option<String>,

    /// Session to create and converse in
    #[arg(long)]
    pub session_id: Option<String>,

    /// TOML config file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// TOML agent topology to run instead of the report writer
    #[arg(long)]
    pub topology: Option<PathBuf>,

    /// Model turns allowed per agent invocation
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_turns: Option<u32>,

    /// Print the delegation edges and exit without calling the model
    #[arg(long)]
    pub print_topology: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overlay explicit flags on `config`.
    pub fn apply(&self, config: &mut AgentreeConfig) {
        if let Some(model) = &self.model {
            config.default_model = model.clone();
        }
        if let Some(model) = &self.planner_model {
            config.planner_model = model.clone();
        }
        if let Some(user) = &self.user_id {
            config.user_id = user.clone();
        }
        if let Some(session) = &self.session_id {
            config.session_id = session.clone();
        }
        if let Some(turns) = self.max_turns {
            config.max_turns = turns as usize;
        }
    }

    /// Queries to send, one per topic. Falls back to the default topic.
    pub fn queries(&self) -> Vec<String> {
        if self.topics.is_empty() {
            vec![report_query(DEFAULT_TOPIC)]
        } else {
            self.topics.iter().map(|t| report_query(t)).collect()
        }
    }
}
