//! The report-writing agent tree.
//!
//! ```text
//! ReportWriter
//! ├── SearchPlanner
//! └── SearchAssistant
//!     ├── WebSearch ── google_search
//!     └── Summarizer
//! ```

use crate::agent::{AgentSpec, Topology, TopologyBuilder};
use crate::config::AgentreeConfig;
use crate::error::Result;
use crate::provider::google::GOOGLE_SEARCH;

pub const ROOT_AGENT: &str = "ReportWriter";
pub const DEFAULT_TOPIC: &str = "The ethics of gene editing technologies.";

/// The query sent to the root agent for `topic`.
pub fn report_query(topic: &str) -> String {
    format!("Write a report on: {topic}")
}

/// Agent specs for the report writer, leaves first.
///
/// Every agent uses `config.default_model` except the planner, which uses
/// `config.planner_model`.
pub fn report_specs(config: &AgentreeConfig) -> Vec<AgentSpec> {
    let model = config.default_model.as_str();
    vec![
        AgentSpec::builder()
            .name("WebSearch")
            .model(model)
            .description("Performs web searches on the web for facts.")
            .tools(vec![GOOGLE_SEARCH.to_string()])
            .build(),
        AgentSpec::builder()
            .name("Summarizer")
            .model(model)
            .description("Summarizes text obtained from web searches.")
            .build(),
        AgentSpec::builder()
            .name("SearchAssistant")
            .model(model)
            .instruction(
                "You are a helpful assistant. Answer user questions using Google Search when needed.",
            )
            .description(
                "Finds and summarizes information on a topic, Use the Websearch tool to search \
                 the web and the Summarizer tool to summarize text obtained from web searches.",
            )
            .tools(vec!["WebSearch".to_string(), "Summarizer".to_string()])
            .build(),
        AgentSpec::builder()
            .name("SearchPlanner")
            .model(config.planner_model.as_str())
            .instruction("You are a helpful assistant. You will plan a search strategy.")
            .description(
                "Plans a search strategy. Use the SearchAssistant to find and summarize information.",
            )
            .build(),
        AgentSpec::builder()
            .name(ROOT_AGENT)
            .model(model)
            .instruction(
                "You are a helpful assistant. You will write a report on topic X. Use the \
                 SearchPlanner to plan and refine the search strategy. Use the SearchAssistant \
                 to find and summarize information based on the search strategy. Output *only* \
                 the final report.",
            )
            .description("Writes a report based on information gathered from the SearchPlanner.")
            .tools(vec!["SearchPlanner".to_string(), "SearchAssistant".to_string()])
            .build(),
    ]
}

/// Validate and build the report writer tree.
pub fn report_topology(config: &AgentreeConfig) -> Result<Topology> {
    report_specs(config)
        .into_iter()
        .fold(TopologyBuilder::with_builtin_tools(), TopologyBuilder::agent)
        .build(ROOT_AGENT)
}
