//! Declarative agent topologies and their validation.
//!
//! Agents are described by [`AgentSpec`]s that name their capabilities.
//! [`TopologyBuilder::build`] checks the whole graph and only then
//! materialises the agents, leaves first, so every [`Agent`] it hands out is
//! part of a valid, acyclic delegation graph.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::agent::{validate_name, Agent};
use crate::error::{AgentreeError, Result};
use crate::tools::{AgentTool, Tool};

/// Declarative description of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct AgentSpec {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub model: String,
    #[serde(default)]
    #[builder(into, default)]
    pub instruction: String,
    #[serde(default)]
    #[builder(into, default)]
    pub description: String,
    /// Names of leaf tools or other agents this agent may call.
    #[serde(default)]
    #[builder(default)]
    pub tools: Vec<String>,
}

/// On-disk form of a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    pub root: String,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
}

/// Collects leaf tools and agent specs, then validates and builds them.
#[derive(Default)]
pub struct TopologyBuilder {
    leaf_tools: Vec<Arc<dyn Tool>>,
    specs: Vec<AgentSpec>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with every built-in leaf tool.
    pub fn with_builtin_tools() -> Self {
        crate::tools::builtin::all_builtin_tools()
            .into_iter()
            .fold(Self::new(), Self::leaf_tool)
    }

    pub fn leaf_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.leaf_tools.push(tool);
        self
    }

    pub fn agent(mut self, spec: AgentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Parse a TOML topology on top of the built-in leaf tools.
    pub fn from_toml_str(raw: &str) -> Result<(Self, String)> {
        let file: TopologyFile = toml::from_str(raw)?;
        let builder = file
            .agents
            .into_iter()
            .fold(Self::with_builtin_tools(), Self::agent);
        Ok((builder, file.root))
    }

    /// Validate everything, then build every agent. `root` picks the entry point.
    pub fn build(self, root: &str) -> Result<Topology> {
        let specs = self.validate()?;
        let leafs: HashMap<&str, &Arc<dyn Tool>> =
            self.leaf_tools.iter().map(|t| (t.name(), t)).collect();

        if !specs.contains_key(root) {
            return Err(AgentreeError::configuration(format!(
                "root agent '{root}' is not defined"
            )));
        }

        let mut built: HashMap<String, Arc<Agent>> = HashMap::new();
        for name in build_order(&specs) {
            let spec = specs[name.as_str()];
            let mut agent = Agent::new(&spec.name, &spec.model)?
                .with_instruction(&spec.instruction)
                .with_description(&spec.description);
            for capability in &spec.tools {
                let tool: Arc<dyn Tool> = match built.get(capability) {
                    Some(sub) => Arc::new(AgentTool::new(sub.clone())),
                    None => Arc::clone(leafs[capability.as_str()]),
                };
                agent = agent.with_capability(tool)?;
            }
            debug!(agent = %spec.name, capabilities = spec.tools.len(), "agent built");
            built.insert(spec.name.clone(), Arc::new(agent));
        }

        let order: Vec<String> = self.specs.iter().map(|s| s.name.clone()).collect();
        let root = built[root].clone();
        Ok(Topology {
            root,
            agents: built,
            order,
        })
    }

    fn validate(&self) -> Result<BTreeMap<&str, &AgentSpec>> {
        let mut seen: HashSet<&str> = HashSet::new();
        for tool in &self.leaf_tools {
            if tool.name().is_empty() {
                return Err(AgentreeError::configuration("leaf tool name must not be empty"));
            }
            if !seen.insert(tool.name()) {
                return Err(AgentreeError::configuration(format!(
                    "duplicate name '{}'",
                    tool.name()
                )));
            }
        }

        let mut specs = BTreeMap::new();
        for spec in &self.specs {
            validate_name(&spec.name)?;
            if spec.model.trim().is_empty() {
                return Err(AgentreeError::configuration(format!(
                    "agent '{}' has no model",
                    spec.name
                )));
            }
            if !seen.insert(&spec.name) {
                return Err(AgentreeError::configuration(format!(
                    "duplicate name '{}'",
                    spec.name
                )));
            }
            specs.insert(spec.name.as_str(), spec);
        }

        for spec in &self.specs {
            let mut listed = HashSet::new();
            for capability in &spec.tools {
                if !seen.contains(capability.as_str()) {
                    return Err(AgentreeError::configuration(format!(
                        "agent '{}' refers to unknown capability '{capability}'",
                        spec.name
                    )));
                }
                if !listed.insert(capability.as_str()) {
                    return Err(AgentreeError::configuration(format!(
                        "agent '{}' lists capability '{capability}' twice",
                        spec.name
                    )));
                }
            }
        }

        if let Some(cycle) = find_cycle(&specs) {
            return Err(AgentreeError::configuration(format!(
                "delegation cycle: {}",
                cycle.join(" -> ")
            )));
        }

        Ok(specs)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// First cycle found by depth-first search, as a closed path (`A -> B -> A`).
fn find_cycle(specs: &BTreeMap<&str, &AgentSpec>) -> Option<Vec<String>> {
    fn visit<'a>(
        name: &'a str,
        specs: &BTreeMap<&str, &'a AgentSpec>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Some(cycle);
            }
            None => {}
        }
        let spec: &'a AgentSpec = *specs.get(name)?;
        marks.insert(name, Mark::Visiting);
        path.push(name);
        for child in &spec.tools {
            // Leaf tools have no outgoing edges.
            if specs.contains_key(child.as_str()) {
                if let Some(cycle) = visit(child.as_str(), specs, marks, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        marks.insert(name, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    specs
        .values()
        .find_map(|spec| visit(spec.name.as_str(), specs, &mut marks, &mut path))
}

/// Post-order over an acyclic spec graph: every agent after its delegates.
fn build_order(specs: &BTreeMap<&str, &AgentSpec>) -> Vec<String> {
    fn visit(
        name: &str,
        specs: &BTreeMap<&str, &AgentSpec>,
        done: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) {
        if done.contains(name) {
            return;
        }
        let Some(spec) = specs.get(name) else {
            return;
        };
        done.insert(name.to_string());
        for child in &spec.tools {
            visit(child, specs, done, order);
        }
        order.push(name.to_string());
    }

    let mut done = HashSet::new();
    let mut order = Vec::new();
    for name in specs.keys() {
        visit(name, specs, &mut done, &mut order);
    }
    order
}

/// A validated set of agents with a designated root.
#[derive(Debug, Clone)]
pub struct Topology {
    root: Arc<Agent>,
    agents: HashMap<String, Arc<Agent>>,
    order: Vec<String>,
}

impl Topology {
    /// Read, validate and build a TOML topology file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let (builder, root) = TopologyBuilder::from_toml_str(&raw)?;
        builder.build(&root)
    }

    pub fn root(&self) -> &Arc<Agent> {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents.get(name)
    }

    /// Agent names in definition order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// `(parent, capability)` pairs in definition order.
    pub fn delegation_edges(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|name| self.agents.get(name))
            .flat_map(|agent| {
                agent
                    .capabilities()
                    .iter()
                    .map(|t| (agent.name().to_string(), t.name().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
