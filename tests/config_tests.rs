//! Tests for loading configuration and topologies from disk.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use pretty_assertions::assert_eq;

use agentree::agent::Topology;
use agentree::config::{AgentreeConfig, API_KEY_ENV_VARS, BASE_URL_ENV_VAR};
use agentree::error::{AgentreeError, ErrorCategory};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn config_env_vars() -> Vec<&'static str> {
    let mut vars = API_KEY_ENV_VARS.to_vec();
    vars.push(BASE_URL_ENV_VAR);
    vars
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_reads_file_then_env() {
    let _lock = env_lock_guard();
    let vars = config_env_vars();
    let _guard = EnvGuard::capture(&vars);
    for var in &vars {
        std::env::remove_var(var);
    }
    std::env::set_var("GEMINI_API_KEY", "from-env");

    let file = write_temp(
        r#"
        app_name = "research_app"
        user_id = "alice"
        session_id = "morning"
        max_delegation_depth = 3
        "#,
    );
    let config = AgentreeConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.app_name, "research_app");
    assert_eq!(config.user_id, "alice");
    assert_eq!(config.session_id, "morning");
    assert_eq!(config.max_delegation_depth, 3);
    assert_eq!(config.api_key.as_deref(), Some("from-env"));
    assert!(config.has_credentials());
}

#[test]
fn env_base_url_overrides_file() {
    let _lock = env_lock_guard();
    let vars = config_env_vars();
    let _guard = EnvGuard::capture(&vars);
    for var in &vars {
        std::env::remove_var(var);
    }
    std::env::set_var(BASE_URL_ENV_VAR, "http://localhost:9999/v1beta");

    let file = write_temp(r#"base_url = "https://example.invalid/v1beta""#);
    let config = AgentreeConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.base_url, "http://localhost:9999/v1beta");
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let file = write_temp("max_turns = \"many\"");
    let err = AgentreeConfig::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, AgentreeError::Toml(_)));
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.category().is_setup());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AgentreeConfig::from_toml_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AgentreeError::Io(_)));
}

#[test]
fn topology_file_builds_tree() {
    let file = write_temp(
        r#"
        root = "Editor"

        [[agents]]
        name = "Researcher"
        model = "gemini-2.0-flash"
        description = "Looks things up."
        tools = ["google_search"]

        [[agents]]
        name = "Editor"
        model = "gemini-2.0-flash"
        instruction = "Edit the draft."
        tools = ["Researcher"]
        "#,
    );
    let topology = Topology::from_toml_file(file.path()).unwrap();

    assert_eq!(topology.root().name(), "Editor");
    assert_eq!(topology.root().instruction(), "Edit the draft.");
    assert_eq!(
        topology.delegation_edges(),
        vec![
            ("Researcher".to_string(), "google_search".to_string()),
            ("Editor".to_string(), "Researcher".to_string()),
        ]
    );
}

#[test]
fn cyclic_topology_file_is_rejected() {
    let file = write_temp(
        r#"
        root = "A"

        [[agents]]
        name = "A"
        model = "m"
        tools = ["B"]

        [[agents]]
        name = "B"
        model = "m"
        tools = ["A"]
        "#,
    );
    let err = Topology::from_toml_file(file.path()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("delegation cycle"), "{err}");
}
