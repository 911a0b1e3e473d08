//! agentree binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use agentree::agent::{InMemorySessionService, SessionService, Topology};
use agentree::agent_loop::AgentRunner;
use agentree::cli::Cli;
use agentree::config::AgentreeConfig;
use agentree::driver::run_conversation;
use agentree::error::Result;
use agentree::provider::GoogleProvider;
use agentree::report::report_topology;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Setup errors are returned; conversation errors are reported by the driver.
async fn run(cli: Cli) -> Result<()> {
    let mut config = AgentreeConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let topology = match &cli.topology {
        Some(path) => Topology::from_toml_file(path)?,
        None => report_topology(&config)?,
    };

    if cli.print_topology {
        for (parent, capability) in topology.delegation_edges() {
            println!("{parent} -> {capability}");
        }
        return Ok(());
    }

    let root = Arc::clone(topology.root());
    println!(
        "Agent setup complete. API key {}.",
        if config.has_credentials() { "configured" } else { "missing" }
    );
    println!("Root agent: {}", root.name());

    let sessions = Arc::new(InMemorySessionService::new());
    sessions
        .create_session(&config.app_name, &config.user_id, Some(&config.session_id))
        .await?;
    println!(
        "Session created: App='{}', User='{}', Session='{}'",
        config.app_name, config.user_id, config.session_id
    );

    let provider = Arc::new(GoogleProvider::new(&config)?);
    let runner = AgentRunner::new(
        config.app_name.clone(),
        root,
        sessions,
        provider,
        &config,
    );
    println!("Runner created for agent '{}'.", runner.agent().name());

    println!(
        "\nStarting asynchronous conversation with the {} agent...",
        runner.agent().name()
    );
    let mut stdout = std::io::stdout();
    run_conversation(
        &runner,
        &config.user_id,
        &config.session_id,
        &cli.queries(),
        &mut stdout,
    )
    .await;

    println!("\nProcess finished.");
    Ok(())
}
