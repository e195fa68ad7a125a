//! Relay API server
//!
//! Serves agent answers to web clients as framed HTML fragments over a
//! single chunked HTTP response.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use relay_common::{RelayConfig, defaults};
use relay_stream::{HtmlRenderer, LogCompletion, ScriptedRuntime};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod api;

/// Command-line arguments for the Relay API server
#[derive(Parser, Debug)]
#[clap(name = "relay-api", about = "Framed streaming chat server")]
struct Args {
    /// Path to the TOML configuration file
    #[clap(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// Host to bind to (overrides the config file)
    #[clap(long)]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[clap(short, long)]
    port: Option<u16>,

    /// JSON file with additional scripted scenarios
    #[clap(long)]
    scenarios: Option<PathBuf>,

    /// Delay between scripted chunks in milliseconds
    #[clap(long)]
    chunk_delay_ms: Option<u64>,

    /// List available scripted scenarios and exit
    #[clap(long)]
    list_scenarios: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut RelayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.scenarios {
            config.stream.scenario_file = Some(path.clone());
        }
        if let Some(delay) = self.chunk_delay_ms {
            config.stream.scripted_chunk_delay_ms = delay;
        }
    }
}

fn build_runtime(config: &RelayConfig) -> Result<ScriptedRuntime> {
    let delay = Duration::from_millis(config.stream.scripted_chunk_delay_ms);
    let mut runtime = ScriptedRuntime::builtin(delay);
    if let Some(path) = &config.stream.scenario_file {
        runtime = runtime.with_scenarios(ScriptedRuntime::load_scenarios(path)?);
    }
    Ok(runtime)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = RelayConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {:?}", args.config))?;
    args.apply_overrides(&mut config);

    // Setup tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = build_runtime(&config)?;

    if args.list_scenarios {
        println!("Available scenarios (send \"/<id>\" as the message):");
        for scenario in runtime.scenarios() {
            println!("  {:<16} {}", scenario.id, scenario.description);
        }
        return Ok(());
    }

    info!("Starting Relay API server...");
    info!("Scenarios: {}", runtime.scenarios().len());
    info!("Markdown rendering: {}", config.render.markdown);

    let state = api::brain::BrainState {
        runtime: Arc::new(runtime),
        renderer: Arc::new(HtmlRenderer::from_config(&config.render)),
        completion: Arc::new(LogCompletion),
        default_target_id: defaults::DEFAULT_TARGET_ID.to_string(),
        channel_capacity: config.stream.channel_capacity,
    };

    let app = Router::new()
        .merge(api::brain::brain_routes(Arc::new(state)))
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = config.server.bind_address();
    info!("Binding to address: {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
