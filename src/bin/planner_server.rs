use clap::Parser;
use std::sync::Arc;
use trip_planner::adapters::{build_interpreter, build_registry};
use trip_planner::app::server::{self, AppState};
use trip_planner::domain::agent_card::AgentCard;
use trip_planner::utils::{logger, validation::Validate};
use trip_planner::{OrchestrationEngine, PlannerConfig};

#[derive(Debug, Parser)]
#[command(name = "planner-server")]
#[command(about = "HTTP front end for the trip planner (POST /planTrip)")]
struct ServerArgs {
    #[arg(long, short = 'c')]
    config: Option<std::path::PathBuf>,

    /// 覆寫設定檔中的 server.bind_address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServerArgs::parse();
    logger::init_server_logger();

    let mut config = match &args.config {
        Some(path) => PlannerConfig::from_file(path).inspect_err(|e| {
            tracing::error!("❌ Failed to load {}: {}", path.display(), e);
        })?,
        None => PlannerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Err(e) = config.validate() {
        tracing::error!("❌ Invalid configuration: {}", e);
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        return Err(e.into());
    }

    let client = reqwest::Client::new();
    let interpreter = build_interpreter(&config, &client)?;
    let registry = Arc::new(build_registry(&config, &client).await);

    let bind_address = config.server.bind_address.clone();
    let agent_card = AgentCard::planner(config.server.public_url.clone());
    let version = config.planner.version.clone();
    let state = Arc::new(AppState {
        engine: OrchestrationEngine::new(interpreter, registry, config),
        agent_card,
        version,
    });

    server::serve(state, &bind_address).await?;
    Ok(())
}
