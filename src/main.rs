use clap::Parser;
use std::sync::Arc;
use trip_planner::adapters::{build_interpreter, build_registry};
use trip_planner::app::response::TripResponse;
use trip_planner::utils::{logger, validation::Validate};
use trip_planner::{CliConfig, OrchestrationEngine, PlannerError, TripStatus};

fn fail(e: &PlannerError) -> ! {
    tracing::error!("❌ {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting trip-planner CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        fail(&e);
    }
    let config = cli.load_planner_config().unwrap_or_else(|e| fail(&e));
    let request = cli.trip_request().unwrap_or_else(|e| fail(&e));

    let client = reqwest::Client::new();
    let interpreter = build_interpreter(&config, &client).unwrap_or_else(|e| fail(&e));
    let registry = Arc::new(build_registry(&config, &client).await);
    let engine = OrchestrationEngine::new(interpreter, registry, config);

    let result = engine.plan_trip(request).await;
    println!("{}", serde_json::to_string_pretty(&TripResponse::from(&result))?);

    // 0: 全部成功, 2: 部分成功, 1: 失敗
    let exit_code = match result.status {
        TripStatus::Success => 0,
        TripStatus::PartialSuccess => 2,
        TripStatus::Failure => 1,
    };
    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
