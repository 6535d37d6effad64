use clap::Parser;
use trip_planner::adapters::AgentDiscovery;
use trip_planner::utils::logger;
use trip_planner::PlannerConfig;

#[derive(Debug, Parser)]
#[command(name = "discover-agents")]
#[command(about = "Fetch agent cards and print the capabilities they publish")]
struct DiscoverArgs {
    #[arg(long, short = 'c')]
    config: Option<std::path::PathBuf>,

    /// 額外的代理位址 (可重複)
    #[arg(long = "agent")]
    agents: Vec<String>,

    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = DiscoverArgs::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::default(),
    };
    let agents = if args.agents.is_empty() {
        config.discovery.agents.clone()
    } else {
        args.agents
    };

    let cards = AgentDiscovery::new(reqwest::Client::new(), agents)
        .with_card_timeout(config.card_timeout())
        .discover()
        .await;

    if cards.is_empty() {
        println!("No agents discovered.");
        return Ok(());
    }

    println!("{:<24} {:<20} {:<32} URL", "AGENT", "CAPABILITY", "NAME");
    for card in &cards {
        for capability in &card.capabilities {
            println!(
                "{:<24} {:<20} {:<32} {}{}",
                card.agent_id,
                capability.capability_id,
                card.name(),
                card.endpoint_url.trim_end_matches('/'),
                capability.resolved_path()
            );
        }
    }
    Ok(())
}
