use crate::config::PlannerConfig;
use crate::domain::intent::{TripIntent, TripRequest};
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "trip-planner")]
#[command(about = "Plan a trip by booking flights, hotels and rental cars through specialist agents")]
pub struct CliConfig {
    /// TOML 設定檔；未指定時使用預設值
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'q', help = "Natural language travel request")]
    pub query: Option<String>,

    #[arg(long, help = "Pre-parsed trip intent as JSON")]
    pub intent_json: Option<String>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Overall request deadline in milliseconds")]
    pub deadline_ms: Option<u64>,

    #[arg(long, help = "Book directly without the search phase")]
    pub no_search: bool,
}

impl CliConfig {
    /// 載入設定檔並套用命令列覆寫
    pub fn load_planner_config(&self) -> Result<PlannerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📄 Loading config from {}", path.display());
                PlannerConfig::from_file(path)?
            }
            None => PlannerConfig::default(),
        };

        if let Some(deadline) = self.deadline_ms {
            config.dispatch.request_deadline_ms = Some(deadline);
        }
        if self.no_search {
            config.search.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn trip_request(&self) -> Result<TripRequest> {
        match (&self.query, &self.intent_json) {
            (_, Some(json)) => {
                let intent: TripIntent = serde_json::from_str(json)?;
                Ok(TripRequest::Parsed(intent))
            }
            (Some(query), None) => Ok(TripRequest::Text(query.clone())),
            (None, None) => Err(PlannerError::MissingConfigError {
                field: "--query or --intent-json".to_string(),
            }),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match (&self.query, &self.intent_json) {
            (Some(_), Some(_)) => {
                return Err(PlannerError::ConfigError {
                    message: "use either --query or --intent-json, not both".to_string(),
                })
            }
            (None, None) => {
                return Err(PlannerError::MissingConfigError {
                    field: "--query or --intent-json".to_string(),
                })
            }
            (Some(query), None) => validation::validate_non_empty_string("query", query)?,
            (None, Some(json)) => validation::validate_non_empty_string("intent_json", json)?,
        }

        if let Some(deadline) = self.deadline_ms {
            validation::validate_positive_number("deadline_ms", deadline, 1)?;
        }
        Ok(())
    }
}
