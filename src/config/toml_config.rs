use crate::core::ConfigProvider;
use crate::domain::agent_card::CapabilityDescriptor;
use crate::domain::model::ServiceKind;
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_AGENT_URLS: [&str; 3] = [
    "http://127.0.0.1:5001",
    "http://127.0.0.1:5002",
    "http://127.0.0.1:5003",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub planner: PlannerInfo,
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub interpreter: InterpreterConfig,
    pub discovery: DiscoveryConfig,
    pub capabilities: Vec<CapabilityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerInfo {
    pub name: String,
    pub version: String,
}

impl Default for PlannerInfo {
    fn default() -> Self {
        Self {
            name: "TripMaster AI Planner".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// 對外公布於 agent card 的位址
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            public_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub default_timeout_ms: u64,
    pub request_deadline_ms: Option<u64>,
    pub timeouts_ms: ServiceTimeouts,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            request_deadline_ms: None,
            timeouts_ms: ServiceTimeouts::default(),
        }
    }
}

/// 各服務個別的呼叫逾時 (毫秒)，未設定時使用 default_timeout_ms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTimeouts {
    pub flight: Option<u64>,
    pub hotel: Option<u64>,
    pub car_rental: Option<u64>,
}

impl ServiceTimeouts {
    pub fn for_service(&self, kind: ServiceKind) -> Option<u64> {
        match kind {
            ServiceKind::Flight => self.flight,
            ServiceKind::Hotel => self.hotel,
            ServiceKind::CarRental => self.car_rental,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// 搜尋逾時的重試次數
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub flight: u32,
    pub hotel: u32,
    pub car_rental: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            flight: 1,
            hotel: 0,
            car_rental: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterKind {
    #[default]
    Keyword,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub kind: InterpreterKind,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_timeout_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            kind: InterpreterKind::Keyword,
            llm_endpoint: "http://127.0.0.1:11434".to_string(),
            llm_model: "llama3:8b".to_string(),
            llm_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub agents: Vec<String>,
    pub card_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            agents: DEFAULT_AGENT_URLS.iter().map(|url| url.to_string()).collect(),
            card_timeout_ms: 5_000,
        }
    }
}

/// 不經探索、直接指定的能力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityEntry {
    pub capability_id: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl CapabilityEntry {
    pub fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            capability_id: self.capability_id.clone(),
            description: String::new(),
            path: self.path.clone(),
        }
    }
}

impl PlannerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlannerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FLIGHT_AGENT_URL})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlannerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn card_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery.card_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.interpreter.llm_timeout_ms)
    }
}

impl ConfigProvider for PlannerConfig {
    fn default_call_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.default_timeout_ms)
    }

    fn call_timeout(&self, service: ServiceKind) -> Option<Duration> {
        self.dispatch
            .timeouts_ms
            .for_service(service)
            .map(Duration::from_millis)
    }

    fn request_deadline(&self) -> Option<Duration> {
        self.dispatch.request_deadline_ms.map(Duration::from_millis)
    }

    fn search_before_book(&self) -> bool {
        self.search.enabled
    }

    fn search_timeout_retries(&self, service: ServiceKind) -> u32 {
        match service {
            ServiceKind::Flight => self.retry.flight,
            ServiceKind::Hotel => self.retry.hotel,
            ServiceKind::CarRental => self.retry.car_rental,
        }
    }
}

impl Validate for PlannerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("planner.name", &self.planner.name)?;
        validation::validate_non_empty_string("server.bind_address", &self.server.bind_address)?;
        validation::validate_url("server.public_url", &self.server.public_url)?;

        validation::validate_positive_number(
            "dispatch.default_timeout_ms",
            self.dispatch.default_timeout_ms,
            1,
        )?;
        if let Some(deadline) = self.dispatch.request_deadline_ms {
            validation::validate_positive_number("dispatch.request_deadline_ms", deadline, 1)?;
        }
        for kind in ServiceKind::ALL {
            if let Some(timeout) = self.dispatch.timeouts_ms.for_service(kind) {
                validation::validate_positive_number(
                    &format!("dispatch.timeouts_ms ({})", kind),
                    timeout,
                    1,
                )?;
            }
            validation::validate_range(
                &format!("retry ({})", kind),
                self.search_timeout_retries(kind),
                0,
                5,
            )?;
        }

        if self.interpreter.kind == InterpreterKind::Llm {
            validation::validate_url("interpreter.llm_endpoint", &self.interpreter.llm_endpoint)?;
            validation::validate_non_empty_string("interpreter.llm_model", &self.interpreter.llm_model)?;
        }

        validation::validate_positive_number(
            "discovery.card_timeout_ms",
            self.discovery.card_timeout_ms,
            1,
        )?;
        for agent in &self.discovery.agents {
            validation::validate_url("discovery.agents", agent)?;
        }

        for entry in &self.capabilities {
            validation::validate_non_empty_string("capabilities.capability_id", &entry.capability_id)?;
            validation::validate_url("capabilities.endpoint_url", &entry.endpoint_url)?;
            if let Some(path) = &entry.path {
                validation::validate_capability_path("capabilities.path", path)?;
            }
        }

        Ok(())
    }
}
