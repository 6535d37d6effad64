// Adapters layer: concrete implementations of the domain ports (HTTP agents, interpreters, discovery)

pub mod discovery;
pub mod http_capability;
pub mod keyword_interpreter;
pub mod llm_interpreter;

use crate::config::toml_config::{InterpreterKind, PlannerConfig};
use crate::core::Interpreter;
use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Arc;

pub use discovery::{build_registry, AgentDiscovery};
pub use http_capability::HttpCapability;
pub use keyword_interpreter::KeywordInterpreter;
pub use llm_interpreter::LlmInterpreter;

/// 依設定建立解析器
pub fn build_interpreter(config: &PlannerConfig, client: &Client) -> Result<Arc<dyn Interpreter>> {
    match config.interpreter.kind {
        InterpreterKind::Keyword => {
            tracing::info!("🧩 Using keyword interpreter");
            Ok(Arc::new(KeywordInterpreter::new()?))
        }
        InterpreterKind::Llm => {
            tracing::info!(
                "🤖 Using LLM interpreter ({} at {})",
                config.interpreter.llm_model,
                config.interpreter.llm_endpoint
            );
            Ok(Arc::new(
                LlmInterpreter::new(
                    client.clone(),
                    &config.interpreter.llm_endpoint,
                    config.interpreter.llm_model.clone(),
                )
                .with_timeout(config.llm_timeout()),
            ))
        }
    }
}
