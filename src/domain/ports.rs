use crate::domain::intent::TripIntent;
use crate::domain::model::ServiceKind;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 已解析的遠端能力，可被並行呼叫
#[async_trait]
pub trait CapabilityHandle: Send + Sync {
    async fn invoke(&self, payload: &serde_json::Value) -> Result<serde_json::Value>;

    fn describe(&self) -> String {
        "in-process capability".to_string()
    }
}

/// 自然語言 → 結構化意圖
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, query: &str) -> Result<TripIntent>;
}

pub trait ConfigProvider: Send + Sync {
    fn default_call_timeout(&self) -> Duration;
    fn call_timeout(&self, service: ServiceKind) -> Option<Duration>;
    fn request_deadline(&self) -> Option<Duration>;
    fn search_before_book(&self) -> bool;
    fn search_timeout_retries(&self, service: ServiceKind) -> u32;
}
