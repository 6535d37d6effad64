use crate::core::CapabilityHandle;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// 測試用的能力：固定延遲後回傳預設結果，並記錄收到的 payload
pub(crate) struct ScriptedCapability {
    delay: Duration,
    respond: Responder,
    calls: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<Value>>>,
}

impl ScriptedCapability {
    pub fn from_fn(respond: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            delay: Duration::ZERO,
            respond: Box::new(respond),
            calls: Arc::new(AtomicUsize::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(value: Value) -> Self {
        Self::from_fn(move |_| Ok(value.clone()))
    }

    pub fn confirmed(booking_id: &str) -> Self {
        Self::replying(json!({"bookingId": booking_id, "status": "Confirmed"}))
    }

    pub fn failing(make_error: impl Fn() -> PlannerError + Send + Sync + 'static) -> Self {
        Self::from_fn(move |_| Err(make_error()))
    }

    /// 永遠不會在測試時間內回應
    pub fn hanging() -> Self {
        Self::confirmed("NEVER").with_delay(Duration::from_secs(3600))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn payload_log(&self) -> Arc<Mutex<Vec<Value>>> {
        Arc::clone(&self.payloads)
    }
}

#[async_trait]
impl CapabilityHandle for ScriptedCapability {
    async fn invoke(&self, payload: &Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(payload)
    }

    fn describe(&self) -> String {
        "scripted test capability".to_string()
    }
}
