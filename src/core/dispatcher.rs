use crate::core::registry::CapabilityRegistry;
use crate::core::CapabilityHandle;
use crate::domain::model::{BookingConfirmation, CapabilityCall, OutcomeMap, ServiceKind, ServiceOutcome};
use crate::utils::error::{PlannerError, Result};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// 每個服務一次原始回應 (依呼叫順序)
pub type RawReplies = Vec<(ServiceKind, Result<Value>)>;

enum PendingCall {
    Resolved(Result<Value>),
    Running(JoinHandle<Result<Value>>),
}

/// 並行呼叫遠端能力，每個呼叫獨立逾時、獨立失敗
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    default_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            default_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// 派送並回傳原始 JSON 回應；`deadline` 為整體請求截止時間
    pub async fn dispatch_raw(&self, calls: Vec<CapabilityCall>, deadline: Option<Instant>) -> RawReplies {
        let pending: Vec<(ServiceKind, PendingCall)> = calls
            .into_iter()
            .map(|call| {
                let kind = call.service_kind();
                // 截止時間已過的呼叫一律不發出
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::warn!("⏰ {}: deadline passed, '{}' not invoked", kind, call.capability_id());
                    let skipped = PendingCall::Resolved(Err(PlannerError::DeadlineExceeded {
                        capability_id: call.capability_id().to_string(),
                    }));
                    return (kind, skipped);
                }
                let pending = match self.registry.resolve(kind, call.capability_id()) {
                    Ok(handle) => {
                        let limit = call.timeout().unwrap_or(self.default_timeout);
                        tracing::debug!(
                            "📡 Dispatching '{}' for {} (timeout {:?})",
                            call.capability_id(),
                            kind,
                            limit
                        );
                        PendingCall::Running(tokio::spawn(invoke_with_timeout(
                            handle, call, limit, deadline,
                        )))
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ {}: {}", kind, e);
                        PendingCall::Resolved(Err(e))
                    }
                };
                (kind, pending)
            })
            .collect();

        // join_all 依輸入順序回傳，與完成順序無關
        join_all(pending.into_iter().map(|(kind, pending)| async move {
            let result = match pending {
                PendingCall::Resolved(result) => result,
                PendingCall::Running(task) => match task.await {
                    Ok(result) => result,
                    Err(join_error) => Err(PlannerError::transport(format!(
                        "{} capability task aborted: {}",
                        kind, join_error
                    ))),
                },
            };
            (kind, result)
        }))
        .await
    }

    /// 派送訂位呼叫並將回應解碼為 ServiceOutcome
    pub async fn dispatch(&self, calls: Vec<CapabilityCall>, deadline: Option<Instant>) -> OutcomeMap {
        self.dispatch_raw(calls, deadline)
            .await
            .into_iter()
            .map(|(kind, reply)| {
                let outcome = match reply.and_then(|value| decode_confirmation(kind, value)) {
                    Ok(booking_id) => {
                        tracing::info!("✅ {} booking confirmed: {}", kind, booking_id);
                        ServiceOutcome::success(booking_id)
                    }
                    Err(e) => {
                        tracing::warn!("❌ {} failed ({}): {}", kind, e.kind(), e);
                        ServiceOutcome::from_error(&e)
                    }
                };
                (kind, outcome)
            })
            .collect()
    }
}

async fn invoke_with_timeout(
    handle: Arc<dyn CapabilityHandle>,
    call: CapabilityCall,
    limit: Duration,
    deadline: Option<Instant>,
) -> Result<Value> {
    let started = Instant::now();
    let call_deadline = started + limit;
    let effective = match deadline {
        Some(run_deadline) if run_deadline < call_deadline => run_deadline,
        _ => call_deadline,
    };

    match tokio::time::timeout_at(effective, handle.invoke(call.payload())).await {
        Ok(result) => result,
        Err(_) => Err(PlannerError::Timeout {
            capability_id: call.capability_id().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }),
    }
}

pub fn decode_confirmation(kind: ServiceKind, value: Value) -> Result<String> {
    let confirmation: BookingConfirmation = serde_json::from_value(value).map_err(|e| {
        PlannerError::transport(format!("{} booking response was invalid: {}", kind, e))
    })?;

    if confirmation.is_confirmed() {
        Ok(confirmation.booking_id)
    } else {
        let detail = confirmation
            .message
            .map(|m| format!(" ({})", m))
            .unwrap_or_default();
        Err(PlannerError::remote(format!(
            "{} booking status: {}{}",
            kind, confirmation.status, detail
        )))
    }
}
