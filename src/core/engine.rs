use crate::core::aggregator::Aggregator;
use crate::core::dispatcher::Dispatcher;
use crate::core::registry::CapabilityRegistry;
use crate::core::retry::RetryPolicy;
use crate::core::trip_calls::{booking_call, search_call, select_first_option};
use crate::core::{ConfigProvider, Interpreter};
use crate::domain::intent::{TripIntent, TripRequest};
use crate::domain::model::{
    CapabilityCall, ErrorKind, OutcomeMap, ServiceKind, ServiceOutcome, TripResult,
};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 單次規劃流程的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Received,
    Interpreting,
    Dispatching,
    Aggregating,
    Completed { failed: bool },
}

impl RunState {
    fn advance(&mut self, next: RunState) {
        tracing::debug!("🔄 {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// 協調器：解析 → 派送 → 彙總。
///
/// 已確認的訂位不會因為其他服務失敗而被取消；
/// PartialSuccess 是可接受的終止狀態，不做補償性退訂。
pub struct OrchestrationEngine<C: ConfigProvider> {
    interpreter: Arc<dyn Interpreter>,
    dispatcher: Dispatcher,
    retry_policy: RetryPolicy,
    config: C,
}

impl<C: ConfigProvider> OrchestrationEngine<C> {
    pub fn new(interpreter: Arc<dyn Interpreter>, registry: Arc<CapabilityRegistry>, config: C) -> Self {
        let dispatcher = Dispatcher::new(registry).with_default_timeout(config.default_call_timeout());
        let retry_policy = RetryPolicy::from_config(&config);
        Self {
            interpreter,
            dispatcher,
            retry_policy,
            config,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        self.dispatcher.registry()
    }

    /// 永遠回傳完整的 TripResult，所有失敗都表現在結果之中
    pub async fn plan_trip(&self, request: TripRequest) -> TripResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("plan_trip", %run_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: TripRequest) -> TripResult {
        let mut state = RunState::Received;

        state.advance(RunState::Interpreting);
        let intent = match self.interpret(request).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!("❌ Interpretation failed: {}", e);
                state.advance(RunState::Completed { failed: true });
                return TripResult::run_failure(
                    ErrorKind::InterpretationFailed,
                    e.to_string(),
                    TripResult::INTERPRETATION_FAILED_SUMMARY,
                );
            }
        };
        tracing::info!(
            "🧭 Planning {:?} for {} traveller(s): {} -> {} ({} to {})",
            intent.requested_services,
            intent.party_size,
            intent.origin,
            intent.destination,
            intent.start_date,
            intent.end_date
        );

        state.advance(RunState::Dispatching);
        let deadline = self.config.request_deadline().map(|limit| Instant::now() + limit);
        let outcomes = self.dispatch_services(&intent, deadline).await;

        state.advance(RunState::Aggregating);
        match Aggregator::aggregate(&intent.requested_services, &outcomes) {
            Ok(result) => {
                state.advance(RunState::Completed { failed: false });
                tracing::info!("🏁 {}: {}", result.status, result.summary);
                result
            }
            Err(e) => {
                tracing::error!("💥 Internal consistency fault: {}", e);
                state.advance(RunState::Completed { failed: true });
                TripResult::run_failure(e.kind(), e.to_string(), "Internal error while aggregating booking results.")
            }
        }
    }

    async fn interpret(&self, request: TripRequest) -> Result<TripIntent> {
        let intent = match request {
            TripRequest::Text(query) => self.interpreter.interpret(&query).await?,
            TripRequest::Parsed(intent) => intent,
        }
        .normalized();
        intent.validate()?;
        Ok(intent)
    }

    async fn dispatch_services(&self, intent: &TripIntent, deadline: Option<Instant>) -> OutcomeMap {
        let mut outcomes = OutcomeMap::new();

        let booking_calls: Vec<CapabilityCall> = if self.config.search_before_book() {
            let mut calls = Vec::new();
            for (kind, selection) in self.search_phase(intent, deadline).await {
                match selection {
                    Ok(option_id) => {
                        tracing::info!("🎯 {}: selected option {}", kind, option_id);
                        calls.push(booking_call(kind, intent, Some(&option_id)));
                    }
                    Err(e) => {
                        tracing::warn!("❌ {} search failed ({}): {}", kind, e.kind(), e);
                        outcomes.insert(kind, ServiceOutcome::from_error(&e));
                    }
                }
            }
            calls
        } else {
            intent
                .requested_services
                .iter()
                .map(|&kind| booking_call(kind, intent, None))
                .collect()
        };

        let booking_calls = booking_calls
            .into_iter()
            .map(|call| {
                let timeout = self.config.call_timeout(call.service_kind());
                call.with_timeout(timeout)
            })
            .collect();

        // 訂位呼叫不重試
        let booked = self.dispatcher.dispatch(booking_calls, deadline).await;
        for (kind, outcome) in booked.iter() {
            outcomes.insert(kind, outcome.clone());
        }
        outcomes
    }

    /// 搜尋階段：並行搜尋，逾時依策略重試，最後選出每個服務的第一個選項
    async fn search_phase(
        &self,
        intent: &TripIntent,
        deadline: Option<Instant>,
    ) -> Vec<(ServiceKind, Result<String>)> {
        let mut pending: Vec<CapabilityCall> = intent
            .requested_services
            .iter()
            .map(|&kind| search_call(kind, intent).with_timeout(self.config.call_timeout(kind)))
            .collect();
        let mut replies = HashMap::new();
        let mut attempts: u32 = 0;

        while !pending.is_empty() {
            attempts += 1;
            let by_kind: HashMap<ServiceKind, CapabilityCall> = pending
                .iter()
                .map(|call| (call.service_kind(), call.clone()))
                .collect();
            let mut retry = Vec::new();

            for (kind, reply) in self.dispatcher.dispatch_raw(pending, deadline).await {
                let deadline_passed = deadline.is_some_and(|d| Instant::now() >= d);
                let retry_call = match &reply {
                    Err(e) if !deadline_passed && self.retry_policy.should_retry_search(kind, attempts, e) => {
                        by_kind.get(&kind).cloned()
                    }
                    _ => None,
                };
                match retry_call {
                    Some(call) => {
                        tracing::info!("🔁 {} search timed out; retrying (attempt {})", kind, attempts + 1);
                        retry.push(call);
                    }
                    None => {
                        replies.insert(kind, reply);
                    }
                }
            }
            pending = retry;
        }

        intent
            .requested_services
            .iter()
            .filter_map(|&kind| {
                replies
                    .remove(&kind)
                    .map(|reply| (kind, reply.and_then(|value| select_first_option(kind, &value))))
            })
            .collect()
    }
}
