use crate::domain::model::{
    ErrorDescriptor, OutcomeMap, ServiceKind, ServiceOutcome, TripResult, TripStatus,
};
use crate::utils::error::{PlannerError, Result};

pub const ALL_FAILED_SUMMARY: &str = "Booking failed for all requested services.";

/// 將各服務結果歸納為單一 TripResult；純函式，無內部狀態
pub struct Aggregator;

impl Aggregator {
    /// `requested` 的順序決定 perService 與 errors 的順序。
    /// 任何請求的服務缺少結果時回傳 `MissingOutcome`。
    pub fn aggregate(requested: &[ServiceKind], outcomes: &OutcomeMap) -> Result<TripResult> {
        let mut per_service = OutcomeMap::new();
        for &kind in requested {
            let outcome = outcomes
                .get(kind)
                .ok_or(PlannerError::MissingOutcome { service: kind })?;
            per_service.insert(kind, outcome.clone());
        }

        for kind in outcomes.kinds() {
            if !requested.contains(&kind) {
                tracing::debug!("Ignoring outcome for unrequested service {}", kind);
            }
        }

        let booked: Vec<&str> = per_service
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(kind, _)| kind.display_name())
            .collect();

        let errors: Vec<ErrorDescriptor> = per_service
            .iter()
            .filter_map(|(kind, outcome)| match outcome {
                ServiceOutcome::Failure { reason, message } => Some(ErrorDescriptor {
                    service_kind: Some(kind),
                    error_kind: *reason,
                    message: message.clone(),
                }),
                ServiceOutcome::Success { .. } => None,
            })
            .collect();

        let status = Self::status_of(&per_service);
        let summary = if booked.is_empty() {
            ALL_FAILED_SUMMARY.to_string()
        } else {
            format!("Successfully booked: {}.", booked.join(", "))
        };

        Ok(TripResult {
            status,
            per_service,
            summary,
            errors,
        })
    }

    pub fn status_of(outcomes: &OutcomeMap) -> TripStatus {
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|(_, o)| o.is_success()).count();

        if total > 0 && succeeded == total {
            TripStatus::Success
        } else if succeeded == 0 {
            TripStatus::Failure
        } else {
            TripStatus::PartialSuccess
        }
    }
}
