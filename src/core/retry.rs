use crate::core::ConfigProvider;
use crate::domain::model::{ErrorKind, ServiceKind};
use crate::utils::error::PlannerError;

/// 引擎層的明確重試策略：只針對搜尋階段的逾時。
/// 訂位呼叫永遠不重試，避免重複訂位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    flight: u32,
    hotel: u32,
    car_rental: u32,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            flight: config.search_timeout_retries(ServiceKind::Flight),
            hotel: config.search_timeout_retries(ServiceKind::Hotel),
            car_rental: config.search_timeout_retries(ServiceKind::CarRental),
        }
    }

    pub fn with_retries(mut self, kind: ServiceKind, retries: u32) -> Self {
        match kind {
            ServiceKind::Flight => self.flight = retries,
            ServiceKind::Hotel => self.hotel = retries,
            ServiceKind::CarRental => self.car_rental = retries,
        }
        self
    }

    pub fn retries_for(&self, kind: ServiceKind) -> u32 {
        match kind {
            ServiceKind::Flight => self.flight,
            ServiceKind::Hotel => self.hotel,
            ServiceKind::CarRental => self.car_rental,
        }
    }

    /// `attempts_made` 為已完成的嘗試次數 (含第一次)
    pub fn should_retry_search(&self, kind: ServiceKind, attempts_made: u32, error: &PlannerError) -> bool {
        error.kind() == ErrorKind::Timeout && attempts_made <= self.retries_for(kind)
    }
}
