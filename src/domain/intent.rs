use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::model::ServiceKind;
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::Validate;

/// 單次訂位的人數上限
pub const MAX_PARTY_SIZE: u32 = 9;

/// 解析器產生的結構化旅遊意圖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripIntent {
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub party_size: u32,
    pub requested_services: Vec<ServiceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,
}

impl TripIntent {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        party_size: u32,
        requested_services: Vec<ServiceKind>,
    ) -> Result<Self> {
        let intent = Self {
            origin: origin.into(),
            destination: destination.into(),
            start_date,
            end_date,
            party_size,
            requested_services,
            hotel_preference: None,
            car_type: None,
        }
        .normalized();
        intent.validate()?;
        Ok(intent)
    }

    pub fn with_hotel_preference(mut self, preference: Option<String>) -> Self {
        self.hotel_preference = preference;
        self
    }

    pub fn with_car_type(mut self, car_type: Option<String>) -> Self {
        self.car_type = car_type;
        self
    }

    /// 去除重複的服務，保留第一次出現的順序
    pub fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.requested_services.len());
        for kind in self.requested_services {
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        self.requested_services = seen;
        self
    }

    pub fn requests(&self, kind: ServiceKind) -> bool {
        self.requested_services.contains(&kind)
    }

    /// 飯店搜尋地點：有偏好時優先使用
    pub fn hotel_location(&self) -> &str {
        self.hotel_preference.as_deref().unwrap_or(&self.destination)
    }
}

impl Validate for TripIntent {
    fn validate(&self) -> Result<()> {
        if self.requested_services.is_empty() {
            return Err(PlannerError::interpretation(
                "no flight, hotel or car rental service was requested",
            ));
        }
        if self.start_date > self.end_date {
            return Err(PlannerError::interpretation(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if self.party_size == 0 {
            return Err(PlannerError::interpretation("party size must be at least 1"));
        }
        if self.party_size > MAX_PARTY_SIZE {
            return Err(PlannerError::interpretation(format!(
                "party size {} exceeds the maximum of {}",
                self.party_size, MAX_PARTY_SIZE
            )));
        }
        if self.destination.trim().is_empty() {
            return Err(PlannerError::interpretation("destination is missing"));
        }
        if self.requests(ServiceKind::Flight) && self.origin.trim().is_empty() {
            return Err(PlannerError::interpretation("flight requested without an origin"));
        }
        Ok(())
    }
}

/// 一次規劃請求：原始文字或已解析的意圖
#[derive(Debug, Clone)]
pub enum TripRequest {
    Text(String),
    Parsed(TripIntent),
}
