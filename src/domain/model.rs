use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::utils::error::PlannerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceKind {
    Flight,
    Hotel,
    CarRental,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [ServiceKind::Flight, ServiceKind::Hotel, ServiceKind::CarRental];

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Flight => "Flight",
            ServiceKind::Hotel => "Hotel",
            ServiceKind::CarRental => "Car Rental",
        }
    }

    pub fn search_capability(&self) -> &'static str {
        match self {
            ServiceKind::Flight => "searchFlights",
            ServiceKind::Hotel => "searchHotels",
            ServiceKind::CarRental => "searchCars",
        }
    }

    pub fn book_capability(&self) -> &'static str {
        match self {
            ServiceKind::Flight => "bookFlight",
            ServiceKind::Hotel => "bookHotel",
            ServiceKind::CarRental => "bookCar",
        }
    }

    /// 搜尋回應中選項清單的欄位名稱
    pub fn options_key(&self) -> &'static str {
        match self {
            ServiceKind::Flight => "flights",
            ServiceKind::Hotel => "hotels",
            ServiceKind::CarRental => "cars",
        }
    }

    pub fn option_id_field(&self) -> &'static str {
        match self {
            ServiceKind::Flight => "flightId",
            ServiceKind::Hotel => "hotelId",
            ServiceKind::CarRental => "carId",
        }
    }

    /// 由能力名稱反推服務類型 (searchFlights / bookFlight ...)
    pub fn from_capability(capability_id: &str) -> Option<Self> {
        ServiceKind::ALL.into_iter().find(|kind| {
            kind.search_capability() == capability_id || kind.book_capability() == capability_id
        })
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownCapability,
    Timeout,
    TransportError,
    RemoteBookingFailed,
    InterpretationFailed,
    MissingOutcome,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnknownCapability => "UnknownCapability",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::TransportError => "TransportError",
            ErrorKind::RemoteBookingFailed => "RemoteBookingFailed",
            ErrorKind::InterpretationFailed => "InterpretationFailed",
            ErrorKind::MissingOutcome => "MissingOutcome",
        };
        f.write_str(name)
    }
}

/// 對單一代理能力的一次呼叫，建立後不可變
#[derive(Debug, Clone)]
pub struct CapabilityCall {
    service_kind: ServiceKind,
    capability_id: String,
    payload: serde_json::Value,
    timeout: Option<Duration>,
}

impl CapabilityCall {
    pub fn new(
        service_kind: ServiceKind,
        capability_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            service_kind,
            capability_id: capability_id.into(),
            payload,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn service_kind(&self) -> ServiceKind {
        self.service_kind
    }

    pub fn capability_id(&self) -> &str {
        &self.capability_id
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// 代理回傳的訂位確認
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl BookingConfirmation {
    pub const CONFIRMED: &'static str = "Confirmed";

    pub fn is_confirmed(&self) -> bool {
        self.status == Self::CONFIRMED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome")]
pub enum ServiceOutcome {
    Success {
        #[serde(rename = "bookingId")]
        booking_id: String,
    },
    Failure {
        reason: ErrorKind,
        message: String,
    },
}

impl ServiceOutcome {
    pub fn success(booking_id: impl Into<String>) -> Self {
        ServiceOutcome::Success {
            booking_id: booking_id.into(),
        }
    }

    pub fn failure(reason: ErrorKind, message: impl Into<String>) -> Self {
        ServiceOutcome::Failure {
            reason,
            message: message.into(),
        }
    }

    pub fn from_error(error: &PlannerError) -> Self {
        ServiceOutcome::failure(error.kind(), error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceOutcome::Success { .. })
    }

    pub fn booking_id(&self) -> Option<&str> {
        match self {
            ServiceOutcome::Success { booking_id } => Some(booking_id),
            ServiceOutcome::Failure { .. } => None,
        }
    }
}

/// 依插入順序保存的 serviceKind → ServiceOutcome 對應表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeMap {
    entries: Vec<(ServiceKind, ServiceOutcome)>,
}

impl OutcomeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同一服務再次寫入時覆蓋原值並保留原位置
    pub fn insert(&mut self, kind: ServiceKind, outcome: ServiceOutcome) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((kind, outcome)),
        }
    }

    pub fn get(&self, kind: ServiceKind) -> Option<&ServiceOutcome> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn contains(&self, kind: ServiceKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceKind, &ServiceOutcome)> {
        self.entries.iter().map(|(kind, outcome)| (*kind, outcome))
    }

    pub fn kinds(&self) -> Vec<ServiceKind> {
        self.entries.iter().map(|(kind, _)| *kind).collect()
    }
}

impl FromIterator<(ServiceKind, ServiceOutcome)> for OutcomeMap {
    fn from_iter<T: IntoIterator<Item = (ServiceKind, ServiceOutcome)>>(iter: T) -> Self {
        let mut map = OutcomeMap::new();
        for (kind, outcome) in iter {
            map.insert(kind, outcome);
        }
        map
    }
}

impl Serialize for OutcomeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, outcome) in &self.entries {
            map.serialize_entry(kind, outcome)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    Success,
    PartialSuccess,
    #[serde(rename = "Failed")]
    Failure,
}

impl TripStatus {
    /// 對外相容的狀態字串
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Success => "Success",
            TripStatus::PartialSuccess => "PartialSuccess",
            TripStatus::Failure => "Failed",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    pub service_kind: Option<ServiceKind>,
    pub error_kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResult {
    pub status: TripStatus,
    pub per_service: OutcomeMap,
    pub summary: String,
    pub errors: Vec<ErrorDescriptor>,
}

impl TripResult {
    pub const INTERPRETATION_FAILED_SUMMARY: &'static str =
        "Could not understand the request or identify any services to book.";

    /// 整體流程失敗 (未進入派送或內部錯誤) 時的結果
    pub fn run_failure(error_kind: ErrorKind, message: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            status: TripStatus::Failure,
            per_service: OutcomeMap::new(),
            summary: summary.into(),
            errors: vec![ErrorDescriptor {
                service_kind: None,
                error_kind,
                message: message.into(),
            }],
        }
    }

    pub fn booking_id(&self, kind: ServiceKind) -> Option<&str> {
        self.per_service.get(kind).and_then(ServiceOutcome::booking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_map_keeps_first_insert_position() {
        let mut map = OutcomeMap::new();
        map.insert(ServiceKind::Hotel, ServiceOutcome::success("HTL-1"));
        map.insert(ServiceKind::Flight, ServiceOutcome::failure(ErrorKind::Timeout, "slow"));
        map.insert(ServiceKind::Hotel, ServiceOutcome::success("HTL-2"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.kinds(), vec![ServiceKind::Hotel, ServiceKind::Flight]);
        assert_eq!(map.get(ServiceKind::Hotel).and_then(|o| o.booking_id()), Some("HTL-2"));
        assert!(!map.contains(ServiceKind::CarRental));
    }

    #[test]
    fn test_status_serializes_with_compatible_spelling() {
        assert_eq!(serde_json::to_value(TripStatus::Failure).unwrap(), "Failed");
        assert_eq!(serde_json::to_value(TripStatus::PartialSuccess).unwrap(), "PartialSuccess");
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let mut map = OutcomeMap::new();
        map.insert(ServiceKind::CarRental, ServiceOutcome::failure(ErrorKind::Timeout, "no reply"));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["CarRental"]["outcome"], "Failure");
        assert_eq!(json["CarRental"]["reason"], "Timeout");
    }

    #[test]
    fn test_capability_lookup() {
        assert_eq!(ServiceKind::from_capability("bookCar"), Some(ServiceKind::CarRental));
        assert_eq!(ServiceKind::from_capability("searchHotels"), Some(ServiceKind::Hotel));
        assert_eq!(ServiceKind::from_capability("planTrip"), None);
    }

    #[test]
    fn test_booking_confirmation_parsing() {
        let confirmation: BookingConfirmation = serde_json::from_value(serde_json::json!({
            "bookingId": "FLT-123",
            "status": "Confirmed"
        }))
        .unwrap();
        assert!(confirmation.is_confirmed());
        assert_eq!(confirmation.message, None);
    }
}
