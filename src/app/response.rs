use crate::domain::model::{ErrorDescriptor, ServiceKind, TripResult};
use serde::Serialize;

/// `/planTrip` 回應格式 (與既有前端相容)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripResponse {
    pub status: String,
    pub summary: String,
    pub details: TripDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub flight_booking_id: Option<String>,
    pub hotel_booking_id: Option<String>,
    pub car_rental_booking_id: Option<String>,
    pub errors: Vec<ErrorDescriptor>,
}

impl From<&TripResult> for TripResponse {
    fn from(result: &TripResult) -> Self {
        let booking_id = |kind: ServiceKind| result.booking_id(kind).map(str::to_string);
        Self {
            status: result.status.as_str().to_string(),
            summary: result.summary.clone(),
            details: TripDetails {
                flight_booking_id: booking_id(ServiceKind::Flight),
                hotel_booking_id: booking_id(ServiceKind::Hotel),
                car_rental_booking_id: booking_id(ServiceKind::CarRental),
                errors: result.errors.clone(),
            },
        }
    }
}
