use crate::domain::intent::{TripIntent, MAX_PARTY_SIZE};
use crate::domain::model::{CapabilityCall, ServiceKind};
use crate::utils::error::{PlannerError, Result};
use serde_json::{json, Value};
use uuid::Uuid;

/// 各服務的搜尋請求 (欄位名稱沿用代理的 API)
pub fn search_call(kind: ServiceKind, intent: &TripIntent) -> CapabilityCall {
    let payload = match kind {
        ServiceKind::Flight => json!({
            "origin": intent.origin,
            "destination": intent.destination,
            "departureDate": intent.start_date.to_string(),
            "returnDate": intent.end_date.to_string(),
            "passengers": intent.party_size,
        }),
        ServiceKind::Hotel => json!({
            "location": intent.hotel_location(),
            "checkInDate": intent.start_date.to_string(),
            "checkOutDate": intent.end_date.to_string(),
            "guests": intent.party_size,
        }),
        ServiceKind::CarRental => json!({
            "location": intent.destination,
            "pickupDate": rental_timestamp(intent.start_date),
            "dropoffDate": rental_timestamp(intent.end_date),
            "carType": intent.car_type,
        }),
    };
    CapabilityCall::new(kind, kind.search_capability(), payload)
}

/// 訂位請求；`selected_id` 為搜尋階段選出的選項 ID
pub fn booking_call(kind: ServiceKind, intent: &TripIntent, selected_id: Option<&str>) -> CapabilityCall {
    let mut payload = json!({
        "origin": intent.origin,
        "destination": intent.destination,
        "startDate": intent.start_date.to_string(),
        "endDate": intent.end_date.to_string(),
        "partySize": intent.party_size,
    });

    let specific = match kind {
        ServiceKind::Flight => json!({
            "flightId": selected_id,
            "passengerDetails": travellers("Traveller", intent.party_size),
        }),
        ServiceKind::Hotel => json!({
            "hotelId": selected_id,
            "guestDetails": travellers("Guest", intent.party_size),
            "roomType": "Standard",
        }),
        ServiceKind::CarRental => json!({
            "carId": selected_id,
            "driverDetails": {"name": "Primary Driver", "id": Uuid::new_v4().to_string()},
            "carType": intent.car_type,
        }),
    };

    if let (Value::Object(base), Value::Object(extra)) = (&mut payload, specific) {
        base.extend(extra);
    }

    CapabilityCall::new(kind, kind.book_capability(), payload)
}

/// 從搜尋回應中選出第一個選項的 ID
pub fn select_first_option(kind: ServiceKind, reply: &Value) -> Result<String> {
    if let Some(error) = reply.get("error") {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(PlannerError::remote(format!("{} search failed: {}", kind, message)));
    }

    let key = kind.options_key();
    let options = reply.get(key).and_then(Value::as_array).ok_or_else(|| {
        PlannerError::transport(format!(
            "{} search response was invalid (missing '{}' key)",
            kind, key
        ))
    })?;

    let first = options.first().ok_or_else(|| {
        PlannerError::remote(format!("{} search returned no available {}.", kind, key))
    })?;

    let id_field = kind.option_id_field();
    first
        .get(id_field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            PlannerError::transport(format!(
                "{} search option is missing '{}'",
                kind, id_field
            ))
        })
}

fn rental_timestamp(date: chrono::NaiveDate) -> String {
    format!("{}T12:00:00Z", date)
}

fn travellers(label: &str, count: u32) -> Vec<Value> {
    (1..=count.clamp(1, MAX_PARTY_SIZE))
        .map(|i| json!({"name": format!("{} {}", label, i), "id": Uuid::new_v4().to_string()}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ErrorKind;
    use chrono::NaiveDate;

    fn intent() -> TripIntent {
        TripIntent::new(
            "Singapore",
            "Tokyo",
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 6).unwrap(),
            2,
            ServiceKind::ALL.to_vec(),
        )
        .unwrap()
        .with_car_type(Some("Suv".to_string()))
    }

    #[test]
    fn test_search_payloads_use_agent_field_names() {
        let flight = search_call(ServiceKind::Flight, &intent());
        assert_eq!(flight.capability_id(), "searchFlights");
        assert_eq!(flight.payload()["departureDate"], "2026-12-01");
        assert_eq!(flight.payload()["passengers"], 2);

        let car = search_call(ServiceKind::CarRental, &intent());
        assert_eq!(car.payload()["pickupDate"], "2026-12-01T12:00:00Z");
        assert_eq!(car.payload()["carType"], "Suv");
    }

    #[test]
    fn test_booking_payload_merges_trip_and_service_fields() {
        let hotel = booking_call(ServiceKind::Hotel, &intent(), Some("HTL-42"));
        let payload = hotel.payload();
        assert_eq!(hotel.capability_id(), "bookHotel");
        assert_eq!(payload["hotelId"], "HTL-42");
        assert_eq!(payload["roomType"], "Standard");
        assert_eq!(payload["partySize"], 2);
        assert_eq!(payload["guestDetails"].as_array().unwrap().len(), 2);
        assert_eq!(payload["guestDetails"][1]["name"], "Guest 2");
    }

    #[test]
    fn test_traveller_list_is_bounded() {
        let mut oversized = intent();
        oversized.party_size = u32::MAX;
        let call = booking_call(ServiceKind::Flight, &oversized, Some("SGA-101"));
        let passengers = call.payload()["passengerDetails"].as_array().unwrap();
        assert_eq!(passengers.len(), MAX_PARTY_SIZE as usize);
    }

    #[test]
    fn test_select_first_option() {
        let reply = json!({"flights": [{"flightId": "SGA-101"}, {"flightId": "LIO-202"}]});
        assert_eq!(select_first_option(ServiceKind::Flight, &reply).unwrap(), "SGA-101");
    }

    #[test]
    fn test_select_reports_empty_and_invalid_replies() {
        let empty = select_first_option(ServiceKind::Hotel, &json!({"hotels": []})).unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::RemoteBookingFailed);
        assert!(empty.to_string().contains("no available hotels"));

        let invalid = select_first_option(ServiceKind::CarRental, &json!({"vehicles": []})).unwrap_err();
        assert_eq!(invalid.kind(), ErrorKind::TransportError);

        let rejected = select_first_option(
            ServiceKind::Flight,
            &json!({"error": "Missing required parameters"}),
        )
        .unwrap_err();
        assert_eq!(rejected.kind(), ErrorKind::RemoteBookingFailed);
    }
}
