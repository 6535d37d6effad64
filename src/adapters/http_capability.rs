use crate::core::CapabilityHandle;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// 以 HTTP POST 呼叫遠端代理的能力
#[derive(Debug, Clone)]
pub struct HttpCapability {
    client: Client,
    url: String,
}

impl HttpCapability {
    pub fn new(client: Client, endpoint_url: &str, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            client,
            url: format!("{}{}", endpoint_url.trim_end_matches('/'), path),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CapabilityHandle for HttpCapability {
    async fn invoke(&self, payload: &Value) -> Result<Value> {
        let body = strip_nulls(payload.clone());
        tracing::debug!("📤 POST {}", self.url);

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        tracing::debug!("📥 {} responded with {}", self.url, status);

        let text = response.text().await?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(match parsed.as_ref().and_then(error_message) {
                Some(message) => PlannerError::remote(format!("{} ({})", message, status)),
                None => PlannerError::transport(format!("{} returned HTTP {}", self.url, status)),
            });
        }

        let value = parsed.ok_or_else(|| {
            PlannerError::transport(format!("{} returned a non-JSON body", self.url))
        })?;
        if let Some(message) = error_message(&value) {
            return Err(PlannerError::remote(message));
        }
        Ok(value)
    }

    fn describe(&self) -> String {
        format!("POST {}", self.url)
    }
}

fn error_message(value: &Value) -> Option<String> {
    value.get("error").map(|error| match error.as_str() {
        Some(message) => message.to_string(),
        None => error.to_string(),
    })
}

/// 移除值為 null 的欄位 (遞迴)
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ErrorKind;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_url_join_normalizes_slashes() {
        let client = Client::new();
        assert_eq!(
            HttpCapability::new(client.clone(), "http://127.0.0.1:5001/", "bookFlight").url(),
            "http://127.0.0.1:5001/bookFlight"
        );
        assert_eq!(
            HttpCapability::new(client, "http://127.0.0.1:5001", "/searchFlights").url(),
            "http://127.0.0.1:5001/searchFlights"
        );
    }

    #[test]
    fn test_strip_nulls_is_recursive() {
        let stripped = strip_nulls(json!({
            "carId": null,
            "location": "Tokyo",
            "driverDetails": {"name": "Primary Driver", "licence": null}
        }));
        assert_eq!(
            stripped,
            json!({"location": "Tokyo", "driverDetails": {"name": "Primary Driver"}})
        );
    }

    #[tokio::test]
    async fn test_posts_payload_and_returns_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bookHotel")
                    .json_body(json!({"hotelId": "HOTEL-1", "partySize": 2}));
                then.status(200)
                    .json_body(json!({"bookingId": "HTL-123", "status": "Confirmed"}));
            })
            .await;

        let capability = HttpCapability::new(Client::new(), &server.base_url(), "/bookHotel");
        let reply = capability
            .invoke(&json!({"hotelId": "HOTEL-1", "partySize": 2, "carType": null}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply["bookingId"], "HTL-123");
    }

    #[tokio::test]
    async fn test_error_body_is_remote_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bookFlight");
                then.status(400)
                    .json_body(json!({"error": "Missing required booking parameters"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/searchCars");
                then.status(200).json_body(json!({"error": "No cars available"}));
            })
            .await;

        let client = Client::new();
        let rejected = HttpCapability::new(client.clone(), &server.base_url(), "/bookFlight")
            .invoke(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(rejected.kind(), ErrorKind::RemoteBookingFailed);
        assert!(rejected.to_string().contains("Missing required booking parameters"));

        let in_body = HttpCapability::new(client, &server.base_url(), "/searchCars")
            .invoke(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(in_body.kind(), ErrorKind::RemoteBookingFailed);
    }

    #[tokio::test]
    async fn test_server_error_without_body_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bookCar");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = HttpCapability::new(Client::new(), &server.base_url(), "/bookCar")
            .invoke(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }

    #[tokio::test]
    async fn test_client_timeout_maps_to_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/searchFlights");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({"flights": []}));
            })
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = HttpCapability::new(client, &server.base_url(), "/searchFlights")
            .invoke(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_transport_error() {
        // 連接埠 9 (discard) 在測試環境中不會有服務
        let err = HttpCapability::new(Client::new(), "http://127.0.0.1:9", "/bookFlight")
            .invoke(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }
}
