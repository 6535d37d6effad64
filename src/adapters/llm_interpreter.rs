use crate::adapters::keyword_interpreter::DEFAULT_ORIGIN;
use crate::core::Interpreter;
use crate::domain::intent::TripIntent;
use crate::domain::model::ServiceKind;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts travel information and responds ONLY in JSON format.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct Extraction {
    #[serde(default)]
    intents: Vec<String>,
    #[serde(default)]
    entities: Map<String, Value>,
}

/// 透過 Ollama 相容的 `/api/chat` 解析旅遊需求
pub struct LlmInterpreter {
    client: Client,
    chat_url: String,
    model: String,
    timeout: std::time::Duration,
    today: Option<NaiveDate>,
}

impl LlmInterpreter {
    pub fn new(client: Client, endpoint: &str, model: impl Into<String>) -> Self {
        Self {
            client,
            chat_url: format!("{}/api/chat", endpoint.trim_end_matches('/')),
            model: model.into(),
            timeout: std::time::Duration::from_secs(60),
            today: None,
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn prompt(&self, query: &str) -> String {
        format!(
            r#"Analyze the travel request below and extract what the user wants to book.

User Request: "{query}"

Intents (list of strings): "searchFlights", "bookFlight", "searchHotels", "bookHotel", "searchCars", "bookCar".

Entities: "origin", "destination", "departureDate" (YYYY-MM-DD), "returnDate" (YYYY-MM-DD), "passengers" (integer, default 1), "location" (hotel or car rental city), "hotel_location_preference" (e.g. "near Eiffel Tower"), "carType" (e.g. "SUV", "Compact"). Use null for anything not specified.

Today's date is {today}. Resolve relative dates such as "tomorrow" or "next week" (next week starts on the upcoming Monday).

Respond strictly as {{"intents": [...], "entities": {{...}}}} with no other text."#,
            query = query,
            today = self.today()
        )
    }

    async fn chat(&self, query: &str) -> Result<Extraction> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": self.prompt(query)}
            ],
            "format": "json",
            "stream": false
        });

        tracing::debug!("🤖 Asking {} ({}) to interpret the request", self.chat_url, self.model);
        let response = self
            .client
            .post(&self.chat_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlannerError::interpretation(format!("LLM request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PlannerError::interpretation(format!(
                "LLM endpoint returned HTTP {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::interpretation(format!("LLM response was invalid: {}", e)))?;
        tracing::debug!("🤖 Raw LLM content: {}", chat.message.content);

        serde_json::from_str(&chat.message.content).map_err(|e| {
            PlannerError::interpretation(format!("LLM content was not the expected JSON: {}", e))
        })
    }

    fn to_intent(&self, extraction: Extraction) -> Result<TripIntent> {
        let mut services = Vec::new();
        for intent in &extraction.intents {
            if let Some(kind) = ServiceKind::from_capability(intent) {
                if !services.contains(&kind) {
                    services.push(kind);
                }
            }
        }
        if services.is_empty() {
            return Err(PlannerError::interpretation(
                "LLM did not identify any flight, hotel or car rental intent",
            ));
        }

        let entities = &extraction.entities;
        let destination = entity(entities, "destination")
            .or_else(|| entity(entities, "location"))
            .ok_or_else(|| PlannerError::interpretation("LLM did not extract a destination"))?;
        let origin = entity(entities, "origin").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let start_date = ["departureDate", "checkInDate", "pickupDate"]
            .iter()
            .find_map(|key| entity_date(entities, key))
            .unwrap_or_else(|| self.today() + Duration::days(7));
        let end_date = ["returnDate", "checkOutDate", "dropoffDate"]
            .iter()
            .find_map(|key| entity_date(entities, key))
            .filter(|end| *end > start_date)
            .unwrap_or(start_date + Duration::days(5));

        let party_size = entities
            .get("passengers")
            .or_else(|| entities.get("guests"))
            .and_then(|value| match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);

        Ok(
            TripIntent::new(origin, destination, start_date, end_date, party_size, services)?
                .with_hotel_preference(entity(entities, "hotel_location_preference"))
                .with_car_type(entity(entities, "carType")),
        )
    }
}

#[async_trait]
impl Interpreter for LlmInterpreter {
    async fn interpret(&self, query: &str) -> Result<TripIntent> {
        let extraction = self.chat(query).await?;
        tracing::debug!("🤖 LLM intents: {:?}", extraction.intents);
        self.to_intent(extraction)
    }
}

/// 字串 "null" 與空字串視為未提供
fn entity(entities: &Map<String, Value>, key: &str) -> Option<String> {
    entities
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn entity_date(entities: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = entity(entities, key)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ErrorKind;
    use httpmock::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn server_replying(content: Value) -> MockServer {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .body_contains("\"format\":\"json\"")
                    .body_contains("\"stream\":false");
                then.status(200).json_body(json!({
                    "model": "llama3:8b",
                    "message": {"role": "assistant", "content": content.to_string()},
                    "done": true
                }));
            })
            .await;
        server
    }

    fn interpreter(server: &MockServer) -> LlmInterpreter {
        LlmInterpreter::new(Client::new(), &server.base_url(), "llama3:8b").with_today(date("2026-10-14"))
    }

    #[tokio::test]
    async fn test_extracts_intent_from_chat_reply() {
        let server = server_replying(json!({
            "intents": ["searchFlights", "bookFlight", "searchHotels", "bookHotel"],
            "entities": {
                "origin": "Singapore",
                "destination": "Tokyo",
                "departureDate": "2026-12-01",
                "returnDate": "2026-12-06",
                "passengers": 2,
                "location": "Tokyo",
                "hotel_location_preference": "null",
                "carType": ""
            }
        }))
        .await;

        let intent = interpreter(&server).interpret("flight and hotel in Tokyo").await.unwrap();

        assert_eq!(intent.requested_services, vec![ServiceKind::Flight, ServiceKind::Hotel]);
        assert_eq!(intent.destination, "Tokyo");
        assert_eq!(intent.start_date, date("2026-12-01"));
        assert_eq!(intent.end_date, date("2026-12-06"));
        assert_eq!(intent.party_size, 2);
        assert_eq!(intent.hotel_preference, None);
        assert_eq!(intent.car_type, None);
    }

    #[tokio::test]
    async fn test_fills_defaults_for_missing_entities() {
        let server = server_replying(json!({
            "intents": ["bookCar"],
            "entities": {"location": "Lisbon", "pickupDate": "2026-11-02T12:00:00Z", "passengers": null}
        }))
        .await;

        let intent = interpreter(&server).interpret("car in Lisbon").await.unwrap();

        assert_eq!(intent.origin, DEFAULT_ORIGIN);
        assert_eq!(intent.destination, "Lisbon");
        assert_eq!(intent.start_date, date("2026-11-02"));
        assert_eq!(intent.end_date, date("2026-11-07"));
        assert_eq!(intent.party_size, 1);
    }

    #[tokio::test]
    async fn test_no_intents_is_interpretation_failure() {
        let server = server_replying(json!({"intents": [], "entities": {}})).await;
        let err = interpreter(&server).interpret("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpretationFailed);
    }

    #[tokio::test]
    async fn test_unreachable_or_broken_llm_is_interpretation_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500).body("model not loaded");
            })
            .await;
        let err = interpreter(&server).interpret("flight to Tokyo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpretationFailed);

        let offline = LlmInterpreter::new(Client::new(), "http://127.0.0.1:9", "llama3:8b");
        let err = offline.interpret("flight to Tokyo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpretationFailed);
    }
}
