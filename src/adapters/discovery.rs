use crate::adapters::http_capability::HttpCapability;
use crate::config::toml_config::{CapabilityEntry, PlannerConfig};
use crate::core::registry::{CapabilityRegistry, RegistryBuilder};
use crate::domain::agent_card::AgentCard;
use crate::utils::error::{PlannerError, Result};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CARD_TIMEOUT: Duration = Duration::from_secs(5);

/// 啟動時向各代理取得 agent card
pub struct AgentDiscovery {
    client: Client,
    base_urls: Vec<String>,
    card_timeout: Duration,
}

impl AgentDiscovery {
    pub fn new(client: Client, base_urls: Vec<String>) -> Self {
        Self {
            client,
            base_urls,
            card_timeout: DEFAULT_CARD_TIMEOUT,
        }
    }

    pub fn with_card_timeout(mut self, timeout: Duration) -> Self {
        self.card_timeout = timeout;
        self
    }

    pub async fn fetch_card(&self, base_url: &str) -> Result<AgentCard> {
        let url = format!("{}/agent-card", base_url.trim_end_matches('/'));
        tracing::debug!("🔍 Fetching agent card from {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.card_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlannerError::transport(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let card: AgentCard = response.json().await?;
        if !card.is_usable() {
            return Err(PlannerError::transport(format!(
                "agent card at {} is missing agentId, endpointUrl or capabilities",
                url
            )));
        }
        Ok(card)
    }

    /// 無法連線或格式錯誤的代理會被略過
    pub async fn discover(&self) -> Vec<AgentCard> {
        let fetches = self.base_urls.iter().map(|base_url| async move {
            (base_url.as_str(), self.fetch_card(base_url).await)
        });

        let mut cards = Vec::new();
        for (base_url, result) in join_all(fetches).await {
            match result {
                Ok(card) => {
                    tracing::info!(
                        "✅ Discovered {} ({}) with {} capabilities",
                        card.name(),
                        card.agent_id,
                        card.capabilities.len()
                    );
                    cards.push(card);
                }
                Err(e) => tracing::warn!("⚠️ Skipping agent at {}: {}", base_url, e),
            }
        }
        cards
    }
}

pub fn registry_from_cards(mut builder: RegistryBuilder, client: &Client, cards: &[AgentCard]) -> RegistryBuilder {
    for card in cards {
        for capability in &card.capabilities {
            if capability.capability_id.trim().is_empty() {
                continue;
            }
            let handle = HttpCapability::new(client.clone(), &card.endpoint_url, &capability.resolved_path());
            builder = builder.register_for_agent(&card.agent_id, &capability.capability_id, Arc::new(handle));
        }
    }
    builder
}

pub fn registry_from_entries(
    mut builder: RegistryBuilder,
    client: &Client,
    entries: &[CapabilityEntry],
) -> RegistryBuilder {
    for entry in entries {
        let descriptor = entry.descriptor();
        let handle = HttpCapability::new(client.clone(), &entry.endpoint_url, &descriptor.resolved_path());
        builder = match &entry.agent_id {
            Some(agent_id) => builder.register_for_agent(agent_id, &entry.capability_id, Arc::new(handle)),
            None => builder.register(&entry.capability_id, Arc::new(handle)),
        };
    }
    builder
}

/// 靜態設定的能力優先，其次為探索到的代理
pub async fn build_registry(config: &PlannerConfig, client: &Client) -> CapabilityRegistry {
    let builder = registry_from_entries(CapabilityRegistry::builder(), client, &config.capabilities);

    let cards = if config.discovery.agents.is_empty() {
        Vec::new()
    } else {
        AgentDiscovery::new(client.clone(), config.discovery.agents.clone())
            .with_card_timeout(config.card_timeout())
            .discover()
            .await
    };

    let registry = registry_from_cards(builder, client, &cards).build();
    if registry.is_empty() {
        tracing::warn!("⚠️ No capabilities registered; every booking will fail with UnknownCapability");
    } else {
        tracing::info!("📋 Registered capabilities: {}", registry.capability_ids().join(", "));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_discover_skips_unusable_and_unreachable_agents() {
        let good = MockServer::start_async().await;
        good.mock_async(|when, then| {
            when.method(GET).path("/agent-card");
            then.status(200).json_body(json!({
                "agentId": "flight-booker-002",
                "displayName": "SkyHigh Flight Booker",
                "endpointUrl": good.base_url(),
                "capabilities": [
                    {"capabilityId": "searchFlights"},
                    {"capabilityId": "bookFlight", "path": "/bookFlight"}
                ]
            }));
        })
        .await;

        let incomplete = MockServer::start_async().await;
        incomplete
            .mock_async(|when, then| {
                when.method(GET).path("/agent-card");
                then.status(200)
                    .json_body(json!({"agentId": "hotel-finder-003", "endpointUrl": "http://x"}));
            })
            .await;

        let discovery = AgentDiscovery::new(
            Client::new(),
            vec![
                good.base_url(),
                incomplete.base_url(),
                "http://127.0.0.1:9".to_string(),
            ],
        )
        .with_card_timeout(Duration::from_secs(1));

        let cards = discovery.discover().await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].agent_id, "flight-booker-002");
    }

    #[tokio::test]
    async fn test_build_registry_prefers_static_entries() {
        let agent = MockServer::start_async().await;
        agent
            .mock_async(|when, then| {
                when.method(GET).path("/agent-card");
                then.status(200).json_body(json!({
                    "agentId": "car-rental-004",
                    "endpointUrl": "http://127.0.0.1:5003",
                    "capabilities": [{"capabilityId": "searchCars"}, {"capabilityId": "bookCar"}]
                }));
            })
            .await;

        let config = PlannerConfig::from_toml_str(&format!(
            r#"
[discovery]
agents = ["{}"]

[[capabilities]]
capability_id = "bookCar"
endpoint_url = "http://cars.override:9000"
agent_id = "car-override"
"#,
            agent.base_url()
        ))
        .unwrap();

        let registry = build_registry(&config, &Client::new()).await;
        assert_eq!(registry.capability_ids(), vec!["bookCar", "searchCars"]);
        assert_eq!(registry.agent_for("bookCar"), Some("car-override"));
        assert_eq!(registry.agent_for("searchCars"), Some("car-rental-004"));
    }

    #[tokio::test]
    async fn test_no_agents_yields_empty_registry() {
        let config = PlannerConfig::from_toml_str("[discovery]\nagents = []\n").unwrap();
        let registry = build_registry(&config, &Client::new()).await;
        assert!(registry.is_empty());
    }
}
