use serde::{Deserialize, Serialize};

/// 代理對外公布的能力描述 (agent card)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub agent_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub capabilities: Vec<CapabilityDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub capability_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CapabilityDescriptor {
    /// 未提供 path 時預設為 `/<capabilityId>`
    pub fn resolved_path(&self) -> String {
        match self.path.as_deref() {
            Some(path) if path.starts_with('/') => path.to_string(),
            Some(path) if !path.is_empty() => format!("/{}", path),
            _ => format!("/{}", self.capability_id),
        }
    }
}

impl AgentCard {
    pub fn is_usable(&self) -> bool {
        !self.agent_id.trim().is_empty()
            && !self.endpoint_url.trim().is_empty()
            && self
                .capabilities
                .iter()
                .any(|cap| !cap.capability_id.trim().is_empty())
    }

    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.agent_id
        } else {
            &self.display_name
        }
    }

    /// 規劃代理本身的 agent card
    pub fn planner(endpoint_url: impl Into<String>) -> Self {
        Self {
            agent_id: "travel-planner-001".to_string(),
            display_name: "TripMaster AI Planner".to_string(),
            description:
                "Coordinates flight, hotel, and car rental bookings based on user travel requests."
                    .to_string(),
            endpoint_url: endpoint_url.into(),
            capabilities: vec![CapabilityDescriptor {
                capability_id: "planTrip".to_string(),
                description: "Takes a natural language travel request, calls the relevant specialist agents and returns the aggregated booking result.".to_string(),
                path: Some("/planTrip".to_string()),
            }],
            definitions: None,
        }
    }
}
