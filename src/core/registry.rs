use crate::core::CapabilityHandle;
use crate::domain::model::ServiceKind;
use crate::utils::error::{PlannerError, Result};
use std::collections::HashMap;
use std::sync::Arc;

struct RegisteredCapability {
    handle: Arc<dyn CapabilityHandle>,
    agent_id: Option<String>,
}

/// 能力註冊表：啟動時建立，執行期間唯讀
pub struct CapabilityRegistry {
    capabilities: HashMap<String, RegisteredCapability>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    pub fn resolve(
        &self,
        service: ServiceKind,
        capability_id: &str,
    ) -> Result<Arc<dyn CapabilityHandle>> {
        match self.capabilities.get(capability_id) {
            Some(entry) => {
                tracing::debug!(
                    "🔎 Resolved '{}' for {} -> {}",
                    capability_id,
                    service,
                    entry.handle.describe()
                );
                Ok(Arc::clone(&entry.handle))
            }
            None => Err(PlannerError::UnknownCapability {
                service,
                capability_id: capability_id.to_string(),
            }),
        }
    }

    pub fn agent_for(&self, capability_id: &str) -> Option<&str> {
        self.capabilities
            .get(capability_id)
            .and_then(|entry| entry.agent_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// 依名稱排序的能力清單
    pub fn capability_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    capabilities: HashMap<String, RegisteredCapability>,
}

impl RegistryBuilder {
    pub fn register(self, capability_id: impl Into<String>, handle: Arc<dyn CapabilityHandle>) -> Self {
        self.insert(capability_id.into(), None, handle)
    }

    pub fn register_for_agent(
        self,
        agent_id: impl Into<String>,
        capability_id: impl Into<String>,
        handle: Arc<dyn CapabilityHandle>,
    ) -> Self {
        self.insert(capability_id.into(), Some(agent_id.into()), handle)
    }

    // 同一能力由多個代理提供時，先註冊者優先
    fn insert(
        mut self,
        capability_id: String,
        agent_id: Option<String>,
        handle: Arc<dyn CapabilityHandle>,
    ) -> Self {
        if let Some(existing) = self.capabilities.get(&capability_id) {
            tracing::warn!(
                "⚠️ Capability '{}' already provided by {:?}; ignoring duplicate from {:?}",
                capability_id,
                existing.agent_id,
                agent_id
            );
            return self;
        }
        self.capabilities
            .insert(capability_id, RegisteredCapability { handle, agent_id });
        self
    }

    pub fn build(self) -> CapabilityRegistry {
        CapabilityRegistry {
            capabilities: self.capabilities,
        }
    }
}
