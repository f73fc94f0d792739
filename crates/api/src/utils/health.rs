//! Health report served by `GET /health`

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate health of the service
///
/// Healthy only while every component is healthy.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub components: Vec<ComponentHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn new(checked_at: DateTime<Utc>) -> Self {
        Self { is_healthy: true, components: Vec::new(), checked_at }
    }

    /// Add a component, downgrading the aggregate if it is unhealthy.
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.is_healthy &= component.is_healthy;
        self.components.push(component);
        self
    }
}

/// Health of one dependency
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component identifier, e.g. `storage`.
    pub name: String,
    pub is_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    /// Healthy component with an informational note.
    pub fn healthy_with(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: Some(message.into()) }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
