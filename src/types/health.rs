//! Health report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Outcome of an individual check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCheck {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackCheck {
    pub status: CheckStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCheck {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub api: ApiCheck,
    pub fallback: FallbackCheck,
    pub environment: EnvironmentCheck,
}

impl HealthChecks {
    fn failed(&self) -> usize {
        [
            self.api.status,
            self.fallback.status,
            self.environment.status,
        ]
        .iter()
        .filter(|s| **s == CheckStatus::Failed)
        .count()
    }
}

/// Result of [`MetadataOrchestrator::health`](crate::MetadataOrchestrator::health).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

impl HealthReport {
    /// Derive the overall status: one failed check degrades, more is unhealthy.
    pub fn from_checks(checks: HealthChecks) -> Self {
        let status = match checks.failed() {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        Self {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }
}
