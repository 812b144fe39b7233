//! Staleness/compliance scoring for secrets.
//!
//! Scoring starts at 100 and applies penalties:
//!
//! - age of the last change, using the single largest matching bracket only
//!   (>365 days −40, >180 days −25, >90 days −10; brackets are mutually
//!   exclusive, not cumulative),
//! - −20 when automatic rotation is not enabled,
//! - a flat −10 when any required tag is missing (not per missing tag).
//!
//! The result is clamped to ≥0 and bucketed: ≥90 excellent, ≥75 good,
//! ≥50 fair, otherwise poor. Scores are computed on demand and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::SecretMetadata;

/// Tags every secret is expected to carry.
pub const REQUIRED_TAGS: [&str; 3] = ["Environment", "Owner", "Application"];

/// Health bucket for a scored secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    fn from_score(score: u8) -> Self {
        match score {
            90..=100 => Self::Excellent,
            75..=89 => Self::Good,
            50..=74 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Result of scoring one secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Secret that was scored
    pub secret_name: String,

    /// 0–100
    pub score: u8,

    /// Bucket derived from the score
    pub status: HealthStatus,

    /// One entry per penalty actually applied
    pub issues: Vec<String>,

    /// One remediation hint per penalty actually applied
    pub recommendations: Vec<String>,

    /// Days since the last change, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_days: Option<i64>,

    /// Whether automatic rotation is configured
    pub rotation_enabled: bool,
}

/// Score a secret's metadata against the current time.
pub fn score(metadata: &SecretMetadata) -> HealthScore {
    score_at(metadata, Utc::now())
}

/// Score a secret's metadata against an explicit `now` (deterministic for
/// tests and replays).
pub fn score_at(metadata: &SecretMetadata, now: DateTime<Utc>) -> HealthScore {
    let mut score: i32 = 100;
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let last_changed_days = metadata
        .last_changed
        .map(|changed| (now - changed).num_days());

    // Staleness: largest matching bracket only.
    if let Some(days_old) = last_changed_days {
        if days_old > 365 {
            score -= 40;
            issues.push(format!("Secret is {days_old} days old (very stale)"));
            recommendations.push("Rotate secret immediately".to_string());
        } else if days_old > 180 {
            score -= 25;
            issues.push(format!("Secret is {days_old} days old (stale)"));
            recommendations.push("Schedule secret rotation".to_string());
        } else if days_old > 90 {
            score -= 10;
            issues.push(format!("Secret is {days_old} days old"));
            recommendations.push("Consider rotating secret".to_string());
        }
    }

    if !metadata.rotation_enabled {
        score -= 20;
        issues.push("Automatic rotation not enabled".to_string());
        recommendations.push("Enable automatic rotation".to_string());
    }

    let missing_tags: Vec<&str> = REQUIRED_TAGS
        .iter()
        .copied()
        .filter(|tag| !metadata.tags.contains_key(*tag))
        .collect();
    if !missing_tags.is_empty() {
        score -= 10;
        issues.push(format!("Missing tags: {}", missing_tags.join(", ")));
        recommendations.push("Add required tags for better organization".to_string());
    }

    let score = score.max(0) as u8;

    HealthScore {
        secret_name: metadata.name.clone(),
        score,
        status: HealthStatus::from_score(score),
        issues,
        recommendations,
        last_changed_days,
        rotation_enabled: metadata.rotation_enabled,
    }
}
