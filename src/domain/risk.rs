use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Coarse classification the scoring service derives from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// One-line summary suitable for a review screen.
    pub fn summary(&self) -> &'static str {
        match self {
            RiskLevel::Low => "This transaction appears safe.",
            RiskLevel::Medium => "Some risk signals detected. Please review.",
            RiskLevel::High => "High risk detected. Transaction requires caution.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendedAction {
    Allow,
    Warn,
    Delay,
    Block,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecommendedAction::Allow => "ALLOW",
            RecommendedAction::Warn => "WARN",
            RecommendedAction::Delay => "DELAY",
            RecommendedAction::Block => "BLOCK",
        };
        f.write_str(label)
    }
}

/// Kind of friction imposed before confirmation.
///
/// Variants are declared from most lenient to strictest, so `Ord` ranks them by
/// strictness and `max` picks the stricter control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrictionKind {
    None,
    Toast,
    Modal,
    Delay,
    Block,
}

impl From<RecommendedAction> for FrictionKind {
    fn from(action: RecommendedAction) -> Self {
        match action {
            RecommendedAction::Allow => FrictionKind::None,
            RecommendedAction::Warn => FrictionKind::Modal,
            RecommendedAction::Delay => FrictionKind::Delay,
            RecommendedAction::Block => FrictionKind::Block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReason {
    pub rule_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub score_added: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrictionDirective {
    #[serde(rename = "type")]
    pub kind: FrictionKind,
    #[serde(default)]
    pub delay_seconds: u32,
    #[serde(default)]
    pub can_override: bool,
    #[serde(default)]
    pub color: String,
}

impl FrictionDirective {
    pub fn new(kind: FrictionKind, delay_seconds: u32) -> Self {
        let color = match kind {
            FrictionKind::None | FrictionKind::Toast => "green",
            FrictionKind::Modal | FrictionKind::Delay => "yellow",
            FrictionKind::Block => "red",
        };
        Self {
            kind,
            delay_seconds,
            can_override: kind != FrictionKind::Block,
            color: color.to_string(),
        }
    }
}

/// The scoring service's verdict for one draft. Opaque and immutable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub score: u8,
    pub level: RiskLevel,
    #[serde(default)]
    pub reasons: Vec<RiskReason>,
    pub recommended_action: RecommendedAction,
    pub friction: FrictionDirective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_evaluated: Option<u32>,
}

impl RiskResult {
    pub fn new(
        score: u8,
        level: RiskLevel,
        recommended_action: RecommendedAction,
        friction: FrictionDirective,
    ) -> Self {
        Self {
            score,
            level,
            reasons: Vec::new(),
            recommended_action,
            friction,
            analysis_time_ms: None,
            rules_evaluated: None,
        }
    }

    pub fn with_reason(mut self, reason: RiskReason) -> Self {
        self.reasons.push(reason);
        self
    }
}
