//! Pure decisions over the friction directive embedded in a risk result.

use crate::domain::risk::{FrictionKind, RiskResult};
use crate::error::Rejection;

/// What the review step must do before confirmation may be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    /// Confirmation is available, but the warning must be surfaced to the user.
    AllowedWithWarning,
    PendingCooldown { seconds: u32 },
    Blocked,
}

/// The friction actually enforced: the stricter of the directive and the action.
pub fn effective_friction(risk: &RiskResult) -> FrictionKind {
    risk.friction
        .kind
        .max(FrictionKind::from(risk.recommended_action))
}

pub fn evaluate(risk: &RiskResult) -> GateDecision {
    match effective_friction(risk) {
        FrictionKind::None | FrictionKind::Toast => GateDecision::Allowed,
        FrictionKind::Modal => GateDecision::AllowedWithWarning,
        FrictionKind::Delay if risk.friction.delay_seconds == 0 => lenient_decision(risk),
        FrictionKind::Delay => GateDecision::PendingCooldown {
            seconds: risk.friction.delay_seconds,
        },
        FrictionKind::Block => GateDecision::Blocked,
    }
}

/// A zero-second DELAY imposes no wait, but any warning from the other signal stands.
fn lenient_decision(risk: &RiskResult) -> GateDecision {
    let residual = [
        risk.friction.kind,
        FrictionKind::from(risk.recommended_action),
    ]
    .into_iter()
    .filter(|kind| *kind < FrictionKind::Delay)
    .max()
    .unwrap_or(FrictionKind::None);

    if residual == FrictionKind::Modal {
        GateDecision::AllowedWithWarning
    } else {
        GateDecision::Allowed
    }
}

/// Guard for the confirm command.
///
/// `remaining` is the live cooldown count, `None` when no timer is running.
/// Confirmation is permitted iff friction is not BLOCK and any DELAY has elapsed.
pub fn check_confirm(
    risk: &RiskResult,
    cooldown_elapsed: bool,
    remaining: Option<u32>,
) -> Result<(), Rejection> {
    match evaluate(risk) {
        GateDecision::Blocked => Err(Rejection::Blocked),
        GateDecision::PendingCooldown { seconds } if !cooldown_elapsed => {
            Err(Rejection::CooldownPending {
                remaining: remaining.unwrap_or(seconds),
            })
        }
        _ => Ok(()),
    }
}
