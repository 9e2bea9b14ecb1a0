//! Application layer driving a payment from form input to a terminal record.
//!
//! `machine` holds the workflow state and the rules for moving between phases.
//! `session` runs a machine inside a tokio task and feeds it cooldown ticks.
//! `friction_gate` and `cooldown` are the pure pieces the machine is built on.

pub mod cooldown;
pub mod friction_gate;
pub mod machine;
pub mod session;
