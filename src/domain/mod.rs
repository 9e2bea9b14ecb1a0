//! Domain layer: payment drafts, risk verdicts, terminal records, and the ports
//! through which the workflow reaches external services.

pub mod draft;
pub mod ports;
pub mod record;
pub mod risk;
