//! Best-effort webhook relay for lead submissions.
//!
//! This crate owns the outbound leg of a submission: serializing the lead
//! into its dual-convention wire body, POSTing it to the automation
//! platform, and applying one bounded retry when the platform reports a
//! transient 502/503.
//!
//! ## Guarantees
//! - At most two POSTs per dispatch (one initial, one retry)
//! - Bounded, injectable diagnostics memory
//! - The attribution side-channel can never fail a dispatch
//!
//! ## Non-Guarantees
//! - Durability across restarts
//! - Exactly-once delivery
//! - Delivery ordering between concurrent dispatches

mod attribution;
mod diagnostics;
mod dispatcher;

pub use attribution::{spawn_attribution, AttributionPayload};
pub use diagnostics::{
    AttemptPhase, AttemptRecord, DiagnosticsLog, EndpointKind, RelayStats,
};
pub use dispatcher::{DeliveryOutcome, DispatchReport, Dispatcher, RelayError};
