#![recursion_limit = "256"]

pub mod config;
pub mod domain;
pub mod payload;
pub mod pricing;

pub use domain::location::{extract_city, extract_state, extract_state_code, extract_zip};
pub use domain::route::RouteCorridor;
pub use domain::vehicle::{VehicleCategory, VehicleSelection, VehicleType};
pub use payload::{format_shipment_date, webhook_body, EventType, LeadRecord, NOT_PROVIDED};
pub use pricing::{quote, PricingTrace, PricingTraceStep, QuoteRequest, QuoteResult};
