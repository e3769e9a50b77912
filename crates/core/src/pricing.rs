//! The quote engine: one deterministic pathway for every vehicle class.
//!
//! Rules apply in a fixed order (base rate, mid-range surcharge, short-route
//! markup, corridor floors, category rules, class multiplier, enclosed
//! markup, absolute minimum). The order is load-bearing: corridor floors run
//! before the category uplift band, so a floored price can land inside the
//! band and be uplifted again. Every application is recorded in the trace so
//! the interaction stays observable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::route::RouteCorridor;
use crate::domain::vehicle::{VehicleCategory, VehicleSelection};

/// Base dollars-per-mile rate shared by every vehicle class.
const BASE_RATE_PER_MILE: f64 = 0.614;
/// Trips at or under this mileage carry a 10% surcharge.
const MID_RANGE_CUTOFF_MILES: f64 = 800.0;
const MID_RANGE_SURCHARGE: f64 = 1.10;
/// Car/truck/suv routes under this mileage carry a 40% markup.
const SHORT_ROUTE_CUTOFF_MILES: f64 = 1500.0;
const SHORT_ROUTE_CAR_MARKUP: f64 = 1.40;
/// Enclosed transport is a fixed markup over open transport.
const ENCLOSED_MULTIPLIER: f64 = 1.40;
/// No quote leaves the engine below this, open or enclosed.
const ABSOLUTE_MINIMUM: f64 = 695.0;
/// Car/truck/suv prices in this band (after floors) get a 20% uplift.
const CAR_UPLIFT_BAND: std::ops::RangeInclusive<f64> = 696.0..=1070.0;
const CAR_UPLIFT: f64 = 1.2;
const CAR_MINIMUM: f64 = 695.0;
const RV_MINIMUM: f64 = 750.0;
const RV_SHORT_ROUTE_UPLIFT: f64 = 1.3;
/// A transit day covers roughly this many miles, plus one day of slack.
const MILES_PER_TRANSIT_DAY: f64 = 400.0;

const NO_DISTANCE_MESSAGE: &str = "Unable to calculate distance. Please try again.";
const SHORT_HAUL_MESSAGE: &str =
    "For short distances under 100 miles, please contact us directly for a custom quote.";
const SHORT_HAUL_CUTOFF_MILES: f64 = 100.0;

/// One quote computation's inputs. Distance arrives from the external
/// mileage lookup; the engine never computes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub distance_miles: f64,
    pub vehicle: VehicleSelection,
    /// Reserved for seasonal adjustments; no pricing rule reads it yet.
    pub ship_date: Option<NaiveDate>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: f64,
}

/// Ordered record of every rule that touched the price.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub steps: Vec<PricingTraceStep>,
}

impl PricingTrace {
    fn record(&mut self, stage: &str, detail: impl Into<String>, amount: f64) {
        self.steps.push(PricingTraceStep {
            stage: stage.to_string(),
            detail: detail.into(),
            amount,
        });
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.stage.as_str()).collect()
    }
}

/// Whole-dollar quote. Sentinel cases (no distance, short haul) come back
/// with zero prices and a user-facing message instead of an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub open_transport: u32,
    pub enclosed_transport: u32,
    pub transit_time_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub trace: PricingTrace,
}

impl QuoteResult {
    fn sentinel(transit_time_days: u32, message: &str, trace: PricingTrace) -> Self {
        Self {
            open_transport: 0,
            enclosed_transport: 0,
            transit_time_days,
            message: Some(message.to_string()),
            trace,
        }
    }
}

/// Price a shipment. Pure: identical requests produce identical results,
/// and no input can make it fail.
pub fn quote(request: &QuoteRequest) -> QuoteResult {
    let mut trace = PricingTrace::default();
    let distance = request.distance_miles;

    if !distance.is_finite() || distance <= 0.0 {
        return QuoteResult::sentinel(0, NO_DISTANCE_MESSAGE, trace);
    }

    let transit_time_days = (distance / MILES_PER_TRANSIT_DAY).ceil() as u32 + 1;

    if distance <= SHORT_HAUL_CUTOFF_MILES {
        trace.record(
            "short_haul",
            format!("{distance:.0} miles is at or under the {SHORT_HAUL_CUTOFF_MILES:.0} mile custom-quote cutoff"),
            0.0,
        );
        return QuoteResult::sentinel(transit_time_days, SHORT_HAUL_MESSAGE, trace);
    }

    let corridor = RouteCorridor::detect(
        &request.vehicle,
        request.pickup_location.as_deref(),
        request.dropoff_location.as_deref(),
    );

    let mut price = distance * BASE_RATE_PER_MILE;
    trace.record("base", format!("{distance:.0} miles x ${BASE_RATE_PER_MILE}/mile"), price);

    if distance <= MID_RANGE_CUTOFF_MILES {
        price *= MID_RANGE_SURCHARGE;
        trace.record(
            "mid_range_surcharge",
            format!("10% surcharge for trips of {MID_RANGE_CUTOFF_MILES:.0} miles or less"),
            price,
        );
    }

    let category = request.vehicle.category();

    if category == VehicleCategory::CarTruckSuv && distance < SHORT_ROUTE_CUTOFF_MILES {
        price *= SHORT_ROUTE_CAR_MARKUP;
        trace.record(
            "short_route_markup",
            format!("40% markup for car/truck/suv routes under {SHORT_ROUTE_CUTOFF_MILES:.0} miles"),
            price,
        );
    }

    if let Some(corridor) = corridor {
        let floor = corridor.floor();
        if price < floor {
            price = floor;
            trace.record(
                "corridor_floor",
                format!("{} lane minimum ${floor:.0}", corridor.label()),
                price,
            );
        }
    }

    match category {
        VehicleCategory::CarTruckSuv => {
            if price < CAR_MINIMUM {
                price = CAR_MINIMUM;
                trace.record("category_floor", format!("car/truck/suv minimum ${CAR_MINIMUM:.0}"), price);
            }
            if CAR_UPLIFT_BAND.contains(&price) {
                price = (price * CAR_UPLIFT).round();
                trace.record(
                    "middle_band_uplift",
                    "20% uplift for car/truck/suv prices between $696 and $1,070",
                    price,
                );
            }
        }
        VehicleCategory::Rv => {
            // Floor and uplift are mutually exclusive: a floored price is
            // never uplifted on top.
            if price < RV_MINIMUM {
                price = RV_MINIMUM;
                trace.record("category_floor", format!("rv minimum ${RV_MINIMUM:.0}"), price);
            } else if distance < SHORT_ROUTE_CUTOFF_MILES {
                price = (price * RV_SHORT_ROUTE_UPLIFT).round();
                trace.record(
                    "rv_short_route_uplift",
                    format!("30% uplift for rv routes under {SHORT_ROUTE_CUTOFF_MILES:.0} miles"),
                    price,
                );
            }
        }
        VehicleCategory::Other => {
            if price < ABSOLUTE_MINIMUM {
                price = ABSOLUTE_MINIMUM;
                trace.record("category_floor", format!("fallback minimum ${ABSOLUTE_MINIMUM:.0}"), price);
            }
        }
    }

    let multiplier = match &request.vehicle {
        VehicleSelection::Known(vehicle) => vehicle.rate_multiplier(),
        VehicleSelection::Unknown(label) => {
            tracing::warn!(
                vehicle_type = %label,
                "unrecognized vehicle type, defaulting rate multiplier to 1.0"
            );
            1.0
        }
    };
    let mut open = price * multiplier;
    trace.record(
        "vehicle_multiplier",
        format!("x{multiplier} for {}", request.vehicle.label()),
        open,
    );

    let mut enclosed = open * ENCLOSED_MULTIPLIER;
    trace.record("enclosed", format!("open x{ENCLOSED_MULTIPLIER}"), enclosed);

    // Applied to each side independently, so the enclosed/open ratio is not
    // guaranteed to survive this step.
    if open < ABSOLUTE_MINIMUM {
        open = ABSOLUTE_MINIMUM;
        trace.record("absolute_minimum", "open transport raised to $695", open);
    }
    if enclosed < ABSOLUTE_MINIMUM {
        enclosed = ABSOLUTE_MINIMUM;
        trace.record("absolute_minimum", "enclosed transport raised to $695", enclosed);
    }

    QuoteResult {
        open_transport: open.round() as u32,
        enclosed_transport: enclosed.round() as u32,
        transit_time_days,
        message: None,
        trace,
    }
}
