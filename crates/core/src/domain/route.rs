use serde::{Deserialize, Serialize};

use crate::domain::location::extract_state_code;
use crate::domain::vehicle::{VehicleCategory, VehicleSelection};

/// Northeast destinations that make a Florida pickup a snowbird run.
const NORTHEAST_STATES: [&str; 9] = ["ME", "NH", "VT", "MA", "RI", "CT", "NY", "NJ", "PA"];

/// Named lanes that carry their own pricing floor. Corridor detection never
/// changes the base formula, only the minimum applied after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCorridor {
    /// Seasonal Florida to Northeast relocation traffic.
    Snowbird,
    /// NC/GA origins heading into New York.
    CarolinasGeorgiaToNewYork,
}

impl RouteCorridor {
    /// Corridor pricing applies only to the car/truck/suv class, and only
    /// when both endpoints carry a recognizable state code. The two lanes
    /// cannot both match: a Florida pickup is never a Carolina one.
    pub fn detect(
        vehicle: &VehicleSelection,
        pickup: Option<&str>,
        dropoff: Option<&str>,
    ) -> Option<Self> {
        if vehicle.category() != VehicleCategory::CarTruckSuv {
            return None;
        }

        let pickup_state = pickup.and_then(extract_state_code)?;
        let dropoff_state = dropoff.and_then(extract_state_code)?;

        if pickup_state == "FL" && NORTHEAST_STATES.contains(&dropoff_state) {
            return Some(Self::Snowbird);
        }
        if (pickup_state == "NC" || pickup_state == "GA") && dropoff_state == "NY" {
            return Some(Self::CarolinasGeorgiaToNewYork);
        }
        None
    }

    /// Minimum price for the lane, applied as a `max`, never additively.
    pub fn floor(&self) -> f64 {
        match self {
            Self::Snowbird => 1150.0,
            Self::CarolinasGeorgiaToNewYork => 1050.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Snowbird => "snowbird",
            Self::CarolinasGeorgiaToNewYork => "nc/ga to ny",
        }
    }
}
