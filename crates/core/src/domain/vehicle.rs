use serde::{Deserialize, Serialize};

/// Vehicle classes offered by the quote form.
///
/// The set is closed on purpose: pricing branches on `category()` instead of
/// substring-matching raw labels, so adding a class means adding a variant
/// here and deciding its category explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    CarTruckSuv,
    Boat,
    GolfCart,
    Motorcycle,
    RvFifthWheel,
    TravelTrailer,
    AtvUtv,
    HeavyEquipment,
    Other,
}

/// Pricing category a vehicle class falls into. Only these three carry
/// distinct minimum/uplift rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleCategory {
    CarTruckSuv,
    Rv,
    Other,
}

impl VehicleType {
    pub const ALL: [VehicleType; 9] = [
        VehicleType::CarTruckSuv,
        VehicleType::Boat,
        VehicleType::GolfCart,
        VehicleType::Motorcycle,
        VehicleType::RvFifthWheel,
        VehicleType::TravelTrailer,
        VehicleType::AtvUtv,
        VehicleType::HeavyEquipment,
        VehicleType::Other,
    ];

    /// Parse the label the form sends. Accepts the bare `car`/`truck`/`suv`
    /// and `rv` spellings older form revisions submitted.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "car/truck/suv" | "car" | "truck" | "suv" => Some(Self::CarTruckSuv),
            "boat" => Some(Self::Boat),
            "golf cart" => Some(Self::GolfCart),
            "motorcycle" => Some(Self::Motorcycle),
            "rv/5th wheel" | "rv" => Some(Self::RvFifthWheel),
            "travel trailer" => Some(Self::TravelTrailer),
            "atv/utv" => Some(Self::AtvUtv),
            "heavy equipment" => Some(Self::HeavyEquipment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// The canonical label as the form and downstream automation spell it.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CarTruckSuv => "car/truck/suv",
            Self::Boat => "boat",
            Self::GolfCart => "golf cart",
            Self::Motorcycle => "motorcycle",
            Self::RvFifthWheel => "rv/5th wheel",
            Self::TravelTrailer => "travel trailer",
            Self::AtvUtv => "atv/utv",
            Self::HeavyEquipment => "heavy equipment",
            Self::Other => "other",
        }
    }

    /// Fixed per-class factor applied after every minimum and uplift rule.
    pub fn rate_multiplier(&self) -> f64 {
        match self {
            Self::CarTruckSuv => 1.0,
            Self::Boat => 1.4,
            Self::GolfCart => 0.8,
            Self::Motorcycle => 0.7,
            Self::RvFifthWheel => 1.8,
            Self::TravelTrailer => 1.6,
            Self::AtvUtv => 0.75,
            Self::HeavyEquipment => 2.0,
            Self::Other => 1.3,
        }
    }

    pub fn category(&self) -> VehicleCategory {
        match self {
            Self::CarTruckSuv => VehicleCategory::CarTruckSuv,
            Self::RvFifthWheel => VehicleCategory::Rv,
            _ => VehicleCategory::Other,
        }
    }
}

/// What a submission actually carried: a recognized class, or a raw label we
/// keep verbatim. Unknown labels price like `Other` with a x1.0 multiplier
/// (never an error); the engine logs the fallback once per quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleSelection {
    Known(VehicleType),
    Unknown(String),
}

impl VehicleSelection {
    pub fn from_label(label: &str) -> Self {
        match VehicleType::parse(label) {
            Some(vehicle) => Self::Known(vehicle),
            None => Self::Unknown(label.trim().to_string()),
        }
    }

    pub fn known(&self) -> Option<VehicleType> {
        match self {
            Self::Known(vehicle) => Some(*vehicle),
            Self::Unknown(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(vehicle) => vehicle.label(),
            Self::Unknown(label) => label,
        }
    }

    pub fn category(&self) -> VehicleCategory {
        match self {
            Self::Known(vehicle) => vehicle.category(),
            Self::Unknown(_) => VehicleCategory::Other,
        }
    }
}
