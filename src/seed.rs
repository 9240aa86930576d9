//! Sample data the board starts with.

use chrono::NaiveDate;

use crate::dashboard::Vehicle;
use crate::form::DEFAULT_CARGO_TYPE;
use crate::load::{GeoPoint, Load, LoadStatus, Urgency};

/// Johannesburg depot: the default pickup point and GPS starting position.
pub const HOME_BASE: GeoPoint = GeoPoint::new(-26.2041, 28.0473);

struct SeedLoad {
    id: &'static str,
    origin: &'static str,
    destination: &'static str,
    weight: &'static str,
    cargo_type: &'static str,
    rate: &'static str,
    distance: &'static str,
    urgency: Urgency,
    status: LoadStatus,
    shipper: &'static str,
    shipper_contact: &'static str,
    pickup: (i32, u32, u32),
    delivery: (i32, u32, u32),
    points: (GeoPoint, GeoPoint),
    progress: u8,
}

const SEED_LOADS: [SeedLoad; 3] = [
    SeedLoad {
        id: "LD001",
        origin: "Johannesburg, GP",
        destination: "Durban, KZN",
        weight: "25 tons",
        cargo_type: DEFAULT_CARGO_TYPE,
        rate: "R15,500",
        distance: "568 km",
        urgency: Urgency::High,
        status: LoadStatus::Available,
        shipper: "ABC Manufacturing",
        shipper_contact: "+27 11 123 4567",
        pickup: (2025, 9, 9),
        delivery: (2025, 9, 10),
        points: (HOME_BASE, GeoPoint::new(-29.8587, 31.0218)),
        progress: 0,
    },
    SeedLoad {
        id: "LD002",
        origin: "Cape Town, WC",
        destination: "Port Elizabeth, EC",
        weight: "18 tons",
        cargo_type: "Food Products",
        rate: "R8,200",
        distance: "745 km",
        urgency: Urgency::Medium,
        status: LoadStatus::InTransit,
        shipper: "FreshPro Foods",
        shipper_contact: "+27 21 456 7890",
        pickup: (2025, 9, 8),
        delivery: (2025, 9, 9),
        points: (
            GeoPoint::new(-33.9249, 18.4241),
            GeoPoint::new(-33.9608, 25.6022),
        ),
        progress: 65,
    },
    SeedLoad {
        id: "LD003",
        origin: "Bloemfontein, FS",
        destination: "Polokwane, LP",
        weight: "30 tons",
        cargo_type: "Construction Materials",
        rate: "R12,800",
        distance: "456 km",
        urgency: Urgency::Low,
        status: LoadStatus::Available,
        shipper: "BuildCorp Ltd",
        shipper_contact: "+27 51 789 0123",
        pickup: (2025, 9, 11),
        delivery: (2025, 9, 12),
        points: (
            GeoPoint::new(-29.1217, 26.2041),
            GeoPoint::new(-23.9045, 29.4689),
        ),
        progress: 0,
    },
];

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// The three loads on the board at startup, in store order.
pub fn loads() -> Vec<Load> {
    SEED_LOADS
        .iter()
        .map(|s| {
            let mut load = Load::new(s.id, s.origin, s.destination, ymd(s.pickup), s.points.0);
            load.weight = s.weight.to_string();
            load.cargo_type = s.cargo_type.to_string();
            load.rate = s.rate.to_string();
            load.distance = Some(s.distance.to_string());
            load.urgency = s.urgency;
            load.status = s.status;
            load.shipper = s.shipper.to_string();
            load.shipper_contact = s.shipper_contact.to_string();
            load.delivery = ymd(s.delivery);
            load.coordinates.delivery = Some(s.points.1);
            load.progress = s.progress;
            load
        })
        .collect()
}

/// The fleet tracked on the dashboard at startup.
pub fn vehicles() -> Vec<Vehicle> {
    vec![Vehicle {
        id: "VH001".to_string(),
        driver_name: "John Mthembu".to_string(),
        vehicle_number: "GP 123 ABC".to_string(),
        current_load: Some("LD002".to_string()),
        location: GeoPoint::new(-33.5, 20.1),
        speed: 85,
        fuel_level: 75,
        status: LoadStatus::InTransit,
    }]
}
