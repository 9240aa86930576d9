//! Fuel cost estimates and the tracked pump price.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::form::parse_amount;
use crate::sampler::Sampler;

/// Largest change applied by a single [`FuelPrice::refresh`], either way.
pub const MAX_PRICE_SWING: f64 = 0.25;

/// Estimate the fuel cost of driving `distance`.
///
/// `distance` is free text such as `"568 km"`; everything but digits and
/// dots is discarded before parsing. Returns 0 when the distance is absent
/// or unparseable, or when `price_per_liter` is zero. The result is rounded
/// to 2 decimals.
///
/// ```
/// use loadboard::fuel::estimate_fuel_cost;
///
/// assert_eq!(estimate_fuel_cost(Some("568 km"), 3.5, 23.45), 466.19);
/// assert_eq!(estimate_fuel_cost(None, 3.5, 23.45), 0.0);
/// ```
pub fn estimate_fuel_cost(distance: Option<&str>, liters_per_100km: f64, price_per_liter: f64) -> f64 {
    if price_per_liter == 0.0 {
        return 0.0;
    }
    let Some(km) = distance.and_then(parse_amount) else {
        return 0.0;
    };
    round_cents(km * liters_per_100km / 100.0 * price_per_liter)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current price per liter and when it was last refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelPrice {
    pub per_liter: f64,
    pub last_updated: DateTime<Local>,
}

impl FuelPrice {
    pub fn new(per_liter: f64) -> Self {
        Self {
            per_liter,
            last_updated: Local::now(),
        }
    }

    /// Move the price by a random amount within [`MAX_PRICE_SWING`] and
    /// stamp the update time. Returns the new price.
    pub fn refresh(&mut self, sampler: &mut dyn Sampler) -> f64 {
        let swing = (sampler.next_unit() - 0.5) * 2.0 * MAX_PRICE_SWING;
        self.per_liter = round_cents(self.per_liter + swing);
        self.last_updated = Local::now();
        self.per_liter
    }

    /// Cost estimate for `distance` at the current price.
    pub fn estimate(&self, distance: Option<&str>, liters_per_100km: f64) -> f64 {
        estimate_fuel_cost(distance, liters_per_100km, self.per_liter)
    }
}
