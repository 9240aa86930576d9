//! Simulated device collaborators: GPS samples and QR payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::load::{GeoPoint, QR_CODE_SUFFIX};
use crate::sampler::Sampler;
use crate::seed::HOME_BASE;

/// Largest per-step move in either axis, in degrees.
pub const STEP_DEGREES: f64 = 0.0005;

/// Street label reported by the simulated receiver.
pub const SIMULATED_ADDRESS: &str = "Moving on N1 Highway";

const ACCURACY_M: (f64, f64) = (10.0, 20.0);
const SPEED_KMH: (f64, f64) = (0.0, 80.0);

/// A position fix from the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    /// Meters.
    pub accuracy: f64,
    /// km/h.
    pub speed: f64,
    pub address: String,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// What the location collaborator can report.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Sample(LocationSample),
    /// The user refused location access; tracking stops.
    PermissionDenied,
}

/// Random walk standing in for a real GPS receiver.
#[derive(Debug, Clone)]
pub struct GpsSimulator {
    position: GeoPoint,
}

impl Default for GpsSimulator {
    fn default() -> Self {
        Self::new(HOME_BASE)
    }
}

impl GpsSimulator {
    pub fn new(start: GeoPoint) -> Self {
        Self { position: start }
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    /// Step the walk and report the new fix.
    pub fn next_sample(&mut self, sampler: &mut dyn Sampler) -> LocationSample {
        let step = 2.0 * STEP_DEGREES;
        self.position.lat += (sampler.next_unit() - 0.5) * step;
        self.position.lng += (sampler.next_unit() - 0.5) * step;
        LocationSample {
            lat: self.position.lat,
            lng: self.position.lng,
            accuracy: sampler.range(ACCURACY_M.0, ACCURACY_M.1),
            speed: sampler.range(SPEED_KMH.0, SPEED_KMH.1),
            address: SIMULATED_ADDRESS.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Extract the load id from a scanned `<id>-QR-CODE` payload.
///
/// ```
/// use loadboard::simulator::parse_qr_payload;
///
/// assert_eq!(parse_qr_payload("LD001-QR-CODE"), Some("LD001"));
/// assert_eq!(parse_qr_payload("https://example.com"), None);
/// ```
pub fn parse_qr_payload(payload: &str) -> Option<&str> {
    payload
        .trim()
        .strip_suffix(QR_CODE_SUFFIX)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{RandomSampler, ScriptedSampler};

    #[test]
    fn midpoint_draws_hold_position() {
        let mut gps = GpsSimulator::default();
        let sample = gps.next_sample(&mut ScriptedSampler::new([0.5]));
        assert_eq!(sample.point(), HOME_BASE);
        assert_eq!(sample.accuracy, 15.0);
        assert_eq!(sample.speed, 40.0);
        assert_eq!(sample.address, SIMULATED_ADDRESS);
    }

    #[test]
    fn walk_is_cumulative() {
        let mut gps = GpsSimulator::new(GeoPoint::new(0.0, 0.0));
        let mut sampler = ScriptedSampler::new([1.0, 0.0, 0.0, 0.0]);
        let first = gps.next_sample(&mut sampler);
        assert!((first.lat - STEP_DEGREES).abs() < 1e-12);
        assert!((first.lng + STEP_DEGREES).abs() < 1e-12);
        let second = gps.next_sample(&mut sampler);
        assert!((second.lat - 2.0 * STEP_DEGREES).abs() < 1e-12);
        assert_eq!(gps.position(), second.point());
    }

    #[test]
    fn random_samples_stay_in_bounds() {
        let mut gps = GpsSimulator::default();
        let mut sampler = RandomSampler::seeded(42);
        let mut prev = gps.position();
        for _ in 0..100 {
            let s = gps.next_sample(&mut sampler);
            assert!((s.lat - prev.lat).abs() <= STEP_DEGREES + 1e-9);
            assert!((s.lng - prev.lng).abs() <= STEP_DEGREES + 1e-9);
            assert!((10.0..20.0).contains(&s.accuracy));
            assert!((0.0..80.0).contains(&s.speed));
            prev = s.point();
        }
    }

    #[test]
    fn sample_timestamp_is_iso_8601() {
        let sample = GpsSimulator::default().next_sample(&mut ScriptedSampler::default());
        let json = serde_json::to_value(&sample).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(ts.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn qr_payloads() {
        assert_eq!(parse_qr_payload("LD002-QR-CODE"), Some("LD002"));
        assert_eq!(parse_qr_payload(" LD010-QR-CODE\n"), Some("LD010"));
        assert_eq!(parse_qr_payload("-QR-CODE"), None);
        assert_eq!(parse_qr_payload("LD002"), None);
    }
}
