//! Fixed notification texts.

use crate::load::Load;
use crate::notification::{NotificationDraft, NotificationKind};

/// Background notifications the board simulates, as `(title, message, kind)`.
pub const SIMULATED: [(&str, &str, NotificationKind); 5] = [
    (
        "New Load Available",
        "High-priority load from Johannesburg to Durban - R15,500",
        NotificationKind::Load,
    ),
    (
        "GPS Alert",
        "Vehicle VH001 has deviated from route",
        NotificationKind::Alert,
    ),
    (
        "Delivery Confirmation",
        "Load LD002 successfully delivered",
        NotificationKind::Delivery,
    ),
    (
        "Fuel Price Update",
        "Current fuel price: R23.67/L (+R0.22)",
        NotificationKind::Fuel,
    ),
    (
        "QR Code Scanned",
        "Load LD001 QR code verified at pickup location",
        NotificationKind::Scan,
    ),
];

/// Messages raised by the geofence check on a GPS sample.
pub const GEOFENCE_ALERTS: [&str; 4] = [
    "Approaching delivery zone",
    "Entered pickup location",
    "Route deviation detected",
    "Speed limit exceeded",
];

pub fn simulated(index: usize) -> NotificationDraft {
    let (title, message, kind) = SIMULATED[index % SIMULATED.len()];
    NotificationDraft::new(kind, title, message)
}

pub fn geofence_alert(index: usize) -> NotificationDraft {
    let message = GEOFENCE_ALERTS[index % GEOFENCE_ALERTS.len()];
    NotificationDraft::new(NotificationKind::Gps, "GPS Alert", message)
}

pub fn load_accepted(id: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Success,
        "Load Accepted",
        format!("Load {id} accepted. GPS tracking will begin at pickup."),
    )
}

pub fn load_posted(id: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Success,
        "Load Posted Successfully",
        format!("Load {id} is now visible to transport operators"),
    )
}

pub fn qr_scanned(load: &Load) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Scan,
        "QR Code Scanned",
        format!("Load {} verified. Status: {}", load.id(), load.status),
    )
}

pub fn delivery_confirmed(id: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Delivery,
        "Delivery Confirmation",
        format!("Load {id} successfully delivered"),
    )
}

pub fn photo_captured() -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Pod,
        "Photo Captured",
        "Delivery photo saved to load documentation",
    )
}
