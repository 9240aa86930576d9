//! Load aggregate: a shipment record and its status lifecycle.
//!
//! A load starts `Available`. Accepting it moves it to `Accepted`; tracking
//! updates move it `In Transit` and advance its progress; delivery
//! confirmation closes it as `Delivered` with progress 100. A load can be
//! marked `Delayed` while open, or `Cancelled`. `Delivered` and `Cancelled`
//! are terminal. Loads are never removed.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::config::AcceptPolicy;
use crate::error::LoadError;

/// Rendering of a distance that has not been computed yet.
pub const UNKNOWN_DISTANCE: &str = "--- km";

/// Suffix appended to a load id to form its QR payload.
pub const QR_CODE_SUFFIX: &str = "-QR-CODE";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Priority tier of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a load is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStatus {
    Available,
    Accepted,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Delayed,
    Cancelled,
}

impl LoadStatus {
    /// Return the display label for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Accepted => "Accepted",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Delayed => "Delayed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// `Delivered` and `Cancelled` accept no further lifecycle changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pickup point (always known) and delivery point (known once computed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub pickup: GeoPoint,
    pub delivery: Option<GeoPoint>,
}

/// A shipment on the board.
///
/// `id` and `qr_code` are fixed at construction so the QR payload can never
/// drift from the id. Everything else is plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    id: String,
    pub origin: String,
    pub destination: String,
    pub weight: String,
    pub cargo_type: String,
    pub rate: String,
    /// `None` until a route distance has been computed.
    pub distance: Option<String>,
    pub urgency: Urgency,
    pub status: LoadStatus,
    pub shipper: String,
    pub shipper_contact: String,
    pub pickup: NaiveDate,
    pub delivery: NaiveDate,
    pub coordinates: Coordinates,
    qr_code: String,
    /// Percent complete; only non-zero while in transit or once delivered.
    pub progress: u8,
    /// Role of whoever accepted the load.
    pub accepted_by: Option<String>,
}

impl Load {
    /// A fresh `Available` load with placeholder descriptive fields.
    ///
    /// Callers fill in weight, rate, shipper and the rest afterwards.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        pickup: NaiveDate,
        pickup_point: GeoPoint,
    ) -> Self {
        let id = id.into();
        let qr_code = qr_code_for(&id);
        Self {
            id,
            origin: origin.into(),
            destination: destination.into(),
            weight: String::new(),
            cargo_type: String::new(),
            rate: String::new(),
            distance: None,
            urgency: Urgency::Medium,
            status: LoadStatus::Available,
            shipper: String::new(),
            shipper_contact: String::new(),
            pickup,
            delivery: pickup,
            coordinates: Coordinates {
                pickup: pickup_point,
                delivery: None,
            },
            qr_code,
            progress: 0,
            accepted_by: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// QR payload printed on the load's paperwork (`<id>-QR-CODE`).
    pub fn qr_code(&self) -> &str {
        &self.qr_code
    }

    /// Distance text, or the unknown-distance placeholder.
    pub fn distance_label(&self) -> &str {
        self.distance.as_deref().unwrap_or(UNKNOWN_DISTANCE)
    }

    fn invalid(&self, action: &'static str) -> LoadError {
        LoadError::InvalidState {
            id: self.id.clone(),
            status: self.status,
            action,
        }
    }
}

/// QR payload for a load id.
pub fn qr_code_for(id: &str) -> String {
    format!("{id}{QR_CODE_SUFFIX}")
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by the [`Load`] aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadCommand {
    /// Take the load on behalf of `accepted_by`.
    Accept {
        accepted_by: String,
        policy: AcceptPolicy,
    },
    /// Pick the load up and begin tracking it at `progress` percent.
    StartTransit { progress: u8 },
    /// Report tracking progress for a load already in transit.
    UpdateProgress { progress: u8 },
    /// Confirm the load reached its destination.
    ConfirmDelivery,
    /// Flag the load as running late.
    MarkDelayed,
    /// Withdraw the load.
    Cancel,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by the [`Load`] aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LoadEvent {
    Accepted { accepted_by: String },
    TransitStarted { progress: u8 },
    ProgressUpdated { progress: u8 },
    Delivered,
    Delayed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for Load {
    const AGGREGATE_TYPE: &'static str = "load";
    type Command = LoadCommand;
    type DomainEvent = LoadEvent;
    type Error = LoadError;

    fn handle(&self, cmd: LoadCommand) -> Result<Vec<LoadEvent>, LoadError> {
        match cmd {
            LoadCommand::Accept {
                accepted_by,
                policy,
            } => {
                if policy == AcceptPolicy::Strict && self.status != LoadStatus::Available {
                    return Err(self.invalid("accepted"));
                }
                Ok(vec![LoadEvent::Accepted { accepted_by }])
            }
            LoadCommand::StartTransit { progress } => {
                check_progress(progress)?;
                match self.status {
                    LoadStatus::Available | LoadStatus::Accepted | LoadStatus::Delayed => {
                        Ok(vec![LoadEvent::TransitStarted { progress }])
                    }
                    _ => Err(self.invalid("put in transit")),
                }
            }
            LoadCommand::UpdateProgress { progress } => {
                check_progress(progress)?;
                if self.status != LoadStatus::InTransit {
                    return Err(self.invalid("tracked"));
                }
                if progress == self.progress {
                    return Ok(vec![]);
                }
                Ok(vec![LoadEvent::ProgressUpdated { progress }])
            }
            LoadCommand::ConfirmDelivery => {
                if self.status.is_terminal() {
                    return Err(self.invalid("delivered"));
                }
                Ok(vec![LoadEvent::Delivered])
            }
            LoadCommand::MarkDelayed => match self.status {
                LoadStatus::Delayed => Ok(vec![]),
                s if s.is_terminal() => Err(self.invalid("delayed")),
                _ => Ok(vec![LoadEvent::Delayed]),
            },
            LoadCommand::Cancel => match self.status {
                LoadStatus::Cancelled => Ok(vec![]),
                LoadStatus::Delivered => Err(self.invalid("cancelled")),
                _ => Ok(vec![LoadEvent::Cancelled]),
            },
        }
    }

    fn apply(mut self, event: &LoadEvent) -> Self {
        match event {
            LoadEvent::Accepted { accepted_by } => {
                self.status = LoadStatus::Accepted;
                self.accepted_by = Some(accepted_by.clone());
                self.progress = 0;
            }
            LoadEvent::TransitStarted { progress } => {
                self.status = LoadStatus::InTransit;
                self.progress = *progress;
            }
            LoadEvent::ProgressUpdated { progress } => {
                self.progress = *progress;
            }
            LoadEvent::Delivered => {
                self.status = LoadStatus::Delivered;
                self.progress = 100;
            }
            LoadEvent::Delayed => {
                self.status = LoadStatus::Delayed;
                self.progress = 0;
            }
            LoadEvent::Cancelled => {
                self.status = LoadStatus::Cancelled;
                self.progress = 0;
            }
        }
        self
    }
}

fn check_progress(progress: u8) -> Result<(), LoadError> {
    if progress > 100 {
        return Err(LoadError::ProgressOutOfRange(progress));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
