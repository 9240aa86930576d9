//! Application state for the load board screen.
//!
//! [`ScreenController`] owns the store, the notification feed and the
//! simulated device state, and exposes one named operation per user action
//! or timer event. It is synchronous; the actor in [`crate::actor`] drives
//! it from tokio timers and serializes callers onto it.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::catalog;
use crate::command::CommandContext;
use crate::config::ControllerConfig;
use crate::dashboard::{DashboardStats, Vehicle};
use crate::error::LoadError;
use crate::form::LoadForm;
use crate::fuel::FuelPrice;
use crate::load::Load;
use crate::notification::{Notification, NotificationFeed};
use crate::sampler::{RandomSampler, Sampler};
use crate::seed;
use crate::simulator::{GpsSimulator, LocationEvent, LocationSample, parse_qr_payload};
use crate::store::{LoadFilter, LoadStore};

/// Result of a QR scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The scanned id matched a load; a scan notification was pushed.
    Found(Load),
    /// No load has the scanned id.
    NotFound(String),
    /// The payload is not a load QR code.
    InvalidPayload(String),
    /// Camera access was refused; nothing was scanned.
    CameraUnavailable,
}

/// Lifecycle change requested for a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    StartTransit(u8),
    UpdateProgress(u8),
    ConfirmDelivery,
    MarkDelayed,
    Cancel,
}

/// Everything presentation needs to draw the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenView {
    /// Loads matching the current query and filter, store order.
    pub loads: Vec<Load>,
    pub query: String,
    pub filter: LoadFilter,
    /// Full feed, newest first.
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub location: Option<LocationSample>,
    pub tracking: bool,
    pub camera_available: bool,
    pub fuel_price: FuelPrice,
    pub vehicles: Vec<Vehicle>,
    pub dashboard: DashboardStats,
}

impl ScreenView {
    /// The load with `id` among the visible loads.
    pub fn load(&self, id: &str) -> Option<&Load> {
        self.loads.iter().find(|l| l.id() == id)
    }
}

/// Owner of all board state.
pub struct ScreenController {
    config: ControllerConfig,
    store: LoadStore,
    feed: NotificationFeed,
    vehicles: Vec<Vehicle>,
    fuel: FuelPrice,
    gps: GpsSimulator,
    sampler: Box<dyn Sampler>,
    query: String,
    filter: LoadFilter,
    location: Option<LocationSample>,
    tracking: bool,
    camera_available: bool,
}

impl Default for ScreenController {
    fn default() -> Self {
        Self::new(ControllerConfig::default(), Box::new(RandomSampler::from_os_rng()))
    }
}

impl ScreenController {
    /// A controller over the seeded board.
    pub fn new(config: ControllerConfig, sampler: Box<dyn Sampler>) -> Self {
        Self::with_store(config, sampler, LoadStore::seeded())
    }

    /// A controller over `store`. The store adopts the configured accept
    /// policy.
    pub fn with_store(config: ControllerConfig, sampler: Box<dyn Sampler>, store: LoadStore) -> Self {
        Self {
            store: store.with_accept_policy(config.accept_policy),
            feed: NotificationFeed::with_capacity(config.feed_capacity),
            vehicles: seed::vehicles(),
            fuel: FuelPrice::new(config.fuel_price),
            gps: GpsSimulator::default(),
            sampler,
            query: String::new(),
            filter: LoadFilter::All,
            location: None,
            tracking: false,
            camera_available: true,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &LoadStore {
        &self.store
    }

    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    pub fn location(&self) -> Option<&LocationSample> {
        self.location.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_camera_available(&self) -> bool {
        self.camera_available
    }

    pub fn fuel_price(&self) -> &FuelPrice {
        &self.fuel
    }

    // -- device input -------------------------------------------------------

    /// Handle a report from the location collaborator.
    ///
    /// A sample is stored and may raise a geofence alert. A permission
    /// denial stops tracking and drops the last sample.
    pub fn on_location(&mut self, event: LocationEvent) -> Option<Notification> {
        match event {
            LocationEvent::Sample(sample) => {
                tracing::debug!(lat = sample.lat, lng = sample.lng, "location sample");
                self.location = Some(sample);
                if self.sampler.chance(self.config.geofence_probability) {
                    let alert = catalog::geofence_alert(self.sampler.pick(catalog::GEOFENCE_ALERTS.len()));
                    return Some(self.feed.push(alert));
                }
                None
            }
            LocationEvent::PermissionDenied => {
                tracing::warn!("location permission denied, tracking stopped");
                self.tracking = false;
                self.location = None;
                None
            }
        }
    }

    /// Produce a simulated GPS fix if tracking is on.
    pub fn on_gps_tick(&mut self) -> Option<LocationSample> {
        if !self.tracking {
            return None;
        }
        let sample = self.gps.next_sample(self.sampler.as_mut());
        self.on_location(LocationEvent::Sample(sample.clone()));
        Some(sample)
    }

    /// Maybe push one of the simulated background notifications.
    ///
    /// Nothing is generated once the feed holds the configured limit.
    pub fn on_notification_tick(&mut self) -> Option<Notification> {
        if self.feed.len() >= self.config.simulated_feed_limit {
            return None;
        }
        if !self.sampler.chance(self.config.notification_probability) {
            return None;
        }
        let draft = catalog::simulated(self.sampler.pick(catalog::SIMULATED.len()));
        Some(self.feed.push(draft))
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        tracing::info!(enabled, "tracking toggled");
        self.tracking = enabled;
    }

    pub fn set_camera_available(&mut self, available: bool) {
        self.camera_available = available;
    }

    /// The user refused camera access; scans report the camera as unavailable.
    pub fn on_camera_permission_denied(&mut self) {
        tracing::warn!("camera permission denied");
        self.camera_available = false;
    }

    // -- scanning -------------------------------------------------------------

    /// Look up a scanned load id.
    pub fn scan(&mut self, load_id: &str) -> ScanOutcome {
        if !self.camera_available {
            return ScanOutcome::CameraUnavailable;
        }
        match self.store.get(load_id) {
            Some(load) => {
                let load = load.clone();
                self.feed.push(catalog::qr_scanned(&load));
                tracing::info!(load_id, status = %load.status, "qr code scanned");
                ScanOutcome::Found(load)
            }
            None => {
                tracing::info!(load_id, "scanned load not found");
                ScanOutcome::NotFound(load_id.to_string())
            }
        }
    }

    /// Decode a raw `<id>-QR-CODE` payload and scan the id it carries.
    pub fn scan_payload(&mut self, payload: &str) -> ScanOutcome {
        if !self.camera_available {
            return ScanOutcome::CameraUnavailable;
        }
        match parse_qr_payload(payload) {
            Some(id) => {
                let id = id.to_string();
                self.scan(&id)
            }
            None => ScanOutcome::InvalidPayload(payload.to_string()),
        }
    }

    // -- load operations ------------------------------------------------------

    /// Accept a load for the context's actor, or the configured role.
    pub fn accept_load(&mut self, id: &str, ctx: &CommandContext) -> Result<Load, LoadError> {
        let _span = tracing::info_span!("accept_load", load_id = %id, correlation_id = %ctx.correlation()).entered();
        let actor = ctx.actor_or(&self.config.actor_role).to_string();
        let load = self.store.accept(id, &actor)?;
        self.feed.push(catalog::load_accepted(load.id()));
        Ok(load)
    }

    /// Post a new load. The pickup point defaults to the current location.
    pub fn post_load(&mut self, form: &LoadForm, ctx: &CommandContext) -> Result<Load, LoadError> {
        let _span = tracing::info_span!("post_load", correlation_id = %ctx.correlation()).entered();
        let mut form = form.clone();
        if form.pickup_point.is_none() {
            form.pickup_point = self.location.as_ref().map(LocationSample::point);
        }
        let load = self.store.post(&form)?;
        self.feed.push(catalog::load_posted(load.id()));
        Ok(load)
    }

    pub fn start_transit(&mut self, id: &str, progress: u8) -> Result<Load, LoadError> {
        self.store.start_transit(id, progress)
    }

    pub fn update_progress(&mut self, id: &str, progress: u8) -> Result<Load, LoadError> {
        self.store.update_progress(id, progress)
    }

    /// Close a load as delivered and announce it.
    pub fn confirm_delivery(&mut self, id: &str) -> Result<Load, LoadError> {
        let load = self.store.confirm_delivery(id)?;
        self.feed.push(catalog::delivery_confirmed(load.id()));
        Ok(load)
    }

    pub fn mark_delayed(&mut self, id: &str) -> Result<Load, LoadError> {
        self.store.mark_delayed(id)
    }

    pub fn cancel(&mut self, id: &str) -> Result<Load, LoadError> {
        self.store.cancel(id)
    }

    /// Dispatch a [`LifecycleOp`] to the matching operation.
    pub fn apply_lifecycle(&mut self, id: &str, op: LifecycleOp) -> Result<Load, LoadError> {
        match op {
            LifecycleOp::StartTransit(progress) => self.start_transit(id, progress),
            LifecycleOp::UpdateProgress(progress) => self.update_progress(id, progress),
            LifecycleOp::ConfirmDelivery => self.confirm_delivery(id),
            LifecycleOp::MarkDelayed => self.mark_delayed(id),
            LifecycleOp::Cancel => self.cancel(id),
        }
    }

    /// Record a delivery photo against a load.
    pub fn record_proof_of_delivery(&mut self, id: &str) -> Result<Notification, LoadError> {
        if self.store.get(id).is_none() {
            return Err(LoadError::NotFound(id.to_string()));
        }
        tracing::info!(load_id = %id, "proof of delivery captured");
        Ok(self.feed.push(catalog::photo_captured()))
    }

    /// Jitter the fuel price and return the new price per liter.
    pub fn refresh_fuel_price(&mut self) -> f64 {
        let price = self.fuel.refresh(self.sampler.as_mut());
        tracing::info!(price, "fuel price refreshed");
        price
    }

    /// Fuel cost estimate for a load's route at the current price.
    pub fn fuel_estimate(&self, id: &str) -> Result<f64, LoadError> {
        let load = self
            .store
            .get(id)
            .ok_or_else(|| LoadError::NotFound(id.to_string()))?;
        Ok(self
            .fuel
            .estimate(load.distance.as_deref(), self.config.liters_per_100km))
    }

    // -- view state -----------------------------------------------------------

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_filter(&mut self, filter: LoadFilter) {
        self.filter = filter;
    }

    pub fn mark_all_read(&mut self) {
        self.feed.mark_all_read();
    }

    /// Snapshot of the screen, filtering against today's local date.
    pub fn view(&self) -> ScreenView {
        self.view_on(Local::now().date_naive())
    }

    /// Snapshot of the screen with `today` as the current date.
    pub fn view_on(&self, today: NaiveDate) -> ScreenView {
        ScreenView {
            loads: self.store.search_on(&self.query, self.filter, today),
            query: self.query.clone(),
            filter: self.filter,
            notifications: self.feed.iter().cloned().collect(),
            unread_count: self.feed.unread_count(),
            location: self.location.clone(),
            tracking: self.tracking,
            camera_available: self.camera_available,
            fuel_price: self.fuel.clone(),
            vehicles: self.vehicles.clone(),
            dashboard: DashboardStats::compute(&self.store, &self.vehicles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormField;
    use crate::load::{GeoPoint, LoadStatus};
    use crate::notification::NotificationKind;
    use crate::sampler::ScriptedSampler;

    fn controller(script: impl IntoIterator<Item = f64>) -> ScreenController {
        ScreenController::new(
            ControllerConfig::default(),
            Box::new(ScriptedSampler::new(script)),
        )
    }

    fn form() -> LoadForm {
        LoadForm::new(NaiveDate::from_ymd_opt(2025, 9, 20).expect("valid date"))
            .route("Pretoria, GP", "Nelspruit, MP")
            .weight("12")
            .rate("9,400")
    }

    #[test]
    fn accept_pushes_success_notification() {
        let mut c = controller([0.9]);
        let load = c.accept_load("LD001", &CommandContext::default()).unwrap();
        assert_eq!(load.status, LoadStatus::Accepted);
        assert_eq!(load.accepted_by.as_deref(), Some("operator"));

        let n = c.feed().iter().next().unwrap();
        assert_eq!(n.kind, NotificationKind::Success);
        assert_eq!(n.title, "Load Accepted");
        assert_eq!(
            n.message,
            "Load LD001 accepted. GPS tracking will begin at pickup."
        );
        assert_eq!(c.feed().unread_count(), 1);
    }

    #[test]
    fn accept_records_context_actor() {
        let mut c = controller([0.9]);
        let ctx = CommandContext::default().with_actor("shipper");
        let load = c.accept_load("LD003", &ctx).unwrap();
        assert_eq!(load.accepted_by.as_deref(), Some("shipper"));
    }

    #[test]
    fn failed_accept_pushes_nothing() {
        let mut c = controller([0.9]);
        let err = c.accept_load("LD999", &CommandContext::default()).unwrap_err();
        assert_eq!(err, LoadError::NotFound("LD999".into()));
        assert!(c.feed().is_empty());
    }

    #[test]
    fn post_uses_current_location_for_pickup() {
        let mut c = controller([0.9]);
        c.set_tracking(true);
        let sample = c.on_gps_tick().unwrap();

        let load = c.post_load(&form(), &CommandContext::default()).unwrap();
        assert_eq!(load.id(), "LD004");
        assert_eq!(load.coordinates.pickup, sample.point());
        let n = c.feed().iter().next().unwrap();
        assert_eq!(n.title, "Load Posted Successfully");
        assert_eq!(n.message, "Load LD004 is now visible to transport operators");
    }

    #[test]
    fn post_keeps_explicit_pickup_point() {
        let mut c = controller([0.9]);
        let mut input = form();
        input.pickup_point = Some(GeoPoint::new(1.0, 2.0));
        let load = c.post_load(&input, &CommandContext::default()).unwrap();
        assert_eq!(load.coordinates.pickup, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn invalid_post_reports_fields_and_pushes_nothing() {
        let mut c = controller([0.9]);
        let err = c
            .post_load(&form().weight("0"), &CommandContext::default())
            .unwrap_err();
        let LoadError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.contains(FormField::Weight));
        assert!(c.feed().is_empty());
        assert_eq!(c.store().len(), 3);
    }

    #[test]
    fn scan_found_pushes_scan_notification() {
        let mut c = controller([0.9]);
        let outcome = c.scan("LD002");
        let ScanOutcome::Found(load) = outcome else {
            panic!("expected Found, got {outcome:?}");
        };
        assert_eq!(load.id(), "LD002");
        let n = c.feed().iter().next().unwrap();
        assert_eq!(n.kind, NotificationKind::Scan);
        assert_eq!(n.message, "Load LD002 verified. Status: In Transit");
    }

    #[test]
    fn scan_unknown_id_reports_not_found() {
        let mut c = controller([0.9]);
        assert_eq!(c.scan("LD404"), ScanOutcome::NotFound("LD404".into()));
        assert!(c.feed().is_empty());
    }

    #[test]
    fn scan_payload_decodes_qr_text() {
        let mut c = controller([0.9]);
        assert!(matches!(c.scan_payload("LD001-QR-CODE"), ScanOutcome::Found(_)));
        assert_eq!(
            c.scan_payload("hello"),
            ScanOutcome::InvalidPayload("hello".into())
        );
    }

    #[test]
    fn camera_denial_blocks_scans() {
        let mut c = controller([0.9]);
        c.on_camera_permission_denied();
        assert_eq!(c.scan("LD001"), ScanOutcome::CameraUnavailable);
        assert_eq!(c.scan_payload("LD001-QR-CODE"), ScanOutcome::CameraUnavailable);
        assert!(c.feed().is_empty());

        c.set_camera_available(true);
        assert!(matches!(c.scan("LD001"), ScanOutcome::Found(_)));
    }

    #[test]
    fn geofence_alert_on_low_roll() {
        // lat, lng, accuracy, speed, geofence roll, alert pick
        let mut c = controller([0.5, 0.5, 0.5, 0.5, 0.01, 0.6]);
        c.set_tracking(true);
        c.on_gps_tick().unwrap();

        let n = c.feed().iter().next().unwrap();
        assert_eq!(n.kind, NotificationKind::Gps);
        assert_eq!(n.title, "GPS Alert");
        assert_eq!(n.message, "Route deviation detected");
    }

    #[test]
    fn no_geofence_alert_on_high_roll() {
        let mut c = controller([0.5, 0.5, 0.5, 0.5, 0.9, 0.0]);
        c.set_tracking(true);
        assert!(c.on_gps_tick().is_some());
        assert!(c.feed().is_empty());
        assert!(c.location().is_some());
    }

    #[test]
    fn gps_tick_is_idle_without_tracking() {
        let mut c = controller([0.5]);
        assert!(c.on_gps_tick().is_none());
        assert!(c.location().is_none());
    }

    #[test]
    fn location_denial_stops_tracking_and_clears_sample() {
        let mut c = controller([0.9]);
        c.set_tracking(true);
        c.on_gps_tick().unwrap();
        assert!(c.on_location(LocationEvent::PermissionDenied).is_none());
        assert!(!c.is_tracking());
        assert!(c.location().is_none());
    }

    #[test]
    fn notification_tick_rolls_against_probability() {
        // First tick misses (0.9 >= 0.2). Second hits and picks index 3.
        let mut c = controller([0.9, 0.1, 0.7]);
        assert!(c.on_notification_tick().is_none());
        let n = c.on_notification_tick().unwrap();
        assert_eq!(n.title, "Fuel Price Update");
        assert_eq!(n.kind, NotificationKind::Fuel);
    }

    #[test]
    fn notification_tick_stops_at_feed_limit() {
        let config = ControllerConfig {
            simulated_feed_limit: 2,
            ..ControllerConfig::default()
        };
        let mut c = ScreenController::new(config, Box::new(ScriptedSampler::new([0.0])));
        assert!(c.on_notification_tick().is_some());
        assert!(c.on_notification_tick().is_some());
        assert!(c.on_notification_tick().is_none());
        assert_eq!(c.feed().len(), 2);
    }

    #[test]
    fn confirm_delivery_and_proof_of_delivery_notify() {
        let mut c = controller([0.9]);
        let load = c.confirm_delivery("LD002").unwrap();
        assert_eq!(load.progress, 100);
        assert_eq!(c.feed().iter().next().unwrap().kind, NotificationKind::Delivery);

        let n = c.record_proof_of_delivery("LD002").unwrap();
        assert_eq!(n.kind, NotificationKind::Pod);
        assert_eq!(n.title, "Photo Captured");
        assert!(c.record_proof_of_delivery("LD404").is_err());
        assert_eq!(c.feed().len(), 2);
    }

    #[test]
    fn lifecycle_dispatch() {
        let mut c = controller([0.9]);
        c.apply_lifecycle("LD003", LifecycleOp::StartTransit(10)).unwrap();
        let load = c.apply_lifecycle("LD003", LifecycleOp::UpdateProgress(45)).unwrap();
        assert_eq!(load.progress, 45);
        let load = c.apply_lifecycle("LD003", LifecycleOp::MarkDelayed).unwrap();
        assert_eq!(load.status, LoadStatus::Delayed);
        let load = c.apply_lifecycle("LD003", LifecycleOp::Cancel).unwrap();
        assert_eq!(load.status, LoadStatus::Cancelled);
    }

    #[test]
    fn fuel_refresh_and_estimate() {
        let mut c = controller([1.0]);
        assert_eq!(c.refresh_fuel_price(), 23.7);
        // 568 * 3.5 / 100 * 23.7 = 471.156
        assert_eq!(c.fuel_estimate("LD001").unwrap(), 471.16);
        assert!(c.fuel_estimate("LD404").is_err());
    }

    #[test]
    fn view_applies_query_and_filter() {
        let mut c = controller([0.9]);
        c.set_filter(LoadFilter::Available);
        let view = c.view();
        assert_eq!(
            view.loads.iter().map(Load::id).collect::<Vec<_>>(),
            ["LD001", "LD003"]
        );

        c.set_query("polokwane");
        let view = c.view();
        assert_eq!(view.loads.len(), 1);
        assert_eq!(view.query, "polokwane");
        assert!(view.load("LD003").is_some());
    }

    #[test]
    fn view_today_filter_uses_given_date() {
        let mut c = controller([0.9]);
        c.set_filter(LoadFilter::Today);
        let view = c.view_on(NaiveDate::from_ymd_opt(2025, 9, 11).expect("valid date"));
        assert_eq!(view.loads.iter().map(Load::id).collect::<Vec<_>>(), ["LD003"]);
    }

    #[test]
    fn mark_all_read_clears_unread_in_view() {
        let mut c = controller([0.9]);
        c.accept_load("LD001", &CommandContext::default()).unwrap();
        c.scan("LD001");
        assert_eq!(c.view().unread_count, 2);
        c.mark_all_read();
        let view = c.view();
        assert_eq!(view.unread_count, 0);
        assert!(view.notifications.iter().all(|n| n.read));
    }

    #[test]
    fn view_serializes_camel_case() {
        let c = controller([0.9]);
        let json = serde_json::to_value(c.view()).unwrap();
        assert_eq!(json["filter"], "all");
        assert_eq!(json["unreadCount"], 0);
        assert_eq!(json["cameraAvailable"], true);
        assert_eq!(json["dashboard"]["totalLoads"], 3);
        assert_eq!(json["loads"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn strict_policy_flows_from_config() {
        let config = ControllerConfig {
            accept_policy: crate::config::AcceptPolicy::Strict,
            ..ControllerConfig::default()
        };
        let mut c = ScreenController::new(config, Box::new(ScriptedSampler::default()));
        assert!(matches!(
            c.accept_load("LD002", &CommandContext::default()),
            Err(LoadError::InvalidState { .. })
        ));
    }
}
