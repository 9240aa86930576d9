//! End-to-end behavior of the board through the public API.

use std::time::Duration;

use chrono::NaiveDate;
use loadboard::fuel::estimate_fuel_cost;
use loadboard::simulator::GpsSimulator;
use loadboard::{
    AcceptPolicy, CommandContext, ControllerBuilder, ControllerConfig, ExecuteError, FormField,
    LoadError, LoadFilter, LoadForm, LoadStatus, LoadStore, LocationEvent, NotificationFeed,
    NotificationKind, ScanOutcome, ScriptedSampler, seed,
};

fn pickup_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 15).expect("valid date")
}

fn minimal_form() -> LoadForm {
    LoadForm::new(pickup_date())
        .route("A", "B")
        .weight("10")
        .rate("1000")
}

fn seeded_store() -> LoadStore {
    LoadStore::with_loads(seed::loads()).expect("seed loads are consistent")
}

fn ids(store: &LoadStore, query: &str, filter: LoadFilter) -> Vec<String> {
    store
        .search(query, filter)
        .iter()
        .map(|l| l.id().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[test]
fn qr_codes_track_ids_through_every_mutation() {
    let mut store = seeded_store();
    store.post(&minimal_form()).unwrap();
    store.accept("LD001", "operator").unwrap();
    store.update_progress("LD002", 90).unwrap();
    store.confirm_delivery("LD002").unwrap();
    store.cancel("LD003").unwrap();

    for load in store.iter() {
        assert_eq!(load.qr_code(), format!("{}-QR-CODE", load.id()));
    }
}

#[test]
fn search_on_seed_data() {
    let store = seeded_store();
    assert_eq!(ids(&store, "", LoadFilter::All), ["LD001", "LD002", "LD003"]);
    assert_eq!(ids(&store, "LD002", LoadFilter::All), ["LD002"]);
    assert_eq!(ids(&store, "", LoadFilter::Urgent), ["LD001"]);
}

#[test]
fn post_with_empty_pickup_fails_and_leaves_store_unchanged() {
    let mut store = seeded_store();
    let form = LoadForm {
        pickup_location: String::new(),
        ..minimal_form()
    };
    let err = store.post(&form).unwrap_err();
    let LoadError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        errors.get(FormField::PickupLocation),
        Some("Pickup location is required")
    );
    assert_eq!(store.len(), 3);
}

#[test]
fn post_on_three_load_store_yields_ld004_first() {
    let mut store = seeded_store();
    let load = store.post(&minimal_form()).unwrap();
    assert_eq!(load.id(), "LD004");
    assert_eq!(load.status, LoadStatus::Available);
    assert_eq!(load.progress, 0);
    assert_eq!(store.len(), 4);
    assert_eq!(store.iter().next().map(|l| l.id()), Some("LD004"));
}

#[test]
fn accept_then_unknown_accept() {
    let mut store = seeded_store();
    let load = store.accept("LD001", "operator").unwrap();
    assert_eq!(load.status, LoadStatus::Accepted);
    assert_eq!(load.accepted_by.as_deref(), Some("operator"));

    let snapshot: Vec<_> = store.iter().cloned().collect();
    assert_eq!(
        store.accept("LD999", "operator").unwrap_err(),
        LoadError::NotFound("LD999".into())
    );
    assert_eq!(store.iter().cloned().collect::<Vec<_>>(), snapshot);
}

#[test]
fn strict_policy_rejects_non_available_accept() {
    let mut store = seeded_store().with_accept_policy(AcceptPolicy::Strict);
    assert!(store.accept("LD001", "operator").is_ok());
    assert!(matches!(
        store.accept("LD001", "operator"),
        Err(LoadError::InvalidState {
            status: LoadStatus::Accepted,
            ..
        })
    ));
}

#[test]
fn fuel_estimate_matches_formula() {
    let expected = (568.0_f64 * 3.5 / 100.0 * 23.45 * 100.0).round() / 100.0;
    assert_eq!(estimate_fuel_cost(Some("568 km"), 3.5, 23.45), expected);
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[test]
fn unread_count_tracks_read_flags() {
    let mut feed = NotificationFeed::with_capacity(4);
    let check = |feed: &NotificationFeed| {
        assert_eq!(
            feed.unread_count(),
            feed.iter().filter(|n| !n.read).count()
        );
    };

    for n in 0..3 {
        feed.push(loadboard::catalog::simulated(n));
        check(&feed);
    }
    feed.mark_all_read();
    check(&feed);
    for n in 0..4 {
        feed.push(loadboard::catalog::geofence_alert(n));
        check(&feed);
    }
    assert_eq!(feed.len(), 4);
}

#[test]
fn mark_all_read_twice_preserves_content() {
    let mut feed = NotificationFeed::new();
    feed.push(loadboard::catalog::load_accepted("LD001"));
    feed.push(loadboard::catalog::photo_captured());
    let before: Vec<_> = feed
        .iter()
        .map(|n| (n.id, n.title.clone(), n.message.clone()))
        .collect();

    feed.mark_all_read();
    assert_eq!(feed.unread_count(), 0);
    feed.mark_all_read();
    assert_eq!(feed.unread_count(), 0);

    let after: Vec<_> = feed
        .iter()
        .map(|n| (n.id, n.title.clone(), n.message.clone()))
        .collect();
    assert_eq!(before, after);
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shutdown_during_accept_delay_cancels_without_mutation() {
    let handle = ControllerBuilder::new()
        .sampler(ScriptedSampler::new([0.9]))
        .spawn();

    let caller = handle.clone();
    let accept =
        tokio::spawn(async move { caller.accept_load("LD001", CommandContext::default()).await });

    // Let the actor park the accept, then tear down mid-delay.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await;

    let result = accept.await.expect("caller task should not panic");
    assert!(
        matches!(result, Err(ExecuteError::Cancelled)),
        "expected Cancelled, got: {result:?}"
    );

    let view = handle.view();
    assert_eq!(view.load("LD001").map(|l| l.status), Some(LoadStatus::Available));
    assert_eq!(view.unread_count, 0);

    // Well past the original delay, nothing has fired.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        handle.view().load("LD001").map(|l| l.status),
        Some(LoadStatus::Available)
    );
    assert!(!handle.is_alive());
}

#[tokio::test(start_paused = true)]
async fn post_then_accept_through_handle() {
    let handle = ControllerBuilder::new()
        .config(ControllerConfig {
            post_delay: Duration::from_millis(20),
            accept_delay: Duration::from_millis(10),
            ..ControllerConfig::default()
        })
        .sampler(ScriptedSampler::new([0.9]))
        .spawn();

    let posted = handle
        .post_load(minimal_form().urgent(true), CommandContext::default())
        .await
        .unwrap();
    assert_eq!(posted.id(), "LD004");

    let ctx = CommandContext::default()
        .with_actor("shipper")
        .with_correlation_id("req-1");
    let accepted = handle.accept_load("LD004", ctx).await.unwrap();
    assert_eq!(accepted.accepted_by.as_deref(), Some("shipper"));

    let view = handle.view();
    assert_eq!(view.loads.len(), 4);
    assert_eq!(view.dashboard.total_loads, 4);
    let titles: Vec<_> = view.notifications.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Load Accepted", "Load Posted Successfully"]);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn scripted_sampler_drives_simulated_notifications() {
    // Notification tick: roll 0.1 (hit), pick 0.0 (first catalog entry).
    let handle = ControllerBuilder::new()
        .sampler(ScriptedSampler::new([0.1, 0.0]))
        .spawn();

    tokio::time::sleep(Duration::from_millis(15_100)).await;
    let view = handle.view();
    assert_eq!(view.notifications.len(), 1);
    assert_eq!(view.notifications[0].title, "New Load Available");
    assert_eq!(view.notifications[0].kind, NotificationKind::Load);
    assert_eq!(view.unread_count, 1);

    handle.mark_all_read().await.unwrap();
    assert_eq!(handle.view().unread_count, 0);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn scripted_sampler_drives_geofence_alert() {
    // GPS tick: lat, lng, accuracy, speed, geofence roll (hit), alert pick.
    let handle = ControllerBuilder::new()
        .config(ControllerConfig {
            notification_interval: Duration::from_secs(3600),
            ..ControllerConfig::default()
        })
        .sampler(ScriptedSampler::new([0.5, 0.5, 0.5, 0.5, 0.0, 0.0]))
        .spawn();

    handle.set_tracking(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_100)).await;

    let view = handle.view();
    let alert = view.notifications.first().expect("geofence alert");
    assert_eq!(alert.kind, NotificationKind::Gps);
    assert_eq!(alert.message, "Approaching delivery zone");
    assert_eq!(
        view.location.as_ref().map(|s| s.address.as_str()),
        Some("Moving on N1 Highway")
    );
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn permission_denials_are_inputs() {
    let handle = ControllerBuilder::new()
        .sampler(ScriptedSampler::new([0.9]))
        .spawn();

    let sample = GpsSimulator::default().next_sample(&mut ScriptedSampler::new([0.5]));
    handle.set_tracking(true).await.unwrap();
    handle
        .push_location(LocationEvent::Sample(sample))
        .await
        .unwrap();
    assert!(handle.view().location.is_some());

    handle
        .push_location(LocationEvent::PermissionDenied)
        .await
        .unwrap();
    let view = handle.view();
    assert!(!view.tracking);
    assert!(view.location.is_none());

    handle.camera_permission_denied().await.unwrap();
    assert_eq!(
        handle.scan("LD001").await.unwrap(),
        ScanOutcome::CameraUnavailable
    );
    assert!(!handle.view().camera_available);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn scans_and_filters_through_handle() {
    let handle = ControllerBuilder::new()
        .sampler(ScriptedSampler::new([0.9]))
        .spawn();

    assert!(matches!(
        handle.scan_payload("LD002-QR-CODE").await.unwrap(),
        ScanOutcome::Found(load) if load.status == LoadStatus::InTransit
    ));
    assert_eq!(
        handle.scan("LD777").await.unwrap(),
        ScanOutcome::NotFound("LD777".into())
    );

    handle.set_filter(LoadFilter::InTransit).await.unwrap();
    let view = handle.view();
    assert_eq!(view.filter, LoadFilter::InTransit);
    assert_eq!(view.loads.len(), 1);
    assert_eq!(view.notifications[0].message, "Load LD002 verified. Status: In Transit");

    let price = handle.refresh_fuel_price().await.unwrap();
    assert!((price - 23.45).abs() <= 0.25 + 1e-9);
    assert_eq!(handle.view().fuel_price.per_liter, price);
    handle.shutdown().await;
}
