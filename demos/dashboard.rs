//! Walk through a short session on the load board: track, scan, post,
//! accept, then print the dashboard as JSON.
//!
//! Run with: `cargo run --example dashboard`
//!
//! Set `RUST_LOG=loadboard=debug` to see simulated GPS samples.

use std::time::Duration;

use chrono::Local;
use loadboard::{CommandContext, ControllerBuilder, ControllerConfig, LoadFilter, LoadForm};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Shorten the simulated round-trips so the walkthrough is quick.
    let config = ControllerConfig {
        gps_interval: Duration::from_millis(500),
        accept_delay: Duration::from_millis(300),
        post_delay: Duration::from_millis(300),
        ..ControllerConfig::default()
    };
    let board = ControllerBuilder::new().config(config).spawn();

    board.set_tracking(true).await?;
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let outcome = board.scan_payload("LD002-QR-CODE").await?;
    println!("scan: {outcome:?}");

    let form = LoadForm::new(Local::now().date_naive())
        .route("Pretoria, GP", "Nelspruit, MP")
        .weight("12")
        .rate("9,400")
        .urgent(true);
    let posted = board.post_load(form, CommandContext::default()).await?;
    println!("posted {} ({})", posted.id(), posted.rate);

    let ctx = CommandContext::default().with_correlation_id("demo-accept");
    let accepted = board.accept_load(posted.id(), ctx).await?;
    println!("{} is now {}", accepted.id(), accepted.status);

    board.set_filter(LoadFilter::Today).await?;
    let view = board.view();
    println!("{}", serde_json::to_string_pretty(&view.dashboard)?);
    println!(
        "{} load(s) picked up today, {} unread notification(s)",
        view.loads.len(),
        view.unread_count
    );
    for n in view.notifications.iter().take(5) {
        println!("  [{}] {} {}: {}", n.time, n.kind, n.title, n.message);
    }

    board.shutdown().await;
    Ok(())
}
