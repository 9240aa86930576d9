//! Actor loop that owns the screen controller.
//!
//! The actor runs as a tokio task and processes messages from an `mpsc`
//! channel one at a time. It exclusively owns the [`ScreenController`],
//! drives the GPS and notification timers, and holds delayed accept/post
//! completions in a `JoinSet` so they die with it.
//!
//! After every state change the actor publishes an `Arc<ScreenView>` on a
//! `watch` channel; [`ControllerHandle::view`] reads it without a
//! round-trip.
//!
//! Public API: [`ControllerHandle`] (cloneable async handle) and
//! [`ControllerBuilder`] (configures and spawns the actor).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;

use crate::command::CommandContext;
use crate::config::ControllerConfig;
use crate::controller::{LifecycleOp, ScanOutcome, ScreenController, ScreenView};
use crate::error::{ExecuteError, LoadError};
use crate::form::LoadForm;
use crate::load::Load;
use crate::notification::Notification;
use crate::sampler::{RandomSampler, Sampler};
use crate::simulator::LocationEvent;
use crate::store::{LoadFilter, LoadStore};

type Reply<T> = oneshot::Sender<T>;
type LoadReply = Reply<Result<Load, ExecuteError>>;

/// Messages sent from [`ControllerHandle`] to the actor loop.
///
/// Each variant carries a `oneshot::Sender` the actor replies on once the
/// operation completes.
pub(crate) enum ControllerMessage {
    /// Accept a load after the configured delay.
    Accept {
        id: String,
        ctx: CommandContext,
        reply: LoadReply,
    },
    /// Validate now, post after the configured delay.
    Post {
        form: LoadForm,
        ctx: CommandContext,
        reply: LoadReply,
    },
    Lifecycle {
        id: String,
        op: LifecycleOp,
        reply: Reply<Result<Load, LoadError>>,
    },
    ProofOfDelivery {
        id: String,
        reply: Reply<Result<Notification, LoadError>>,
    },
    Scan {
        load_id: String,
        reply: Reply<ScanOutcome>,
    },
    ScanPayload {
        payload: String,
        reply: Reply<ScanOutcome>,
    },
    Location {
        event: LocationEvent,
        reply: Reply<()>,
    },
    SetTracking {
        enabled: bool,
        reply: Reply<()>,
    },
    CameraPermissionDenied {
        reply: Reply<()>,
    },
    SetCameraAvailable {
        available: bool,
        reply: Reply<()>,
    },
    SetQuery {
        query: String,
        reply: Reply<()>,
    },
    SetFilter {
        filter: LoadFilter,
        reply: Reply<()>,
    },
    MarkAllRead {
        reply: Reply<()>,
    },
    RefreshFuelPrice {
        reply: Reply<f64>,
    },
}

impl ControllerMessage {
    fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::Post { .. } => "post",
            Self::Lifecycle { .. } => "lifecycle",
            Self::ProofOfDelivery { .. } => "proof_of_delivery",
            Self::Scan { .. } => "scan",
            Self::ScanPayload { .. } => "scan_payload",
            Self::Location { .. } => "location",
            Self::SetTracking { .. } => "set_tracking",
            Self::CameraPermissionDenied { .. } => "camera_permission_denied",
            Self::SetCameraAvailable { .. } => "set_camera_available",
            Self::SetQuery { .. } => "set_query",
            Self::SetFilter { .. } => "set_filter",
            Self::MarkAllRead { .. } => "mark_all_read",
            Self::RefreshFuelPrice { .. } => "refresh_fuel_price",
        }
    }
}

/// A delayed operation whose wait has elapsed.
enum Completion {
    Accept {
        id: String,
        ctx: CommandContext,
        reply: LoadReply,
    },
    Post {
        form: LoadForm,
        ctx: CommandContext,
        reply: LoadReply,
    },
}

/// Runs the controller actor loop.
///
/// Exits when shutdown is signalled or every handle has been dropped.
/// Pending completions are aborted on exit; their reply senders drop with
/// them, so waiting callers observe [`ExecuteError::Cancelled`].
async fn run_actor(
    mut controller: ScreenController,
    mut rx: mpsc::Receiver<ControllerMessage>,
    view_tx: watch::Sender<Arc<ScreenView>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let config = controller.config().clone();
    let mut gps_tick = ticker(config.gps_interval);
    let mut notification_tick = ticker(config.notification_interval);
    let mut pending: JoinSet<Completion> = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => break,

            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                match joined {
                    Ok(completion) => complete(&mut controller, completion),
                    Err(e) => tracing::error!(error = %e, "delayed completion failed"),
                }
                publish(&view_tx, &controller);
            }

            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                handle_message(&mut controller, &mut pending, &config, msg);
                publish(&view_tx, &controller);
            }

            _ = notification_tick.tick() => {
                if controller.on_notification_tick().is_some() {
                    publish(&view_tx, &controller);
                }
            }

            _ = gps_tick.tick(), if controller.is_tracking() => {
                controller.on_gps_tick();
                publish(&view_tx, &controller);
            }
        }
    }

    pending.shutdown().await;
    tracing::info!("controller actor stopped");
}

/// An interval whose first tick is one period from now.
fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn publish(view_tx: &watch::Sender<Arc<ScreenView>>, controller: &ScreenController) {
    view_tx.send_replace(Arc::new(controller.view()));
}

/// Apply one message. Delayed operations are parked in `pending`.
fn handle_message(
    controller: &mut ScreenController,
    pending: &mut JoinSet<Completion>,
    config: &ControllerConfig,
    msg: ControllerMessage,
) {
    let _span = tracing::info_span!("controller", op = msg.name()).entered();

    // If a reply receiver was dropped, the caller no longer cares about
    // the result. Silently discard it.
    match msg {
        ControllerMessage::Accept { id, ctx, reply } => {
            let delay = config.accept_delay;
            pending.spawn(async move {
                tokio::time::sleep(delay).await;
                Completion::Accept { id, ctx, reply }
            });
        }
        ControllerMessage::Post { form, ctx, reply } => {
            if let Err(errors) = form.validate() {
                let _ = reply.send(Err(LoadError::Validation(errors).into()));
                return;
            }
            let delay = config.post_delay;
            pending.spawn(async move {
                tokio::time::sleep(delay).await;
                Completion::Post { form, ctx, reply }
            });
        }
        ControllerMessage::Lifecycle { id, op, reply } => {
            let _ = reply.send(controller.apply_lifecycle(&id, op));
        }
        ControllerMessage::ProofOfDelivery { id, reply } => {
            let _ = reply.send(controller.record_proof_of_delivery(&id));
        }
        ControllerMessage::Scan { load_id, reply } => {
            let _ = reply.send(controller.scan(&load_id));
        }
        ControllerMessage::ScanPayload { payload, reply } => {
            let _ = reply.send(controller.scan_payload(&payload));
        }
        ControllerMessage::Location { event, reply } => {
            controller.on_location(event);
            let _ = reply.send(());
        }
        ControllerMessage::SetTracking { enabled, reply } => {
            controller.set_tracking(enabled);
            let _ = reply.send(());
        }
        ControllerMessage::CameraPermissionDenied { reply } => {
            controller.on_camera_permission_denied();
            let _ = reply.send(());
        }
        ControllerMessage::SetCameraAvailable { available, reply } => {
            controller.set_camera_available(available);
            let _ = reply.send(());
        }
        ControllerMessage::SetQuery { query, reply } => {
            controller.set_query(query);
            let _ = reply.send(());
        }
        ControllerMessage::SetFilter { filter, reply } => {
            controller.set_filter(filter);
            let _ = reply.send(());
        }
        ControllerMessage::MarkAllRead { reply } => {
            controller.mark_all_read();
            let _ = reply.send(());
        }
        ControllerMessage::RefreshFuelPrice { reply } => {
            let _ = reply.send(controller.refresh_fuel_price());
        }
    }
}

fn complete(controller: &mut ScreenController, completion: Completion) {
    match completion {
        Completion::Accept { id, ctx, reply } => {
            let result = controller.accept_load(&id, &ctx).map_err(ExecuteError::from);
            let _ = reply.send(result);
        }
        Completion::Post { form, ctx, reply } => {
            let result = controller.post_load(&form, &ctx).map_err(ExecuteError::from);
            let _ = reply.send(result);
        }
    }
}

/// Async handle to a running controller actor.
///
/// Lightweight, cloneable, and `Send + Sync`. Dropping every handle stops
/// the actor; [`shutdown`](ControllerHandle::shutdown) stops it explicitly
/// and waits for it to exit.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    view_rx: watch::Receiver<Arc<ScreenView>>,
    shutdown_tx: watch::Sender<bool>,
    /// Taken and awaited exactly once by `shutdown`.
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ControllerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> ControllerMessage,
    ) -> Result<T, ExecuteError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| ExecuteError::ActorGone)?;
        rx.await.map_err(|_| ExecuteError::Cancelled)
    }

    /// Accept a load. Completes after the configured accept delay.
    ///
    /// # Errors
    ///
    /// * [`ExecuteError::Domain`] -- the load is unknown or, under the
    ///   strict policy, not `Available`.
    /// * [`ExecuteError::Cancelled`] -- the actor shut down during the delay.
    /// * [`ExecuteError::ActorGone`] -- the actor has exited.
    pub async fn accept_load(&self, id: &str, ctx: CommandContext) -> Result<Load, ExecuteError> {
        let id = id.to_string();
        self.request(|reply| ControllerMessage::Accept { id, ctx, reply })
            .await?
    }

    /// Post a new load. Validation failures return immediately; a valid
    /// form completes after the configured post delay.
    ///
    /// # Errors
    ///
    /// Same as [`accept_load`](ControllerHandle::accept_load), with
    /// [`LoadError::Validation`] as the domain error.
    pub async fn post_load(&self, form: LoadForm, ctx: CommandContext) -> Result<Load, ExecuteError> {
        self.request(|reply| ControllerMessage::Post { form, ctx, reply })
            .await?
    }

    /// Look up a scanned load id.
    pub async fn scan(&self, load_id: &str) -> Result<ScanOutcome, ExecuteError> {
        let load_id = load_id.to_string();
        self.request(|reply| ControllerMessage::Scan { load_id, reply })
            .await
    }

    /// Decode and look up a raw QR payload.
    pub async fn scan_payload(&self, payload: &str) -> Result<ScanOutcome, ExecuteError> {
        let payload = payload.to_string();
        self.request(|reply| ControllerMessage::ScanPayload { payload, reply })
            .await
    }

    /// Feed a location report from an external collaborator.
    pub async fn push_location(&self, event: LocationEvent) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::Location { event, reply })
            .await
    }

    pub async fn set_tracking(&self, enabled: bool) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::SetTracking { enabled, reply })
            .await
    }

    pub async fn camera_permission_denied(&self) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::CameraPermissionDenied { reply })
            .await
    }

    /// Report the camera as usable again, e.g. after access was re-granted.
    pub async fn set_camera_available(&self, available: bool) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::SetCameraAvailable { available, reply })
            .await
    }

    pub async fn set_query(&self, query: impl Into<String>) -> Result<(), ExecuteError> {
        let query = query.into();
        self.request(|reply| ControllerMessage::SetQuery { query, reply })
            .await
    }

    pub async fn set_filter(&self, filter: LoadFilter) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::SetFilter { filter, reply })
            .await
    }

    pub async fn mark_all_read(&self) -> Result<(), ExecuteError> {
        self.request(|reply| ControllerMessage::MarkAllRead { reply })
            .await
    }

    pub async fn refresh_fuel_price(&self) -> Result<f64, ExecuteError> {
        self.request(|reply| ControllerMessage::RefreshFuelPrice { reply })
            .await
    }

    async fn lifecycle(&self, id: &str, op: LifecycleOp) -> Result<Load, ExecuteError> {
        let id = id.to_string();
        Ok(self
            .request(|reply| ControllerMessage::Lifecycle { id, op, reply })
            .await??)
    }

    pub async fn start_transit(&self, id: &str, progress: u8) -> Result<Load, ExecuteError> {
        self.lifecycle(id, LifecycleOp::StartTransit(progress)).await
    }

    pub async fn update_progress(&self, id: &str, progress: u8) -> Result<Load, ExecuteError> {
        self.lifecycle(id, LifecycleOp::UpdateProgress(progress)).await
    }

    pub async fn confirm_delivery(&self, id: &str) -> Result<Load, ExecuteError> {
        self.lifecycle(id, LifecycleOp::ConfirmDelivery).await
    }

    pub async fn mark_delayed(&self, id: &str) -> Result<Load, ExecuteError> {
        self.lifecycle(id, LifecycleOp::MarkDelayed).await
    }

    pub async fn cancel(&self, id: &str) -> Result<Load, ExecuteError> {
        self.lifecycle(id, LifecycleOp::Cancel).await
    }

    pub async fn record_proof_of_delivery(&self, id: &str) -> Result<Notification, ExecuteError> {
        let id = id.to_string();
        Ok(self
            .request(|reply| ControllerMessage::ProofOfDelivery { id, reply })
            .await??)
    }

    /// The most recently published view.
    pub fn view(&self) -> Arc<ScreenView> {
        self.view_rx.borrow().clone()
    }

    /// Stream of published views, starting with the current one.
    pub fn subscribe(&self) -> WatchStream<Arc<ScreenView>> {
        WatchStream::new(self.view_rx.clone())
    }

    /// Check whether the actor backing this handle is still running.
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Stop the actor and wait for it to exit.
    ///
    /// Pending accepts and posts are aborted; their callers receive
    /// [`ExecuteError::Cancelled`]. Calling `shutdown` more than once is
    /// safe.
    pub async fn shutdown(&self) {
        // The actor may already be gone.
        let _ = self.shutdown_tx.send(true);

        let task = self.task.lock().await.take();
        if let Some(join_handle) = task
            && let Err(e) = join_handle.await
        {
            tracing::error!(error = %e, "controller task panicked");
        }
    }
}

/// Builder for a [`ControllerHandle`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use loadboard::{ControllerBuilder, ControllerConfig};
///
/// # async fn example() {
/// let handle = ControllerBuilder::new()
///     .config(ControllerConfig {
///         accept_delay: Duration::from_millis(100),
///         ..ControllerConfig::default()
///     })
///     .spawn();
/// let view = handle.view();
/// assert_eq!(view.loads.len(), 3);
/// handle.shutdown().await;
/// # }
/// ```
pub struct ControllerBuilder {
    config: ControllerConfig,
    sampler: Option<Box<dyn Sampler>>,
    store: Option<LoadStore>,
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self {
            config: ControllerConfig::default(),
            sampler: None,
            store: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Randomness source for the simulators. Defaults to an OS-seeded RNG.
    pub fn sampler(mut self, sampler: impl Sampler) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Initial store, typically built with [`LoadStore::with_loads`].
    /// Defaults to the seeded board.
    pub fn store(mut self, store: LoadStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Spawn the actor on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> ControllerHandle {
        let sampler = self
            .sampler
            .unwrap_or_else(|| Box::new(RandomSampler::from_os_rng()));
        let store = self.store.unwrap_or_else(LoadStore::seeded);
        let channel_capacity = self.config.channel_capacity.max(1);
        let controller = ScreenController::with_store(self.config, sampler, store);

        let (tx, rx) = mpsc::channel(channel_capacity);
        let (view_tx, view_rx) = watch::channel(Arc::new(controller.view()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_actor(controller, rx, view_tx, shutdown_rx));

        ControllerHandle {
            sender: tx,
            view_rx,
            shutdown_tx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}
