//! Load lifecycle, search and notification feed core for a freight load board.

mod actor;
pub use actor::{ControllerBuilder, ControllerHandle};
mod aggregate;
pub use aggregate::{Aggregate, execute};
pub mod catalog;
mod command;
mod config;
mod controller;
pub mod dashboard;
mod error;
pub mod form;
pub mod fuel;
pub mod load;
pub mod notification;
pub mod sampler;
pub mod seed;
pub mod simulator;
pub mod store;

pub use command::CommandContext;
pub use config::{AcceptPolicy, ControllerConfig};
pub use controller::{LifecycleOp, ScanOutcome, ScreenController, ScreenView};
pub use dashboard::{DashboardStats, Vehicle};
pub use error::{ExecuteError, LoadError};
pub use form::{FormField, LoadForm, ValidationErrors};
pub use load::{GeoPoint, Load, LoadStatus, Urgency};
pub use notification::{Notification, NotificationFeed, NotificationKind};
pub use sampler::{RandomSampler, Sampler, ScriptedSampler};
pub use simulator::{GpsSimulator, LocationEvent, LocationSample};
pub use store::{LoadFilter, LoadStore};
