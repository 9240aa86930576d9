//! Controller configuration.
//!
//! [`ControllerConfig`] carries every timing, probability and limit the
//! controller uses. All fields have defaults matching the mobile board's
//! behavior; override individual fields with struct update syntax or
//! through [`ControllerBuilder`](crate::ControllerBuilder).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notification::FEED_CAP;

/// Precondition applied when a load is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptPolicy {
    /// Accept regardless of the load's current status.
    #[default]
    Lenient,
    /// Only `Available` loads can be accepted.
    Strict,
}

/// Tunables for the screen controller and its actor loop.
///
/// Durations deserialize from milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use loadboard::ControllerConfig;
///
/// let config = ControllerConfig {
///     accept_delay: Duration::ZERO,
///     ..ControllerConfig::default()
/// };
/// assert_eq!(config.accept_delay, Duration::ZERO);
/// assert_eq!(config.notification_interval, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Period of the simulated GPS tick while tracking is enabled.
    ///
    /// Default: 3 seconds.
    #[serde(with = "millis")]
    pub gps_interval: Duration,

    /// Period of the background notification tick.
    ///
    /// Default: 15 seconds.
    #[serde(with = "millis")]
    pub notification_interval: Duration,

    /// Chance that a notification tick produces a notification.
    ///
    /// Default: 0.2.
    pub notification_probability: f64,

    /// Simulated notifications stop once the feed holds this many entries.
    ///
    /// Default: 10.
    pub simulated_feed_limit: usize,

    /// Chance that a GPS sample raises a geofencing alert.
    ///
    /// Default: 0.05.
    pub geofence_probability: f64,

    /// Simulated round-trip before an accept completes.
    ///
    /// Default: 1.5 seconds.
    #[serde(with = "millis")]
    pub accept_delay: Duration,

    /// Simulated round-trip before a post completes.
    ///
    /// Default: 2 seconds.
    #[serde(with = "millis")]
    pub post_delay: Duration,

    /// Maximum notifications retained; older entries are evicted.
    ///
    /// Default: [`FEED_CAP`].
    pub feed_capacity: usize,

    /// Starting fuel price per liter.
    ///
    /// Default: 23.45.
    pub fuel_price: f64,

    /// Consumption used for fuel cost estimates.
    ///
    /// Default: 3.5 liters per 100 km.
    pub liters_per_100km: f64,

    /// Role recorded as `acceptedBy` when no actor is given.
    ///
    /// Default: `"operator"`.
    pub actor_role: String,

    /// Precondition applied to accept.
    pub accept_policy: AcceptPolicy,

    /// Capacity of the actor's message channel.
    ///
    /// Default: 32.
    pub channel_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            gps_interval: Duration::from_secs(3),
            notification_interval: Duration::from_secs(15),
            notification_probability: 0.2,
            simulated_feed_limit: 10,
            geofence_probability: 0.05,
            accept_delay: Duration::from_millis(1500),
            post_delay: Duration::from_secs(2),
            feed_capacity: FEED_CAP,
            fuel_price: 23.45,
            liters_per_100km: 3.5,
            actor_role: "operator".to_string(),
            accept_policy: AcceptPolicy::Lenient,
            channel_capacity: 32,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
