//! The authoritative collection of loads: queries and mutations.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, execute};
use crate::config::AcceptPolicy;
use crate::error::LoadError;
use crate::form::LoadForm;
use crate::load::{Load, LoadCommand, LoadStatus, Urgency};
use crate::seed::{self, HOME_BASE};

/// Prefix of every load id.
const ID_PREFIX: &str = "LD";

/// Shipper recorded on loads posted from this device.
const POSTING_SHIPPER: &str = "Your Company";
const POSTING_SHIPPER_CONTACT: &str = "+27 11 000 0000";

/// Constraint applied on top of the text query in [`LoadStore::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadFilter {
    /// No constraint.
    #[default]
    All,
    /// Urgency is High.
    Urgent,
    /// Pickup is on the current date.
    Today,
    /// Status is Available.
    Available,
    /// Status is In Transit.
    InTransit,
}

impl LoadFilter {
    pub const ALL: [LoadFilter; 5] = [
        Self::All,
        Self::Urgent,
        Self::Available,
        Self::Today,
        Self::InTransit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Urgent => "urgent",
            Self::Today => "today",
            Self::Available => "available",
            Self::InTransit => "in-transit",
        }
    }

    /// Whether `load` satisfies this filter, with `today` as the current date.
    pub fn matches(&self, load: &Load, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Urgent => load.urgency == Urgency::High,
            Self::Today => load.pickup == today,
            Self::Available => load.status == LoadStatus::Available,
            Self::InTransit => load.status == LoadStatus::InTransit,
        }
    }
}

impl fmt::Display for LoadFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadFilter {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| LoadError::UnknownFilter(s.to_string()))
    }
}

/// Holds every load, newest first, and applies all load mutations.
///
/// Ids are handed out by a monotonic sequence that starts past the highest
/// numeric id present, so a post never reuses an existing id. Once the
/// sequence runs out, posting fails with [`LoadError::IdsExhausted`].
#[derive(Debug, Clone)]
pub struct LoadStore {
    loads: Vec<Load>,
    next_seq: Option<u32>,
    accept_policy: AcceptPolicy,
}

impl Default for LoadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadStore {
    /// An empty store with the lenient accept policy.
    pub fn new() -> Self {
        Self {
            loads: Vec::new(),
            next_seq: Some(1),
            accept_policy: AcceptPolicy::default(),
        }
    }

    /// A store holding `loads` in the given order.
    ///
    /// # Errors
    ///
    /// * [`LoadError::DuplicateId`] if two loads share an id.
    /// * [`LoadError::InconsistentProgress`] if a load's progress does not
    ///   fit its status: 0 unless `In Transit` (any value up to 100) or
    ///   `Delivered` (exactly 100).
    pub fn with_loads(loads: Vec<Load>) -> Result<Self, LoadError> {
        let mut seen = HashSet::with_capacity(loads.len());
        for load in &loads {
            if !seen.insert(load.id()) {
                return Err(LoadError::DuplicateId(load.id().to_string()));
            }
            check_progress_fits_status(load)?;
        }

        let after_highest = match loads.iter().filter_map(|l| id_number(l.id())).max() {
            Some(n) => n.checked_add(1),
            None => Some(1),
        };
        let after_len = u32::try_from(loads.len())
            .ok()
            .and_then(|n| n.checked_add(1));
        let next_seq = after_highest.zip(after_len).map(|(a, b)| a.max(b));
        Ok(Self {
            loads,
            next_seq,
            accept_policy: AcceptPolicy::default(),
        })
    }

    /// The seeded board. Its loads are fixed and consistent.
    pub(crate) fn seeded() -> Self {
        let loads = seed::loads();
        let next_seq = u32::try_from(loads.len()).ok().map(|n| n + 1);
        Self {
            loads,
            next_seq,
            accept_policy: AcceptPolicy::default(),
        }
    }

    /// Set the precondition applied by [`accept`](LoadStore::accept).
    pub fn with_accept_policy(mut self, policy: AcceptPolicy) -> Self {
        self.accept_policy = policy;
        self
    }

    pub fn accept_policy(&self) -> AcceptPolicy {
        self.accept_policy
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Iterate loads in store order (newest first).
    pub fn iter(&self) -> impl Iterator<Item = &Load> {
        self.loads.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Load> {
        self.loads.iter().find(|l| l.id() == id)
    }

    /// The id the next posted load will receive, if any remain.
    pub fn peek_next_id(&self) -> Option<String> {
        self.next_seq.map(format_id)
    }

    /// Loads matching `query` and `filter`, judged against today's local date.
    pub fn search(&self, query: &str, filter: LoadFilter) -> Vec<Load> {
        self.search_on(query, filter, Local::now().date_naive())
    }

    /// Loads matching `query` and `filter`, with `today` as the current date.
    ///
    /// `query` is matched case-insensitively as a substring of the origin,
    /// destination, cargo type or id; an empty query matches every load.
    /// Results keep store order.
    pub fn search_on(&self, query: &str, filter: LoadFilter, today: NaiveDate) -> Vec<Load> {
        let needle = query.to_lowercase();
        self.loads
            .iter()
            .filter(|load| matches_query(load, &needle) && filter.matches(load, today))
            .cloned()
            .collect()
    }

    /// Accept a load on behalf of `actor_role`.
    ///
    /// # Errors
    ///
    /// * [`LoadError::NotFound`] if no load has this id.
    /// * [`LoadError::InvalidState`] under [`AcceptPolicy::Strict`] when the
    ///   load is not `Available`.
    pub fn accept(&mut self, id: &str, actor_role: &str) -> Result<Load, LoadError> {
        let cmd = LoadCommand::Accept {
            accepted_by: actor_role.to_string(),
            policy: self.accept_policy,
        };
        self.execute(id, cmd)
    }

    /// Validate `form` and prepend a new `Available` load built from it.
    ///
    /// # Errors
    ///
    /// * [`LoadError::Validation`] listing every failing field.
    /// * [`LoadError::IdsExhausted`] when no unused id is left.
    ///
    /// The store is left unchanged on error.
    pub fn post(&mut self, form: &LoadForm) -> Result<Load, LoadError> {
        form.validate().map_err(LoadError::Validation)?;
        let seq = self.next_seq.ok_or(LoadError::IdsExhausted)?;

        let id = format_id(seq);
        let pickup_point = form.pickup_point.unwrap_or(HOME_BASE);
        let mut load = Load::new(
            id,
            form.pickup_location.trim(),
            form.delivery_location.trim(),
            form.pickup_date,
            pickup_point,
        );
        load.weight = format!("{} tons", form.weight.trim());
        load.cargo_type = form.cargo_type.clone();
        load.rate = format_rate(&form.rate);
        load.urgency = if form.is_urgent {
            Urgency::High
        } else {
            Urgency::Medium
        };
        load.shipper = POSTING_SHIPPER.to_string();
        load.shipper_contact = POSTING_SHIPPER_CONTACT.to_string();
        load.delivery = form
            .pickup_date
            .checked_add_days(Days::new(1))
            .unwrap_or(form.pickup_date);

        self.next_seq = seq.checked_add(1);
        self.loads.insert(0, load.clone());
        tracing::info!(load_id = %load.id(), "load posted");
        Ok(load)
    }

    /// Begin tracking a load at `progress` percent.
    pub fn start_transit(&mut self, id: &str, progress: u8) -> Result<Load, LoadError> {
        self.execute(id, LoadCommand::StartTransit { progress })
    }

    /// Record tracking progress for a load in transit.
    pub fn update_progress(&mut self, id: &str, progress: u8) -> Result<Load, LoadError> {
        self.execute(id, LoadCommand::UpdateProgress { progress })
    }

    pub fn confirm_delivery(&mut self, id: &str) -> Result<Load, LoadError> {
        self.execute(id, LoadCommand::ConfirmDelivery)
    }

    pub fn mark_delayed(&mut self, id: &str) -> Result<Load, LoadError> {
        self.execute(id, LoadCommand::MarkDelayed)
    }

    pub fn cancel(&mut self, id: &str) -> Result<Load, LoadError> {
        self.execute(id, LoadCommand::Cancel)
    }

    /// Run `cmd` against the load with this id and store the result.
    fn execute(&mut self, id: &str, cmd: LoadCommand) -> Result<Load, LoadError> {
        let slot = self
            .loads
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| LoadError::NotFound(id.to_string()))?;

        let (next, events) = execute(&*slot, cmd)?;
        if !events.is_empty() {
            tracing::info!(
                aggregate_type = Load::AGGREGATE_TYPE,
                load_id = %id,
                status = %next.status,
                count = events.len(),
                "load events applied"
            );
        }
        *slot = next.clone();
        Ok(next)
    }
}

fn matches_query(load: &Load, needle: &str) -> bool {
    needle.is_empty()
        || [
            load.origin.as_str(),
            load.destination.as_str(),
            load.cargo_type.as_str(),
            load.id(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn check_progress_fits_status(load: &Load) -> Result<(), LoadError> {
    let fits = match load.status {
        LoadStatus::InTransit => load.progress <= 100,
        LoadStatus::Delivered => load.progress == 100,
        _ => load.progress == 0,
    };
    if fits {
        Ok(())
    } else {
        Err(LoadError::InconsistentProgress {
            id: load.id().to_string(),
            status: load.status,
            progress: load.progress,
        })
    }
}

fn format_id(seq: u32) -> String {
    format!("{ID_PREFIX}{seq:03}")
}

fn id_number(id: &str) -> Option<u32> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// Prefix a bare amount with the currency symbol.
fn format_rate(rate: &str) -> String {
    let rate = rate.trim();
    if rate.starts_with('R') {
        rate.to_string()
    } else {
        format!("R{rate}")
    }
}
