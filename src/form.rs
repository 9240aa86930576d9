//! Post-load form, field validation and lenient numeric parsing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::load::GeoPoint;

/// Cargo category used when the form leaves it untouched.
pub const DEFAULT_CARGO_TYPE: &str = "General Cargo";

/// Input for posting a new load.
///
/// Text fields are kept exactly as typed; [`LoadForm::validate`] decides
/// whether they are usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadForm {
    pub pickup_location: String,
    pub delivery_location: String,
    /// Weight in tons, as typed (e.g. `"25"`).
    pub weight: String,
    /// Rate, as typed (e.g. `"15,000"` or `"R15,000"`).
    pub rate: String,
    pub cargo_type: String,
    pub pickup_date: NaiveDate,
    pub is_urgent: bool,
    pub requires_special_handling: bool,
    pub description: String,
    /// Pickup coordinate. The controller fills this in from the current
    /// location when left empty.
    #[serde(default)]
    pub pickup_point: Option<GeoPoint>,
}

impl LoadForm {
    /// An empty form with pickup on `pickup_date`.
    pub fn new(pickup_date: NaiveDate) -> Self {
        Self {
            pickup_location: String::new(),
            delivery_location: String::new(),
            weight: String::new(),
            rate: String::new(),
            cargo_type: DEFAULT_CARGO_TYPE.to_string(),
            pickup_date,
            is_urgent: false,
            requires_special_handling: false,
            description: String::new(),
            pickup_point: None,
        }
    }

    /// Set the pickup and delivery locations.
    pub fn route(mut self, pickup: impl Into<String>, delivery: impl Into<String>) -> Self {
        self.pickup_location = pickup.into();
        self.delivery_location = delivery.into();
        self
    }

    /// Set the weight text.
    pub fn weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }

    /// Set the rate text.
    pub fn rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = rate.into();
        self
    }

    /// Set the cargo category.
    pub fn cargo_type(mut self, cargo_type: impl Into<String>) -> Self {
        self.cargo_type = cargo_type.into();
        self
    }

    /// Mark the load as urgent (posted with High urgency).
    pub fn urgent(mut self, is_urgent: bool) -> Self {
        self.is_urgent = is_urgent;
        self
    }

    /// Check every required field and report all failures together.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] with one message per failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.pickup_location.trim().is_empty() {
            errors.insert(FormField::PickupLocation, "Pickup location is required");
        }
        if self.delivery_location.trim().is_empty() {
            errors.insert(FormField::DeliveryLocation, "Delivery location is required");
        }
        if !parse_leading_float(&self.weight).is_some_and(|w| w > 0.0) {
            errors.insert(FormField::Weight, "Weight must be greater than 0");
        }
        if !parse_amount(&self.rate).is_some_and(|r| r > 0.0) {
            errors.insert(FormField::Rate, "Rate must be greater than 0");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// A validated field of [`LoadForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    PickupLocation,
    DeliveryLocation,
    Weight,
    Rate,
}

impl FormField {
    /// The field's wire name, as the form is keyed by presentation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PickupLocation => "pickupLocation",
            Self::DeliveryLocation => "deliveryLocation",
            Self::Weight => "weight",
            Self::Rate => "rate",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field → message mapping produced by [`LoadForm::validate`].
///
/// Ordered by field so display and iteration are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<FormField, String>,
}

impl ValidationErrors {
    /// Record a message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    /// The message recorded for `field`, if it failed.
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.fields.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.as_str())?;
        }
        Ok(())
    }
}

/// Parse the leading decimal number of `text`.
///
/// Leading whitespace and an optional sign are allowed; parsing stops at
/// the first character that cannot continue the number, so `"10 tons"`
/// yields `10.0`. Returns `None` when no digits lead the text.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in text.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    text[..end].trim_end_matches('.').parse().ok()
}

/// Parse a formatted amount by discarding everything except digits and dots.
///
/// `"R15,500"` yields `15500.0` and `"568 km"` yields `568.0`. Returns
/// `None` when nothing numeric remains.
pub fn parse_amount(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    parse_leading_float(&digits)
}
