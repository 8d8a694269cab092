//! HTML form payloads and their validation.
//!
//! Forms deserialize as raw strings so that a rejected submission can be
//! rendered back exactly as typed, next to per-field messages.

use chrono::NaiveDate;
use serde::Deserialize;

use logistik_core::delivery::{RECIPIENT_NAME_MAX, RECIPIENT_PHONE_MAX, TRACKING_NUMBER_MAX};
use logistik_core::{Delivery, DeliveryFields, DeliveryStatus, Email, Role, Weight};

use crate::services::auth::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH};

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|(f, _)| *f == field)
    }

    /// First message for `field`, or an empty string.
    #[must_use]
    pub fn message(&self, field: &str) -> &str {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map_or("", |(_, m)| m.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required."));
    }
}

fn max_len(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.trim().chars().count() > max {
        errors.add(field, format!("Must be at most {max} characters."));
    }
}

fn optional(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Body or query of a request whose only input is the form token
/// (delete buttons, the logout link).
#[derive(Debug, Default, Deserialize)]
pub struct CsrfOnly {
    #[serde(default)]
    pub csrf_token: String,
}

// =============================================================================
// Login
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Local path to return to after login.
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Return `next` only if it is a local absolute path.
///
/// Anything else (other hosts, scheme-relative `//host` URLs, backslash
/// tricks) falls back to `None`.
#[must_use]
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}

// =============================================================================
// Registration
// =============================================================================

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// A registration that passed form validation.
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: Email,
    pub role: Role,
}

impl RegisterForm {
    /// Check the submission.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<ValidRegistration, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = self.username.trim();
        let len = username.chars().count();
        if len == 0 {
            errors.add("username", "Username is required.");
        } else if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
            errors.add(
                "username",
                format!(
                    "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters."
                ),
            );
        }

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(_) if self.email.trim().is_empty() => {
                errors.add("email", "Email is required.");
                None
            }
            Err(_) => {
                errors.add("email", "Invalid email address.");
                None
            }
        };

        if self.password.is_empty() {
            errors.add("password", "Password is required.");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
            );
        }

        let role = self.role.parse::<Role>().ok();
        if role.is_none() {
            errors.add("role", "Select a role.");
        }

        match (email, role) {
            (Some(email), Some(role)) => errors.into_result(ValidRegistration {
                username: username.to_owned(),
                email,
                role,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Delivery create/edit form data.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryForm {
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_address: String,
    #[serde(default)]
    pub recipient_phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub estimated_delivery_date: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub csrf_token: String,
}

fn default_status() -> String {
    DeliveryStatus::default().as_str().to_owned()
}

impl Default for DeliveryForm {
    fn default() -> Self {
        Self {
            tracking_number: String::new(),
            recipient_name: String::new(),
            recipient_address: String::new(),
            recipient_phone: String::new(),
            description: String::new(),
            weight: String::new(),
            estimated_delivery_date: String::new(),
            status: default_status(),
            csrf_token: String::new(),
        }
    }
}

impl From<&Delivery> for DeliveryForm {
    fn from(delivery: &Delivery) -> Self {
        Self {
            tracking_number: delivery.tracking_number.clone(),
            recipient_name: delivery.recipient_name.clone(),
            recipient_address: delivery.recipient_address.clone(),
            recipient_phone: delivery.recipient_phone.clone(),
            description: delivery.description.clone().unwrap_or_default(),
            weight: delivery.weight.map(|w| w.to_string()).unwrap_or_default(),
            estimated_delivery_date: delivery
                .estimated_delivery_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: delivery.status.as_str().to_owned(),
            csrf_token: String::new(),
        }
    }
}

impl DeliveryForm {
    /// Check the submission and build the delivery fields.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<DeliveryFields, FieldErrors> {
        let mut errors = FieldErrors::default();

        required(&mut errors, "tracking_number", &self.tracking_number, "Tracking number");
        max_len(&mut errors, "tracking_number", &self.tracking_number, TRACKING_NUMBER_MAX);
        required(&mut errors, "recipient_name", &self.recipient_name, "Recipient name");
        max_len(&mut errors, "recipient_name", &self.recipient_name, RECIPIENT_NAME_MAX);
        required(&mut errors, "recipient_address", &self.recipient_address, "Recipient address");
        required(&mut errors, "recipient_phone", &self.recipient_phone, "Recipient phone");
        max_len(&mut errors, "recipient_phone", &self.recipient_phone, RECIPIENT_PHONE_MAX);

        let weight = match optional(&self.weight).map(Weight::parse).transpose() {
            Ok(weight) => weight,
            Err(e) => {
                errors.add("weight", format!("Invalid weight: {e}."));
                None
            }
        };

        let estimated_delivery_date = match optional(&self.estimated_delivery_date)
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .transpose()
        {
            Ok(date) => date,
            Err(_) => {
                errors.add("estimated_delivery_date", "Use the format YYYY-MM-DD.");
                None
            }
        };

        let status = parse_status(&self.status, &mut errors);

        errors.into_result(DeliveryFields {
            tracking_number: self.tracking_number.trim().to_owned(),
            recipient_name: self.recipient_name.trim().to_owned(),
            recipient_address: self.recipient_address.trim().to_owned(),
            recipient_phone: self.recipient_phone.trim().to_owned(),
            description: optional(&self.description).map(str::to_owned),
            weight,
            estimated_delivery_date,
            status: status.unwrap_or_default(),
        })
    }
}

/// Status-only update form data.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl StatusForm {
    /// Parse the chosen status.
    ///
    /// # Errors
    ///
    /// Returns a `status` field error for values outside the four choices.
    pub fn validate(&self) -> Result<DeliveryStatus, FieldErrors> {
        let mut errors = FieldErrors::default();
        let status = parse_status(&self.status, &mut errors);
        match status {
            Some(status) => Ok(status),
            None => Err(errors),
        }
    }
}

fn parse_status(value: &str, errors: &mut FieldErrors) -> Option<DeliveryStatus> {
    let status = value.trim().parse::<DeliveryStatus>().ok();
    if status.is_none() {
        errors.add("status", "Select a valid status.");
    }
    status
}
