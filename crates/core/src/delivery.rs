//! Delivery records and the status lifecycle.
//!
//! Both the admin full edit and the user status-only update funnel through
//! [`Delivery::apply_status`], which is the only place the actual delivery
//! date is stamped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DeliveryId, DeliveryStatus, UserId, Weight};

/// Maximum length of a tracking number.
pub const TRACKING_NUMBER_MAX: usize = 50;
/// Maximum length of a recipient name.
pub const RECIPIENT_NAME_MAX: usize = 100;
/// Maximum length of a recipient phone number.
pub const RECIPIENT_PHONE_MAX: usize = 20;

/// A tracked delivery as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub tracking_number: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub description: Option<String>,
    pub weight: Option<Weight>,
    pub estimated_delivery_date: Option<NaiveDate>,
    /// Set the first time the status becomes delivered, then never changed.
    pub actual_delivery_date: Option<NaiveDate>,
    pub status: DeliveryStatus,
    pub created_by: UserId,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-editable part of a delivery.
///
/// Used both for creation and for the admin full edit. The actual delivery
/// date and the audit columns are never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFields {
    pub tracking_number: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub description: Option<String>,
    pub weight: Option<Weight>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub status: DeliveryStatus,
}

impl DeliveryFields {
    /// Actual delivery date for a record created from these fields.
    ///
    /// Creating a delivery that is already delivered stamps today's date.
    #[must_use]
    pub fn initial_actual_date(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        (self.status == DeliveryStatus::Delivered).then(|| now.date_naive())
    }
}

impl Delivery {
    /// Set a new status on behalf of `actor`.
    ///
    /// Any status may follow any other. The actual delivery date is filled in
    /// only when moving to delivered with no date yet recorded, so going away
    /// from delivered and back keeps the first date.
    pub fn apply_status(&mut self, status: DeliveryStatus, actor: UserId, now: DateTime<Utc>) {
        self.status = status;
        if status == DeliveryStatus::Delivered && self.actual_delivery_date.is_none() {
            self.actual_delivery_date = Some(now.date_naive());
        }
        self.touch(actor, now);
    }

    /// Replace every editable field, then apply the requested status.
    ///
    /// `created_by` is left as is.
    pub fn apply_fields(&mut self, fields: DeliveryFields, actor: UserId, now: DateTime<Utc>) {
        let DeliveryFields {
            tracking_number,
            recipient_name,
            recipient_address,
            recipient_phone,
            description,
            weight,
            estimated_delivery_date,
            status,
        } = fields;

        self.tracking_number = tracking_number;
        self.recipient_name = recipient_name;
        self.recipient_address = recipient_address;
        self.recipient_phone = recipient_phone;
        self.description = description;
        self.weight = weight;
        self.estimated_delivery_date = estimated_delivery_date;
        self.apply_status(status, actor, now);
    }

    /// Whether the estimated date has passed without the delivery arriving.
    ///
    /// Only used for highlighting; the status is never changed automatically.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != DeliveryStatus::Delivered
            && self.estimated_delivery_date.is_some_and(|eta| eta < today)
    }

    /// Current editable fields, e.g. to pre-fill an edit form.
    #[must_use]
    pub fn fields(&self) -> DeliveryFields {
        DeliveryFields {
            tracking_number: self.tracking_number.clone(),
            recipient_name: self.recipient_name.clone(),
            recipient_address: self.recipient_address.clone(),
            recipient_phone: self.recipient_phone.clone(),
            description: self.description.clone(),
            weight: self.weight,
            estimated_delivery_date: self.estimated_delivery_date,
            status: self.status,
        }
    }

    const fn touch(&mut self, actor: UserId, now: DateTime<Utc>) {
        self.updated_by = Some(actor);
        self.updated_at = now;
    }
}
