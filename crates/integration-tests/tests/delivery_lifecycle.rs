//! Delivery lifecycle and dashboard counting, driven through the public
//! domain API.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use logistik_core::{
    Delivery, DeliveryFields, DeliveryId, DeliveryStatus, Operation, Role, StatusCounts, UserId,
    authorize,
};

const ADMIN: UserId = UserId::new(1);
const USER: UserId = UserId::new(2);

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, 9, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid date"))
}

fn fields(tracking_number: &str, status: DeliveryStatus) -> DeliveryFields {
    DeliveryFields {
        tracking_number: tracking_number.to_owned(),
        recipient_name: "Ada Lovelace".to_owned(),
        recipient_address: "12 St James's Square, London".to_owned(),
        recipient_phone: "555-0100".to_owned(),
        description: Some("Analytical engine parts".to_owned()),
        weight: None,
        estimated_delivery_date: NaiveDate::from_ymd_opt(2024, 6, 5),
        status,
    }
}

/// What the store does on create: the owner is recorded and a delivery
/// created as delivered is stamped immediately.
fn create(id: i32, fields: DeliveryFields, owner: UserId, now: DateTime<Utc>) -> Delivery {
    Delivery {
        id: DeliveryId::new(id),
        actual_delivery_date: fields.initial_actual_date(now),
        tracking_number: fields.tracking_number,
        recipient_name: fields.recipient_name,
        recipient_address: fields.recipient_address,
        recipient_phone: fields.recipient_phone,
        description: fields.description,
        weight: fields.weight,
        estimated_delivery_date: fields.estimated_delivery_date,
        status: fields.status,
        created_by: owner,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn counts(deliveries: &[Delivery]) -> StatusCounts {
    deliveries.iter().map(|d| d.status).collect()
}

#[test]
fn test_trk1_walkthrough() {
    assert!(authorize(Role::Admin, Operation::CreateDelivery).is_ok());
    let mut deliveries = vec![create(1, fields("TRK1", DeliveryStatus::Ongoing), ADMIN, at(1))];

    let before = counts(&deliveries);
    assert_eq!(before.ongoing, 1);
    assert_eq!(before.total(), 1);

    assert!(authorize(Role::User, Operation::UpdateStatus).is_ok());
    deliveries[0].apply_status(DeliveryStatus::Delivered, USER, at(3));

    let after = counts(&deliveries);
    assert_eq!(after.ongoing, 0);
    assert_eq!(after.delivered, 1);
    assert_eq!(after.total(), 1);

    let trk1 = &deliveries[0];
    assert_eq!(trk1.actual_delivery_date, NaiveDate::from_ymd_opt(2024, 6, 3));
    assert_eq!(trk1.created_by, ADMIN);
    assert_eq!(trk1.updated_by, Some(USER));
    assert_eq!(trk1.updated_at, at(3));
}

#[test]
fn test_actual_date_survives_round_trip_through_other_statuses() {
    let mut delivery = create(1, fields("TRK2", DeliveryStatus::InRoute), ADMIN, at(1));

    delivery.apply_status(DeliveryStatus::Delivered, USER, at(2));
    let first = delivery.actual_delivery_date;
    assert!(first.is_some());

    delivery.apply_status(DeliveryStatus::Late, USER, at(4));
    delivery.apply_status(DeliveryStatus::Delivered, USER, at(6));
    delivery.apply_status(DeliveryStatus::Delivered, ADMIN, at(7));

    assert_eq!(delivery.actual_delivery_date, first);
    assert_eq!(delivery.updated_at, at(7));
}

#[test]
fn test_created_as_delivered_is_stamped_at_creation() {
    let delivery = create(1, fields("TRK3", DeliveryStatus::Delivered), ADMIN, at(2));
    assert_eq!(delivery.actual_delivery_date, Some(at(2).date_naive()));
}

#[test]
fn test_admin_edit_goes_through_status_rule() {
    let mut delivery = create(1, fields("TRK4", DeliveryStatus::Ongoing), ADMIN, at(1));

    let mut edited = delivery.fields();
    edited.tracking_number = "TRK4-B".to_owned();
    edited.status = DeliveryStatus::Delivered;
    delivery.apply_fields(edited, ADMIN, at(2) + Duration::hours(1));

    assert_eq!(delivery.tracking_number, "TRK4-B");
    assert_eq!(delivery.actual_delivery_date, NaiveDate::from_ymd_opt(2024, 6, 2));
    assert_eq!(delivery.created_by, ADMIN);
}

#[test]
fn test_any_transition_is_allowed() {
    let mut delivery = create(1, fields("TRK5", DeliveryStatus::Delivered), ADMIN, at(1));

    for status in [
        DeliveryStatus::Ongoing,
        DeliveryStatus::Late,
        DeliveryStatus::InRoute,
        DeliveryStatus::Ongoing,
    ] {
        delivery.apply_status(status, USER, at(2));
        assert_eq!(delivery.status, status);
    }
}

#[test]
fn test_total_equals_listing_length() {
    let statuses = [
        DeliveryStatus::Ongoing,
        DeliveryStatus::Ongoing,
        DeliveryStatus::InRoute,
        DeliveryStatus::Late,
        DeliveryStatus::Delivered,
    ];
    let deliveries: Vec<Delivery> = statuses
        .iter()
        .zip(1..)
        .map(|(status, id)| create(id, fields(&format!("TRK{id}"), *status), ADMIN, at(1)))
        .collect();

    let counts = counts(&deliveries);
    let sum: u64 = DeliveryStatus::ALL.iter().map(|s| counts.get(*s)).sum();
    assert_eq!(counts.total(), sum);
    assert_eq!(usize::try_from(counts.total()).ok(), Some(deliveries.len()));
}

#[test]
fn test_overdue_is_visual_only() {
    let mut delivery = create(1, fields("TRK6", DeliveryStatus::InRoute), ADMIN, at(1));
    let after_eta = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap_or_default();

    assert!(delivery.is_overdue(after_eta));
    assert_eq!(delivery.status, DeliveryStatus::InRoute);

    delivery.apply_status(DeliveryStatus::Delivered, USER, at(9));
    assert!(!delivery.is_overdue(after_eta));
}
