//! Delivery status values and per-status tallies.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known [`DeliveryStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid delivery status: {0}")]
pub struct ParseStatusError(pub String);

/// Where a delivery currently stands.
///
/// There is no enforced ordering between statuses; any status may be set
/// from any other. `Late` is only ever chosen by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "logistik.delivery_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Registered but not yet dispatched.
    #[default]
    Ongoing,
    /// Dispatched and on the way.
    InRoute,
    /// Marked overdue by an operator.
    Late,
    /// Handed to the recipient.
    Delivered,
}

impl DeliveryStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 4] = [Self::Ongoing, Self::InRoute, Self::Late, Self::Delivered];

    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::InRoute => "in_route",
            Self::Late => "late",
            Self::Delivered => "delivered",
        }
    }

    /// Human-readable label used in forms and listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing (Not Dispatched)",
            Self::InRoute => "In Route",
            Self::Late => "Late",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_owned()))
    }
}

/// Number of deliveries in each status.
///
/// The total is always derived from the four buckets, never stored
/// separately, so it cannot drift from their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub ongoing: u64,
    pub in_route: u64,
    pub late: u64,
    pub delivered: u64,
}

impl StatusCounts {
    /// Count for a single status.
    #[must_use]
    pub const fn get(&self, status: DeliveryStatus) -> u64 {
        match status {
            DeliveryStatus::Ongoing => self.ongoing,
            DeliveryStatus::InRoute => self.in_route,
            DeliveryStatus::Late => self.late,
            DeliveryStatus::Delivered => self.delivered,
        }
    }

    /// Add `n` deliveries to the bucket for `status`.
    pub const fn add(&mut self, status: DeliveryStatus, n: u64) {
        let bucket = match status {
            DeliveryStatus::Ongoing => &mut self.ongoing,
            DeliveryStatus::InRoute => &mut self.in_route,
            DeliveryStatus::Late => &mut self.late,
            DeliveryStatus::Delivered => &mut self.delivered,
        };
        *bucket = bucket.saturating_add(n);
    }

    /// Sum of all four buckets.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.ongoing + self.in_route + self.late + self.delivered
    }
}

impl FromIterator<DeliveryStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = DeliveryStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.add(status, 1);
        }
        counts
    }
}

impl FromIterator<(DeliveryStatus, u64)> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = (DeliveryStatus, u64)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (status, n) in iter {
            counts.add(status, n);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in DeliveryStatus::ALL {
            assert_eq!(status.as_str().parse::<DeliveryStatus>(), Ok(status));
        }
        assert!("in-route".parse::<DeliveryStatus>().is_err());
        assert!("".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(DeliveryStatus::Ongoing.label(), "Ongoing (Not Dispatched)");
        assert_eq!(DeliveryStatus::InRoute.label(), "In Route");
    }

    #[test]
    fn test_default_status_is_ongoing() {
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::Ongoing);
    }

    #[test]
    fn test_counts_from_statuses() {
        let counts: StatusCounts = [
            DeliveryStatus::Ongoing,
            DeliveryStatus::Ongoing,
            DeliveryStatus::Late,
            DeliveryStatus::Delivered,
        ]
        .into_iter()
        .collect();

        assert_eq!(counts.get(DeliveryStatus::Ongoing), 2);
        assert_eq!(counts.get(DeliveryStatus::InRoute), 0);
        assert_eq!(counts.get(DeliveryStatus::Late), 1);
        assert_eq!(counts.get(DeliveryStatus::Delivered), 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_counts_from_grouped_rows() {
        let counts: StatusCounts = [
            (DeliveryStatus::InRoute, 3),
            (DeliveryStatus::Delivered, 5),
            (DeliveryStatus::InRoute, 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(counts.in_route, 4);
        assert_eq!(counts.delivered, 5);
        assert_eq!(
            counts.total(),
            DeliveryStatus::ALL.iter().map(|s| counts.get(*s)).sum::<u64>()
        );
    }

    #[test]
    fn test_empty_counts() {
        assert_eq!(StatusCounts::default().total(), 0);
    }
}
