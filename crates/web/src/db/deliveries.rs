//! Delivery repository for database operations.
//!
//! Every mutation reads the current row under `FOR UPDATE`, applies the
//! lifecycle rules from [`logistik_core::Delivery`] in Rust, and writes the
//! result back inside the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use logistik_core::{
    Delivery, DeliveryFields, DeliveryId, DeliveryStatus, StatusCounts, UserId, Weight,
};

use super::{RepositoryError, map_unique_violation};

/// Field name reported in [`RepositoryError::Conflict`].
pub const TRACKING_NUMBER: &str = "tracking_number";

const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[("delivery_tracking_number_key", TRACKING_NUMBER)];

/// Column list shared by every query that returns a full delivery row.
macro_rules! delivery_columns {
    () => {
        "id, tracking_number, recipient_name, recipient_address, recipient_phone, \
         description, weight, estimated_delivery_date, actual_delivery_date, status, \
         created_by_id, updated_by_id, created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: i32,
    tracking_number: String,
    recipient_name: String,
    recipient_address: String,
    recipient_phone: String,
    description: Option<String>,
    weight: Option<Decimal>,
    estimated_delivery_date: Option<NaiveDate>,
    actual_delivery_date: Option<NaiveDate>,
    status: DeliveryStatus,
    created_by_id: i32,
    updated_by_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = RepositoryError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let weight = row
            .weight
            .map(Weight::new)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid weight in database: {e}")))?;

        Ok(Self {
            id: DeliveryId::new(row.id),
            tracking_number: row.tracking_number,
            recipient_name: row.recipient_name,
            recipient_address: row.recipient_address,
            recipient_phone: row.recipient_phone,
            description: row.description,
            weight,
            estimated_delivery_date: row.estimated_delivery_date,
            actual_delivery_date: row.actual_delivery_date,
            status: row.status,
            created_by: UserId::new(row.created_by_id),
            updated_by: row.updated_by_id.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for delivery database operations.
pub struct DeliveryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryRepository<'a> {
    /// Create a new delivery repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a delivery by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no delivery has this ID.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DeliveryId) -> Result<Delivery, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryRow>(concat!(
            "SELECT ",
            delivery_columns!(),
            " FROM logistik.delivery WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List every delivery, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Delivery>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryRow>(concat!(
            "SELECT ",
            delivery_columns!(),
            " FROM logistik.delivery ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count deliveries per status.
    ///
    /// Statuses with no deliveries are reported as zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<StatusCounts, RepositoryError> {
        let rows = sqlx::query_as::<_, (DeliveryStatus, i64)>(
            "SELECT status, COUNT(*) FROM logistik.delivery GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, n)| {
                u64::try_from(n)
                    .map(|n| (status, n))
                    .map_err(|_| RepositoryError::DataCorruption(format!("negative count {n}")))
            })
            .collect()
    }

    /// Create a delivery owned by `owner`.
    ///
    /// A delivery created as delivered gets today's date as its actual date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("tracking_number")` if the tracking
    /// number is already used.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        fields: &DeliveryFields,
        owner: UserId,
    ) -> Result<Delivery, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        ensure_tracking_number_free(&mut tx, &fields.tracking_number, None).await?;

        let row = sqlx::query_as::<_, DeliveryRow>(concat!(
            "INSERT INTO logistik.delivery (tracking_number, recipient_name, recipient_address, \
             recipient_phone, description, weight, estimated_delivery_date, actual_delivery_date, \
             status, created_by_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING ",
            delivery_columns!()
        ))
        .bind(&fields.tracking_number)
        .bind(&fields.recipient_name)
        .bind(&fields.recipient_address)
        .bind(&fields.recipient_phone)
        .bind(fields.description.as_deref())
        .bind(fields.weight.map(|w| w.kilograms()))
        .bind(fields.estimated_delivery_date)
        .bind(fields.initial_actual_date(now))
        .bind(fields.status)
        .bind(owner.as_i32())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_CONSTRAINTS))?;

        tx.commit().await?;

        row.try_into()
    }

    /// Replace every editable field of a delivery on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    /// Returns `RepositoryError::Conflict("tracking_number")` if the new
    /// tracking number belongs to a different delivery.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: DeliveryId,
        fields: DeliveryFields,
        actor: UserId,
    ) -> Result<Delivery, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut delivery = lock(&mut tx, id).await?;
        ensure_tracking_number_free(&mut tx, &fields.tracking_number, Some(id)).await?;

        delivery.apply_fields(fields, actor, Utc::now());
        write_back(&mut tx, &delivery).await?;

        tx.commit().await?;
        Ok(delivery)
    }

    /// Change only the status of a delivery on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
        actor: UserId,
    ) -> Result<Delivery, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut delivery = lock(&mut tx, id).await?;
        delivery.apply_status(status, actor, Utc::now());
        write_back(&mut tx, &delivery).await?;

        tx.commit().await?;
        Ok(delivery)
    }

    /// Permanently remove a delivery, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: DeliveryId, actor: UserId) -> Result<Delivery, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryRow>(concat!(
            "DELETE FROM logistik.delivery WHERE id = $1 RETURNING ",
            delivery_columns!()
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tracing::info!(delivery_id = %id, actor = %actor, tracking_number = %row.tracking_number, "Delivery deleted");
        row.try_into()
    }
}

/// Load a delivery and hold its row lock until the transaction ends.
async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    id: DeliveryId,
) -> Result<Delivery, RepositoryError> {
    let row = sqlx::query_as::<_, DeliveryRow>(concat!(
        "SELECT ",
        delivery_columns!(),
        " FROM logistik.delivery WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

/// Reject a tracking number already used by another delivery.
///
/// The unique constraint still backs this up for concurrent inserts.
async fn ensure_tracking_number_free(
    tx: &mut Transaction<'_, Postgres>,
    tracking_number: &str,
    except: Option<DeliveryId>,
) -> Result<(), RepositoryError> {
    let taken = sqlx::query_scalar::<_, bool>(
        r"
        SELECT EXISTS (
            SELECT 1 FROM logistik.delivery
            WHERE tracking_number = $1 AND ($2::INTEGER IS NULL OR id <> $2)
        )
        ",
    )
    .bind(tracking_number)
    .bind(except.map(|id| id.as_i32()))
    .fetch_one(&mut **tx)
    .await?;

    if taken {
        return Err(RepositoryError::Conflict(TRACKING_NUMBER.to_owned()));
    }
    Ok(())
}

/// Persist every mutable column of `delivery`.
async fn write_back(
    tx: &mut Transaction<'_, Postgres>,
    delivery: &Delivery,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE logistik.delivery
        SET tracking_number = $2,
            recipient_name = $3,
            recipient_address = $4,
            recipient_phone = $5,
            description = $6,
            weight = $7,
            estimated_delivery_date = $8,
            actual_delivery_date = $9,
            status = $10,
            updated_by_id = $11,
            updated_at = $12
        WHERE id = $1
        ",
    )
    .bind(delivery.id.as_i32())
    .bind(&delivery.tracking_number)
    .bind(&delivery.recipient_name)
    .bind(&delivery.recipient_address)
    .bind(&delivery.recipient_phone)
    .bind(delivery.description.as_deref())
    .bind(delivery.weight.map(|w| w.kilograms()))
    .bind(delivery.estimated_delivery_date)
    .bind(delivery.actual_delivery_date)
    .bind(delivery.status)
    .bind(delivery.updated_by.map(|id| id.as_i32()))
    .bind(delivery.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_unique_violation(e, UNIQUE_CONSTRAINTS))?;

    Ok(())
}
