//! PostgreSQL implementation of PurchaseRepository.
//!
//! Uniqueness of `subscription_id` and of `(provider, order_id)` is
//! enforced by the schema; inserts use `ON CONFLICT DO NOTHING` so a lost race is reported
//! as [`SaveResult::AlreadyExists`] instead of an error.

use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId, Timestamp};
use crate::domain::purchase::{OwnerRef, ProviderKind, Purchase, PurchaseStatus, PurchaseType};
use crate::ports::{PurchaseRepository, SaveResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the PurchaseRepository port.
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    provider: String,
    purchase_type: String,
    subscription_id: Option<String>,
    order_id: Option<String>,
    customer_id: String,
    product_id: String,
    status: String,
    seats: Option<i32>,
    organization_id: Option<String>,
    user_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, provider, purchase_type, subscription_id, order_id, customer_id,
           product_id, status, seats, organization_id, user_id, created_at, updated_at
    FROM purchases
"#;

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let provider: ProviderKind = row.provider.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider value: {}", e))
        })?;
        let purchase_type: PurchaseType = row.purchase_type.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid purchase type: {}", e))
        })?;
        let owner = OwnerRef::from_metadata(row.organization_id.as_deref(), row.user_id.as_deref())
            .ok()
            .flatten()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Purchase {} has no single owner", row.id),
                )
            })?;
        let seats = row
            .seats
            .map(u32::try_from)
            .transpose()
            .map_err(|_| DomainError::new(ErrorCode::DatabaseError, "Negative seat count"))?;

        Ok(Purchase::reconstitute(
            PurchaseId::from_uuid(row.id),
            provider,
            purchase_type,
            row.subscription_id,
            row.order_id,
            row.customer_id,
            row.product_id,
            PurchaseStatus::canonicalize(&row.status),
            seats,
            owner,
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

fn seats_column(purchase: &Purchase) -> Result<Option<i32>, DomainError> {
    purchase
        .seats
        .map(i32::try_from)
        .transpose()
        .map_err(|_| DomainError::validation("seats", "seat count out of range"))
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> =
            sqlx::query_as(&format!("{} WHERE subscription_id = $1", SELECT_COLUMNS))
                .bind(subscription_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find purchase: {}", e)))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn create(&self, purchase: &Purchase) -> Result<SaveResult, DomainError> {
        let owner = purchase.owner();

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, provider, purchase_type, subscription_id, order_id, customer_id,
                product_id, status, seats, organization_id, user_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.provider.as_str())
        .bind(purchase.purchase_type.as_str())
        .bind(&purchase.subscription_id)
        .bind(&purchase.order_id)
        .bind(&purchase.customer_id)
        .bind(&purchase.product_id)
        .bind(purchase.status.as_str())
        .bind(seats_column(purchase)?)
        .bind(owner.organization_id().map(|id| id.as_str()))
        .bind(owner.user_id().map(|id| id.as_str()))
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save purchase: {}", e)))?;

        if result.rows_affected() == 0 {
            return Ok(SaveResult::AlreadyExists);
        }
        Ok(SaveResult::Inserted)
    }

    async fn update(&self, purchase: &Purchase) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                status = $2,
                product_id = $3,
                seats = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.status.as_str())
        .bind(&purchase.product_id)
        .bind(seats_column(purchase)?)
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update purchase: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_subscription_id(&self, subscription_id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM purchases WHERE subscription_id = $1")
            .bind(subscription_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete purchase: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Purchase>, DomainError> {
        let column = match owner {
            OwnerRef::Organization(_) => "organization_id",
            OwnerRef::User(_) => "user_id",
        };

        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            "{} WHERE {} = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS, column
        ))
        .bind(owner.id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list purchases: {}", e)))?;

        rows.into_iter().map(Purchase::try_from).collect()
    }
}
