//! PostgreSQL implementation of CustomerDirectory.

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::purchase::{OwnerRef, ProviderKind};
use crate::ports::{CustomerDirectory, CustomerLink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresCustomerDirectory {
    pool: PgPool,
}

impl PostgresCustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerLinkRow {
    owner_kind: String,
    owner_id: String,
    customer_id: String,
    provider: String,
    linked_at: DateTime<Utc>,
}

impl TryFrom<CustomerLinkRow> for CustomerLink {
    type Error = DomainError;

    fn try_from(row: CustomerLinkRow) -> Result<Self, Self::Error> {
        let owner = OwnerRef::from_parts(&row.owner_kind, &row.owner_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner: {}", e))
        })?;
        let provider: ProviderKind = row.provider.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider value: {}", e))
        })?;

        Ok(CustomerLink {
            owner,
            customer_id: row.customer_id,
            provider,
            linked_at: Timestamp::from_datetime(row.linked_at),
        })
    }
}

#[async_trait]
impl CustomerDirectory for PostgresCustomerDirectory {
    async fn link_customer_to_owner(&self, link: &CustomerLink) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO customer_links (owner_kind, owner_id, customer_id, provider, linked_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (owner_kind, owner_id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                provider = EXCLUDED.provider,
                linked_at = EXCLUDED.linked_at
            "#,
        )
        .bind(link.owner.kind())
        .bind(link.owner.id())
        .bind(&link.customer_id)
        .bind(link.provider.as_str())
        .bind(link.linked_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to link customer: {}", e)))?;

        Ok(())
    }

    async fn find_by_owner(&self, owner: &OwnerRef) -> Result<Option<CustomerLink>, DomainError> {
        let row: Option<CustomerLinkRow> = sqlx::query_as(
            r#"
            SELECT owner_kind, owner_id, customer_id, provider, linked_at
            FROM customer_links
            WHERE owner_kind = $1 AND owner_id = $2
            "#,
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find customer link: {}", e)))?;

        row.map(CustomerLink::try_from).transpose()
    }
}
