// Postgres persistence for harvested grants.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::Result;
use crate::{GrantStore, StoredGrant, UpsertGrant};

pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl GrantStore for PgGrantStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredGrant>> {
        let row = sqlx::query_as::<_, StoredGrant>(
            r#"
            SELECT * FROM grants
            WHERE fingerprint = $1
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, grant: &UpsertGrant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO grants
                (fingerprint, name, provider, provider_type,
                 amount_min, amount_max, deadline, description,
                 sectors, stages, eligibility, url, contact_email,
                 is_active, source_url, source_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, now(), now())
            "#,
        )
        .bind(&grant.fingerprint)
        .bind(&grant.name)
        .bind(&grant.provider)
        .bind(&grant.provider_type)
        .bind(grant.amount_min)
        .bind(grant.amount_max)
        .bind(&grant.deadline)
        .bind(&grant.description)
        .bind(&grant.sectors)
        .bind(&grant.stages)
        .bind(&grant.eligibility)
        .bind(&grant.url)
        .bind(&grant.contact_email)
        .bind(grant.is_active)
        .bind(&grant.source_url)
        .bind(&grant.source_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, grant: &UpsertGrant) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE grants SET
                name = $2, provider = $3, provider_type = $4,
                amount_min = $5, amount_max = $6, deadline = $7,
                description = $8, sectors = $9, stages = $10,
                eligibility = $11, url = $12, contact_email = $13,
                is_active = $14, source_url = $15, source_name = $16,
                updated_at = now()
            WHERE fingerprint = $1
            "#,
        )
        .bind(&grant.fingerprint)
        .bind(&grant.name)
        .bind(&grant.provider)
        .bind(&grant.provider_type)
        .bind(grant.amount_min)
        .bind(grant.amount_max)
        .bind(&grant.deadline)
        .bind(&grant.description)
        .bind(&grant.sectors)
        .bind(&grant.stages)
        .bind(&grant.eligibility)
        .bind(&grant.url)
        .bind(&grant.contact_email)
        .bind(grant.is_active)
        .bind(&grant.source_url)
        .bind(&grant.source_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
