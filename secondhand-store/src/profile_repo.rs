use async_trait::async_trait;
use secondhand_core::repository::ProfileDirectory;
use secondhand_core::{LedgerResult, ProfileSummary};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::storage_error;

pub struct PgProfileDirectory {
    pub pool: PgPool,
}

impl PgProfileDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn is_complete(&self, account_id: Uuid) -> LedgerResult<bool> {
        // Empty strings count as missing.
        let complete: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT COALESCE(name, '') <> ''
               AND COALESCE(city, '') <> ''
               AND COALESCE(address, '') <> ''
               AND COALESCE(phone_number, '') <> ''
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("check profile", e))?;

        Ok(complete.map(|(ok,)| ok).unwrap_or(false))
    }

    async fn profile_summary(&self, account_id: Uuid) -> LedgerResult<Option<ProfileSummary>> {
        let row: Option<(Uuid, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, COALESCE(name, ''), COALESCE(city, ''), COALESCE(image_url, '')
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("fetch profile", e))?;

        Ok(row.map(|(id, name, city, image)| ProfileSummary { id, name, city, image }))
    }
}
