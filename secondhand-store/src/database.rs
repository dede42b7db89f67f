use secondhand_core::LedgerError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(config.url.expose())
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

pub(crate) const ONE_ACCEPTED_PER_PRODUCT: &str = "offers_one_accepted_per_product";
pub(crate) const PRICE_POSITIVE: &str = "offers_price_positive";
pub(crate) const DISTINCT_PARTIES: &str = "offers_distinct_parties";

/// Domain rules backed by a named constraint in the offers table.
fn rule_violation(constraint: &str) -> Option<LedgerError> {
    match constraint {
        ONE_ACCEPTED_PER_PRODUCT => Some(LedgerError::bad_request(
            "another offer on this product has already been accepted",
        )),
        PRICE_POSITIVE => Some(LedgerError::bad_request("price must be a positive amount")),
        DISTINCT_PARTIES => Some(LedgerError::bad_request("you cannot buy your own product")),
        _ => None,
    }
}

/// Driver failures are internal; only the named rule constraints above
/// surface as bad requests.
pub(crate) fn storage_error(context: &str, err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(rule) = db_err.constraint().and_then(rule_violation) {
            return rule;
        }
    }

    error!("failed to {}, err: {}", context, err);
    LedgerError::internal(format!("failed to {}", context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_rule_constraint_has_its_own_message() {
        let messages: Vec<String> = [ONE_ACCEPTED_PER_PRODUCT, PRICE_POSITIVE, DISTINCT_PARTIES]
            .into_iter()
            .map(|name| match rule_violation(name) {
                Some(LedgerError::BadRequest(msg)) => msg,
                other => panic!("{} mapped to {:?}", name, other),
            })
            .collect();

        assert_eq!(messages[1], "price must be a positive amount");
        assert_eq!(messages[2], "you cannot buy your own product");
        assert_ne!(messages[0], messages[1]);
    }

    #[test]
    fn test_unknown_constraints_stay_internal() {
        assert!(rule_violation("offers_pkey").is_none());
        assert!(matches!(
            storage_error("fetch offer", sqlx::Error::RowNotFound),
            LedgerError::Internal(_)
        ));
    }

    #[test]
    fn test_migration_declares_the_named_constraints() {
        let sql = include_str!("../../migrations/20240101000000_marketplace.sql");
        for name in [ONE_ACCEPTED_PER_PRODUCT, PRICE_POSITIVE, DISTINCT_PARTIES] {
            assert!(sql.contains(name), "missing constraint {}", name);
        }
    }
}
