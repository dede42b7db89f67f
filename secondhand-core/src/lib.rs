pub mod identity;
pub mod models;
pub mod repository;

pub use identity::{Requester, Role, SellerScope};
pub use models::{
    OfferDetail, OfferRecord, OfferWithBuyer, OfferWithCounterparty, OfferWithProduct,
    ProductFacts, ProductOffers, ProductSummary, ProfileSummary,
};

/// Failure kinds surfaced by the offer ledger.
///
/// `NotFound` deliberately covers both "no such row" and "a conditional
/// update matched zero rows"; callers cannot tell a typo'd id from an offer
/// that was already accepted.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not authorized: {0}")]
    Authorization(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
