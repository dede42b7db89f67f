use secondhand_core::{LedgerError, LedgerResult};
use uuid::Uuid;

/// Offered amounts are strictly positive.
pub fn validate_price(price: i64) -> LedgerResult<()> {
    if price <= 0 {
        return Err(LedgerError::bad_request("price must be a positive amount"));
    }
    Ok(())
}

/// A buyer can never bid on a listing they own.
pub fn ensure_distinct_parties(seller_id: Uuid, buyer_id: Uuid) -> LedgerResult<()> {
    if seller_id == buyer_id {
        return Err(LedgerError::bad_request("you cannot buy your own product"));
    }
    Ok(())
}

pub fn ensure_profile_complete(complete: bool) -> LedgerResult<()> {
    if !complete {
        return Err(LedgerError::bad_request("complete your profile first"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_must_be_positive() {
        assert!(validate_price(1).is_ok());
        assert!(validate_price(50_000).is_ok());
        assert!(matches!(validate_price(0), Err(LedgerError::BadRequest(_))));
        assert!(matches!(validate_price(-10), Err(LedgerError::BadRequest(_))));
    }

    #[test]
    fn test_self_dealing_rejected() {
        let id = Uuid::new_v4();
        assert!(matches!(ensure_distinct_parties(id, id), Err(LedgerError::BadRequest(_))));
        assert!(ensure_distinct_parties(id, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_incomplete_profile_rejected() {
        assert!(ensure_profile_complete(true).is_ok());
        let err = ensure_profile_complete(false).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: complete your profile first");
    }
}
