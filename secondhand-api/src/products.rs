use axum::{
    extract::State,
    Extension, Json,
};
use secondhand_core::{LedgerError, ProductOffers, Requester};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MarkSoldRequest {
    pub sold: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkSoldResponse {
    pub product_id: Uuid,
    pub sold: bool,
    pub retired_offers: u64,
}

/// GET /v1/products/{id}/offers
pub async fn product_offers(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(product_id): AppPath<Uuid>,
) -> Result<Json<ProductOffers>, AppError> {
    let offers = state.ledger.offers_for_product(product_id, &requester).await?;
    Ok(Json(offers))
}

/// PUT /v1/products/{id}/sold
///
/// Selling a product retires every offer on it that was not accepted.
/// Marking it unsold again leaves retired offers deleted.
pub async fn mark_sold(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(product_id): AppPath<Uuid>,
    AppJson(req): AppJson<MarkSoldRequest>,
) -> Result<Json<MarkSoldResponse>, AppError> {
    let product = state
        .products
        .find_product(product_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("product", product_id))?;

    requester.authorize(
        &[product.owner_id],
        "only the seller and admin can change the sale state",
    )?;

    if !state.sales.set_sold(product_id, req.sold).await? {
        return Err(LedgerError::not_found("product", product_id).into());
    }
    info!("Product {} marked sold={} by {}", product_id, req.sold, requester.id);

    let retired_offers = if req.sold {
        state.ledger.retire_open_offers(product_id).await?
    } else {
        0
    };

    Ok(Json(MarkSoldResponse {
        product_id,
        sold: req.sold,
        retired_offers,
    }))
}
