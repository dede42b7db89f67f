use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use secondhand_core::{
    LedgerError, OfferDetail, OfferRecord, OfferWithCounterparty, OfferWithProduct,
    ProfileSummary, Requester,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub product_id: Uuid,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct RevisePriceRequest {
    pub price: i64,
}

/// `?accepted=true|false` sets the state; no query toggles it.
#[derive(Debug, Deserialize)]
pub struct AcceptanceQuery {
    pub accepted: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    pub offer_id: Uuid,
    pub accepted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyerOffersResponse {
    pub buyer: ProfileSummary,
    pub offers: Vec<OfferWithProduct>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/offers
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppJson(req): AppJson<CreateOfferRequest>,
) -> Result<(StatusCode, Json<OfferRecord>), AppError> {
    let offer = state
        .ledger
        .create_offer(requester.id, req.product_id, req.price)
        .await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// PUT /v1/offers/{id}/price
/// Only the buyer may revise, and only while the offer is open.
pub async fn revise_offer(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(offer_id): AppPath<Uuid>,
    AppJson(req): AppJson<RevisePriceRequest>,
) -> Result<Json<OfferRecord>, AppError> {
    let offer = state
        .ledger
        .revise_offer(offer_id, requester.id, req.price)
        .await?;
    Ok(Json(offer))
}

/// PUT /v1/offers/{id}/acceptance
pub async fn update_acceptance(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(offer_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<AcceptanceQuery>,
) -> Result<Json<AcceptanceResponse>, AppError> {
    let scope = requester.seller_scope();

    let accepted = match query.accepted {
        Some(target) => state
            .ledger
            .set_acceptance(offer_id, scope, target)
            .await?
            .accepted(),
        None => state.ledger.toggle_acceptance(offer_id, scope).await?,
    };

    Ok(Json(AcceptanceResponse { offer_id, accepted }))
}

/// DELETE /v1/offers/{id}
pub async fn withdraw_offer(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(offer_id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ledger.withdraw_offer(offer_id, &requester).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/offers/{id}
pub async fn get_offer(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(offer_id): AppPath<Uuid>,
) -> Result<Json<OfferDetail>, AppError> {
    let detail = state.ledger.offer_detail(offer_id, &requester).await?;
    Ok(Json(detail))
}

/// GET /v1/offers/received
pub async fn offers_received(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<Vec<OfferWithCounterparty>>, AppError> {
    Ok(Json(state.ledger.offers_received(requester.id).await?))
}

/// GET /v1/offers/placed
pub async fn offers_placed(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<Vec<OfferWithCounterparty>>, AppError> {
    Ok(Json(state.ledger.offers_placed(requester.id).await?))
}

/// GET /v1/buyers/{id}/offers
/// One buyer's offers on the caller's products, with the buyer's profile.
pub async fn buyer_offers(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    AppPath(buyer_id): AppPath<Uuid>,
) -> Result<Json<BuyerOffersResponse>, AppError> {
    let buyer = state
        .profiles
        .profile_summary(buyer_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("buyer", buyer_id))?;

    let offers = state.ledger.offers_by_buyer(buyer_id, requester.id).await?;
    Ok(Json(BuyerOffersResponse { buyer, offers }))
}
