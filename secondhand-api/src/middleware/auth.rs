use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secondhand_core::{Requester, Role};
use secondhand_store::app_config::AuthConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn requester(&self) -> Result<Requester, AppError> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
        Ok(Requester::new(id, self.role))
    }
}

/// Sign a session token for `account_id`. Account login lives elsewhere;
/// this is what that service and the test suite share.
pub fn issue_token(
    auth: &AuthConfig,
    account_id: Uuid,
    name: &str,
    role: Role,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: account_id.to_string(),
        name: name.to_string(),
        role,
        exp: (Utc::now() + Duration::seconds(auth.jwt_expiration_seconds as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.expose().as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.jwt_secret.expose().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))?;

    let requester = token_data.claims.requester()?;
    tracing::debug!("Authenticated {} as {}", requester.id, requester.role);

    req.extensions_mut().insert(requester);
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
