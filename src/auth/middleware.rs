use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{Error, HttpRequest};
use uuid::Uuid;

use super::jwt::validate_token;
use super::model::Claims;
use crate::db::AppState;

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| {
            if auth.starts_with("Bearer ") {
                Some(auth[7..].to_string())
            } else {
                None
            }
        })
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest) -> Result<Claims, Error> {
    let token =
        extract_token(req).ok_or_else(|| ErrorUnauthorized("Missing authorization token"))?;

    let claims = validate_token(&token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        ErrorUnauthorized("Invalid or expired token")
    })?;

    Ok(claims)
}

/// Resolve the bearer token to the owning user's id.
///
/// Fails with 401 when the token is missing, malformed, expired, or its
/// subject no longer maps to a stored account.
pub async fn authenticate_request(req: &HttpRequest, state: &AppState) -> Result<Uuid, Error> {
    let claims = validate_request_token(req)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ErrorUnauthorized("Not authorized, token failed"))?;

    let user = state.get_user_by_id(&user_id).await.map_err(|e| {
        log::error!("Database error while resolving token subject: {:?}", e);
        ErrorInternalServerError("Authentication lookup failed")
    })?;

    if user.is_none() {
        return Err(ErrorUnauthorized("Not authorized, user not found"));
    }

    Ok(user_id)
}
