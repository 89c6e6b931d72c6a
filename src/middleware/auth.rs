use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Principal, TokenVerifier};
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller from the `Authorization` header.
///
/// No header (or an empty one) is a 401; a header that cannot be verified is a 400.
pub fn authorize_request(headers: &HeaderMap, verifier: &TokenVerifier) -> Result<Principal, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(ApiError::missing_credential)?;

    let raw = header
        .to_str()
        .map_err(|_| ApiError::invalid_credential())?;

    Ok(verifier.verify(raw)?)
}

/// Gate for mutating routes. Injects the verified `Principal` into request
/// extensions; the handler and its body extractor never run on failure.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authorize_request(request.headers(), &state.verifier).map_err(|e| {
        tracing::warn!(
            "Rejected {} {}: {}",
            request.method(),
            request.uri().path(),
            e
        );
        e
    })?;

    tracing::debug!("Authenticated principal '{}'", principal.subject);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
