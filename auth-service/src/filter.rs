use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common_auth::{bearer_token, AuthError};
use common_http_errors::ApiError;
use common_security::SecurityContext;
use tracing::{debug, error, warn};

use crate::app::AppState;
use crate::resolver::ResolveError;
use crate::store::StoreError;

/// Request authentication filter.
///
/// Turns an `Authorization: Bearer` header into a [`SecurityContext`] and
/// always hands the request on. Token and resolution failures leave the
/// context anonymous; only store failures end the request here.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match establish_context(&state, request.headers()).await {
        Ok(context) => context,
        Err(err) => {
            error!(error = %err, "principal lookup failed");
            return ApiError::internal().into_response();
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

async fn establish_context(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SecurityContext, StoreError> {
    let token = match bearer_token(headers) {
        Ok(token) => token,
        Err(AuthError::MissingAuthorization) => return Ok(SecurityContext::anonymous()),
        Err(err) => {
            debug!(reason = err.rejection_reason(), "ignoring unusable authorization header");
            return Ok(SecurityContext::anonymous());
        }
    };

    let claims = match state.codec.validate(&token) {
        Ok(claims) => claims,
        Err(err) => {
            let reason = err.rejection_reason();
            debug!(reason, error = %err, "bearer token rejected");
            state.metrics.token_rejection(reason);
            return Ok(SecurityContext::anonymous());
        }
    };

    match state.resolver.resolve_by_id(claims.subject).await {
        Ok(principal) => Ok(SecurityContext::authenticated(principal)),
        Err(ResolveError::Store(err)) => Err(err),
        Err(err) => {
            warn!(user_id = %claims.subject, error = %err, "token subject could not be resolved");
            state.metrics.token_rejection("unresolved");
            Ok(SecurityContext::anonymous())
        }
    }
}
