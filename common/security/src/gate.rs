use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::context::SecurityContext;
use crate::entry_point;
use crate::policy::{AuthorizationRules, Decision};

/// Authorization gate middleware.
///
/// Must run after the authentication filter has placed a [`SecurityContext`]
/// in the request extensions; a request without one is treated as anonymous.
pub async fn authorize(
    State(rules): State<Arc<AuthorizationRules>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = {
        let anonymous = SecurityContext::anonymous();
        let context = request
            .extensions()
            .get::<SecurityContext>()
            .unwrap_or(&anonymous);
        rules.evaluate(request.method(), request.uri().path(), context)
    };

    match decision {
        Decision::Permit => next.run(request).await,
        Decision::Deny(reason) => {
            debug!(
                method = %request.method(),
                path = request.uri().path(),
                ?reason,
                "access denied"
            );
            entry_point::unauthorized()
        }
    }
}
