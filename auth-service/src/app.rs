use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{FromRef, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use common_auth::{Role, TokenCodec};
use common_http_errors::ApiError;
use common_security::{authorize, AuthorizationRules, SecurityResult};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, warn};

use crate::admin_handlers::{grant_role, list_users, moderator_board};
use crate::config::AuthConfig;
use crate::credentials::CredentialVerifier;
use crate::filter::authenticate;
use crate::metrics::AuthMetrics;
use crate::resolver::PrincipalResolver;
use crate::store::{AuthStore, UserStore};
use crate::user_handlers::{current_user, list_roles, signin, signup};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub codec: Arc<TokenCodec>,
    pub verifier: CredentialVerifier,
    pub resolver: PrincipalResolver,
    pub rules: Arc<AuthorizationRules>,
    pub config: Arc<AuthConfig>,
    pub metrics: Arc<AuthMetrics>,
}

impl FromRef<AppState> for Arc<AuthorizationRules> {
    fn from_ref(state: &AppState) -> Self {
        state.rules.clone()
    }
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: AuthConfig) -> Result<Self>
    where
        S: AuthStore + 'static,
    {
        let codec = TokenCodec::new(&config.jwt).context("Failed to build token codec")?;
        let rules = authorization_rules(&config).context("Invalid authorization rules")?;
        let metrics = AuthMetrics::new()?;
        let users: Arc<dyn UserStore> = store.clone();

        Ok(Self {
            store,
            codec: Arc::new(codec),
            verifier: CredentialVerifier::new(users.clone()),
            resolver: PrincipalResolver::new(users),
            rules: Arc::new(rules),
            config: Arc::new(config),
            metrics: Arc::new(metrics),
        })
    }

    pub fn record_login_metric(&self, outcome: &str) {
        self.metrics.login_attempt(outcome);
    }

    pub fn record_signup_metric(&self, outcome: &str) {
        self.metrics.signup(outcome);
    }
}

/// Public patterns from configuration followed by the fixed endpoint rules.
pub fn authorization_rules(config: &AuthConfig) -> SecurityResult<AuthorizationRules> {
    AuthorizationRules::new()
        .permit_all(&config.public_paths)?
        .require(None, "/api/admin/**", Role::Admin)?
        .require(Some(Method::GET), "/metrics", Role::Admin)?
        .require(None, "/api/moderator/**", Role::Moderator)
}

/// Full service router. The authentication filter wraps the authorization
/// gate so every route, including the fallback, sees a security context.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/signup", post(signup))
        .route("/api/user/me", get(current_user))
        .route("/api/roles", get(list_roles))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:user_id/roles", post(grant_role))
        .route("/api/moderator/board", get(moderator_board))
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AuthConfig) -> CorsLayer {
    let origins = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            error!(?err, "Failed to render metrics");
            ApiError::internal().into_response()
        }
    }
}
