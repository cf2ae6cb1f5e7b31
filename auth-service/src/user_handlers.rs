use std::collections::BTreeSet;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use common_auth::{Role, UserId};
use common_http_errors::ApiError;
use common_security::{CurrentPrincipal, SecurityError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use validator::{Validate, ValidationError};

use crate::app::AppState;
use crate::credentials::{hash_password, CredentialError};
use crate::error::HandlerResult;
use crate::resolver::{principal_for, ResolveError};
use crate::store::{NewUserRecord, RoleStore, StoreError, UserStore};

const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "identifier")]
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthenticationResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 4, max = 40), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 3, max = 15), custom(function = "not_blank"))]
    pub username: String,
    #[validate(email, length(max = 40), custom(function = "not_blank"))]
    pub email: String,
    #[validate(length(min = 6, max = 100), custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub authorities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RoleView {
    pub id: i64,
    pub name: Role,
    pub authority: &'static str,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HandlerResult<Json<JwtAuthenticationResponse>> {
    let Json(login) = payload.map_err(|rejection| {
        state.record_login_metric("invalid_request");
        invalid_body(rejection)
    })?;
    let LoginRequest {
        username_or_email,
        password,
    } = login;

    let user = match state.verifier.verify(&username_or_email, &password).await {
        Ok(user) => user,
        Err(CredentialError::Store(err)) => {
            error!(error = %err, "Credential lookup failed");
            state.record_login_metric("error");
            return Err(ApiError::internal().into());
        }
        Err(err) => {
            warn!(reason = err.kind(), "Login rejected");
            state.record_login_metric(err.kind());
            return Err(SecurityError::BadCredentials.into());
        }
    };

    let principal = match principal_for(&user) {
        Ok(principal) => principal,
        Err(ResolveError::Store(err)) => {
            error!(user_id = %user.id, error = %err, "Failed to build principal");
            state.record_login_metric("error");
            return Err(ApiError::internal().into());
        }
        Err(err) => {
            warn!(user_id = %user.id, error = %err, "Login rejected");
            state.record_login_metric("missing_base_role");
            return Err(SecurityError::BadCredentials.into());
        }
    };

    let issued = state.codec.issue(principal.id()).map_err(|err| {
        error!(user_id = %principal.id(), error = %err, "Failed to issue access token");
        state.record_login_metric("error");
        ApiError::internal()
    })?;

    info!(user_id = %principal.id(), "User signed in");
    state.record_login_metric("success");

    Ok(Json(JwtAuthenticationResponse {
        access_token: issued.token,
        token_type: TOKEN_TYPE,
        username: principal.username().to_string(),
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> HandlerResult<(StatusCode, Json<ApiResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        state.record_signup_metric("invalid");
        invalid_body(rejection)
    })?;
    if let Err(errors) = request.validate() {
        state.record_signup_metric("invalid");
        return Err(ApiError::bad_request("validation_failed", errors.to_string()).into());
    }

    let store = &state.store;
    if store.exists_by_username(&request.username).await.map_err(internal)? {
        state.record_signup_metric("conflict");
        return Err(username_taken().into());
    }
    if store.exists_by_email(&request.email).await.map_err(internal)? {
        state.record_signup_metric("conflict");
        return Err(email_taken().into());
    }

    if !store.list_roles().await.map_err(internal)?.contains(&Role::User) {
        error!("USER role is not seeded; refusing sign-up");
        state.record_signup_metric("error");
        return Err(ApiError::internal().into());
    }

    let password_hash = hash_password(&request.password).map_err(|err| {
        error!(error = %err, "Failed to hash password");
        ApiError::internal()
    })?;

    let SignUpRequest {
        name,
        username,
        email,
        ..
    } = request;

    let created = store
        .insert_user(NewUserRecord {
            name,
            username,
            email,
            password_hash,
            roles: BTreeSet::from([Role::User]),
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, "User registered");
            state.record_signup_metric("created");
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    success: true,
                    message: "User registered successfully".to_string(),
                }),
            ))
        }
        Err(StoreError::Conflict(constraint)) => {
            state.record_signup_metric("conflict");
            if constraint.contains("email") {
                Err(email_taken().into())
            } else {
                Err(username_taken().into())
            }
        }
        Err(err) => {
            state.record_signup_metric("error");
            Err(internal(err).into())
        }
    }
}

pub async fn current_user(CurrentPrincipal(principal): CurrentPrincipal) -> Json<UserSummary> {
    Json(UserSummary {
        id: principal.id(),
        username: principal.username().to_string(),
        authorities: principal.authorities().collect(),
    })
}

pub async fn list_roles(State(state): State<AppState>) -> HandlerResult<Json<Vec<RoleView>>> {
    let roles = state.store.list_roles().await.map_err(internal)?;
    Ok(Json(
        roles
            .into_iter()
            .map(|role| RoleView {
                id: role.id(),
                name: role,
                authority: role.authority(),
            })
            .collect(),
    ))
}

/// Payload errors get one fixed message; the extractor's detail stays in the logs.
fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection, "Rejected request body");
    ApiError::bad_request("invalid_request", "Request body is not valid JSON for this endpoint")
}

fn username_taken() -> ApiError {
    ApiError::conflict("username_taken", "Username is already taken!")
}

fn email_taken() -> ApiError {
    ApiError::conflict("email_taken", "Email Address already in use!")
}

pub(crate) fn internal(err: StoreError) -> ApiError {
    error!(error = %err, "Store operation failed");
    ApiError::internal()
}
