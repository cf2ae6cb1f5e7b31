use axum::{
    extract::{Path, State},
    Json,
};
use common_auth::{Role, UserId};
use common_http_errors::ApiError;
use common_security::CurrentPrincipal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::error::HandlerResult;
use crate::store::{UserIdentity, UserStore};
use crate::user_handlers::internal;

/// Account listing entry; password hashes never leave the store layer.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<UserIdentity> for UserView {
    fn from(user: UserIdentity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            roles: user.roles.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ModeratorBoard {
    pub moderator: String,
    pub pending: Vec<String>,
}

pub async fn list_users(State(state): State<AppState>) -> HandlerResult<Json<Vec<UserView>>> {
    let users = state.store.list_users().await.map_err(internal)?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn grant_role(
    State(state): State<AppState>,
    CurrentPrincipal(admin): CurrentPrincipal,
    Path(user_id): Path<i64>,
    Json(request): Json<GrantRoleRequest>,
) -> HandlerResult<Json<UserView>> {
    let role: Role = request
        .role
        .parse()
        .map_err(|_| ApiError::bad_request("unknown_role", format!("Unknown role '{}'", request.role)))?;
    let user_id = UserId(user_id);

    if !state.store.grant_role(user_id, role).await.map_err(internal)? {
        return Err(ApiError::not_found("user_not_found").into());
    }
    info!(admin_id = %admin.id(), %user_id, %role, "Role granted");

    let user = state
        .store
        .find_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("user_not_found"))?;
    Ok(Json(UserView::from(user)))
}

pub async fn moderator_board(CurrentPrincipal(principal): CurrentPrincipal) -> Json<ModeratorBoard> {
    Json(ModeratorBoard {
        moderator: principal.username().to_string(),
        pending: Vec::new(),
    })
}
