#![allow(dead_code)]

use std::collections::BTreeSet;
use std::env;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use auth_service::config::AuthConfig;
use auth_service::credentials::hash_password;
use auth_service::seed::seed_roles;
use auth_service::store::{
    AuthStore, InMemoryStore, NewUserRecord, RoleStore, StoreError, StoreResult, UserIdentity,
    UserStore,
};
use auth_service::{build_router, AppState};
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use common_auth::{Role, UserId};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-with-32-bytes!";
pub const PASSWORD: &str = "secret1";

pub fn test_config() -> AuthConfig {
    AuthConfig::with_secret(SECRET)
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Router over a seeded in-memory store.
    pub async fn new() -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        seed_roles(store.as_ref()).await?;
        let state = AppState::new(store.clone(), test_config())?;
        Ok(Self {
            store,
            router: build_router(state.clone()),
            state,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        send(&self.router, request).await
    }

    /// Inserts an account directly, bypassing sign-up validation.
    pub async fn create_user(&self, username: &str, roles: &[Role]) -> Result<UserIdentity> {
        let user = self
            .store
            .insert_user(NewUserRecord {
                name: format!("{username} tester"),
                username: username.to_string(),
                email: format!("{username}@x.com"),
                password_hash: hash_password(PASSWORD)?,
                roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            })
            .await?;
        Ok(user)
    }

    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<String> {
        let response = self
            .send(post_json(
                "/api/auth/signin",
                serde_json::json!({ "identifier": identifier, "password": password }),
                None,
            ))
            .await?;
        ensure!(
            response.status == StatusCode::OK,
            "sign-in failed with {}: {}",
            response.status,
            response.text()
        );
        let body = response.json()?;
        body["accessToken"]
            .as_str()
            .map(str::to_string)
            .context("accessToken missing from sign-in response")
    }

    pub fn issue_token(&self, id: UserId) -> Result<String> {
        Ok(self.state.codec.issue(id)?.token)
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Result<TestResponse> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes();
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("response body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, Body::empty(), token, None)
}

pub fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    request(
        Method::POST,
        uri,
        Body::from(body.to_string()),
        token,
        Some("application/json"),
    )
}

pub fn get_with_authorization(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .expect("request")
}

fn request(
    method: Method,
    uri: &str,
    body: Body,
    token: Option<&str>,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("request")
}

/// Store whose every call fails as if the database were unreachable.
pub struct FailingStore;

fn offline<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl UserStore for FailingStore {
    async fn find_by_id(&self, _id: UserId) -> StoreResult<Option<UserIdentity>> {
        offline()
    }

    async fn find_by_username_or_email(
        &self,
        _identifier: &str,
    ) -> StoreResult<Option<UserIdentity>> {
        offline()
    }

    async fn exists_by_username(&self, _username: &str) -> StoreResult<bool> {
        offline()
    }

    async fn exists_by_email(&self, _email: &str) -> StoreResult<bool> {
        offline()
    }

    async fn insert_user(&self, _user: NewUserRecord) -> StoreResult<UserIdentity> {
        offline()
    }

    async fn list_users(&self) -> StoreResult<Vec<UserIdentity>> {
        offline()
    }

    async fn grant_role(&self, _id: UserId, _role: Role) -> StoreResult<bool> {
        offline()
    }
}

#[async_trait]
impl RoleStore for FailingStore {
    async fn count_roles(&self) -> StoreResult<i64> {
        offline()
    }

    async fn insert_role(&self, _role: Role) -> StoreResult<bool> {
        offline()
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        offline()
    }
}

pub fn router_over<S>(store: Arc<S>) -> Result<(AppState, Router)>
where
    S: AuthStore + 'static,
{
    let state = AppState::new(store, test_config())?;
    Ok((state.clone(), build_router(state)))
}

pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    pub async fn setup() -> Result<Option<Self>> {
        let Ok(database_url) = env::var("AUTH_TEST_DATABASE_URL") else {
            eprintln!(
                "Skipping auth-service Postgres tests: set AUTH_TEST_DATABASE_URL to run them.",
            );
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        Ok(Some(Self { pool }))
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    /// Empties all auth tables so each test starts from a blank schema.
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("TRUNCATE user_roles, users, roles RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
