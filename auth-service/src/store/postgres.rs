use std::collections::BTreeSet;

use anyhow::Context;
use async_trait::async_trait;
use common_auth::{Role, UserId};
use sqlx::{FromRow, PgPool};

use super::{NewUserRecord, RoleStore, StoreError, StoreResult, UserIdentity, UserStore};

const SELECT_USER: &str = r#"
    SELECT u.id, u.name, u.username, u.email, u.password_hash,
           COALESCE(array_agg(ur.role_id) FILTER (WHERE ur.role_id IS NOT NULL), '{}') AS role_ids
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
"#;

// Usernames and emails share one sign-in namespace.
const IDENTIFIER_TAKEN: &str =
    "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $1)";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    email: String,
    password_hash: String,
    role_ids: Vec<i64>,
}

impl TryFrom<UserRow> for UserIdentity {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let roles = row
            .role_ids
            .iter()
            .map(|id| {
                Role::from_id(*id).ok_or_else(|| {
                    StoreError::Corrupt(format!("user {} references unknown role {id}", row.id))
                })
            })
            .collect::<StoreResult<BTreeSet<_>>>()?;

        Ok(UserIdentity {
            id: UserId(row.id),
            name: row.name,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            roles,
        })
    }
}

/// Postgres-backed user and role store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to apply auth schema migrations")
    }
}

fn user_query(filter: &str) -> String {
    format!("{SELECT_USER} WHERE {filter} GROUP BY u.id")
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserIdentity>> {
        sqlx::query_as::<_, UserRow>(&user_query("u.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(UserIdentity::try_from)
            .transpose()
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> StoreResult<Option<UserIdentity>> {
        let sql = format!(
            "{} ORDER BY (u.username = $1) DESC, u.id LIMIT 1",
            user_query("(u.username = $1 OR u.email = $1)")
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(UserIdentity::try_from)
            .transpose()
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(IDENTIFIER_TAKEN)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(IDENTIFIER_TAKEN)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserIdentity> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        for role in &user.roles {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(id)
                .bind(role.id())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(UserIdentity {
            id: UserId(id),
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
        })
    }

    async fn list_users(&self) -> StoreResult<Vec<UserIdentity>> {
        let sql = format!("{SELECT_USER} GROUP BY u.id ORDER BY u.id");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserIdentity::try_from)
            .collect()
    }

    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id.get())
        .bind(role.id())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn count_roles(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_role(&self, role: Role) -> StoreResult<bool> {
        let result =
            sqlx::query("INSERT INTO roles (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(role.id())
                .bind(role.name())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        ids.into_iter()
            .map(|id| {
                Role::from_id(id).ok_or_else(|| StoreError::Corrupt(format!("unknown role id {id}")))
            })
            .collect()
    }
}
