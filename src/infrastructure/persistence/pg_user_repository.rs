//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use super::sql_features::{Column, ColumnKind, push_conditions, push_order_by, push_pagination};
use crate::domain::entities::{NewUser, Role, User, UserPatch};
use crate::domain::query_features::QueryFeatures;
use crate::domain::repositories::{CrudRepository, UserRepository};
use crate::error::AppError;

const USER_FIELDS: &str = "u.id, u.name, u.email, u.photo, u.role, u.password, \
     u.password_changed_at, u.password_reset_token, u.password_reset_expires, \
     u.active, u.created_at, u.revision";

const USER_COLUMNS: &[Column] = &[
    Column::new("id", "u.id", ColumnKind::Uuid),
    Column::new("name", "u.name", ColumnKind::Text),
    Column::new("email", "u.email", ColumnKind::Text),
    Column::new("role", "u.role", ColumnKind::Text),
    Column::new("photo", "u.photo", ColumnKind::Text),
    Column::new("createdAt", "u.created_at", ColumnKind::Timestamp),
];

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    photo: Option<String>,
    role: String,
    password: String,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    revision: i32,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            photo: row.photo,
            role: row.role.parse::<Role>()?,
            password: row.password,
            password_changed_at: row.password_changed_at,
            password_reset_token: row.password_reset_token,
            password_reset_expires: row.password_reset_expires,
            active: row.active,
            created_at: row.created_at,
            revision: row.revision,
        })
    }
}

/// PostgreSQL repository for user accounts.
///
/// Deactivated accounts are invisible to every lookup.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_FIELDS} FROM users u WHERE u.active AND {condition}");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl CrudRepository<User> for PgUserRepository {
    async fn find_all(&self, features: &QueryFeatures) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {USER_FIELDS} FROM users u WHERE u.active = TRUE"
        ));
        push_conditions(&mut qb, USER_COLUMNS, features)?;
        push_order_by(&mut qb, USER_COLUMNS, features, "u.id");
        push_pagination(&mut qb, features);

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self, features: &QueryFeatures) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users u WHERE u.active = TRUE");
        push_conditions(&mut qb, USER_COLUMNS, features)?;

        Ok(qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_FIELDS} FROM users u WHERE u.active AND u.id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn insert(&self, new: NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users AS u (name, email, photo, role, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_FIELDS}
            "#
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(new.name)
            .bind(new.email.to_lowercase())
            .bind(new.photo)
            .bind(new.role.as_str())
            .bind(new.password)
            .fetch_one(self.pool.as_ref())
            .await?;

        row.try_into()
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        let mut qb = QueryBuilder::new("UPDATE users AS u SET revision = u.revision + 1");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(email) = patch.email {
            qb.push(", email = ").push_bind(email.to_lowercase());
        }
        if let Some(photo) = patch.photo {
            qb.push(", photo = ").push_bind(photo);
        }
        if let Some(role) = patch.role {
            qb.push(", role = ").push_bind(role.as_str());
        }
        qb.push(" WHERE u.active AND u.id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_FIELDS);

        let row: Option<UserRow> = qb
            .build_query_as()
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql =
            format!("DELETE FROM users AS u WHERE u.active AND u.id = $1 RETURNING {USER_FIELDS}");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where("u.email = $1", &email.to_lowercase())
            .await
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            "u.password_reset_token = $1 AND u.password_reset_expires > NOW()",
            token_hash,
        )
        .await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> Result<(), AppError> {
        let (hash, expires) = token.unzip();
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .bind(expires)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            UPDATE users AS u
            SET password = $2,
                password_changed_at = $3,
                password_reset_token = NULL,
                password_reset_expires = NULL,
                revision = u.revision + 1
            WHERE u.id = $1
            RETURNING {USER_FIELDS}
            "#
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(password_hash)
            .bind(changed_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        row.try_into()
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
