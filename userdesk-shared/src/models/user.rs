/// User model and database operations
///
/// This module provides the User model and CRUD operations for the single
/// `users` table. Each row is joined to an account at the external identity
/// provider via `subject_id`; the provider owns the canonical credential
/// record, this table keeps the profile fields and a local hash of the
/// password.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     subject_id TEXT NOT NULL UNIQUE,
///     name TEXT NOT NULL,
///     last_name TEXT NOT NULL,
///     document_type TEXT NOT NULL DEFAULT '',
///     document_number TEXT NOT NULL,
///     cell_phone TEXT NOT NULL DEFAULT '',
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     roles TEXT[] NOT NULL DEFAULT '{}',
///     profile_image TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Email uniqueness is NOT a database constraint: the orchestration layer
/// pre-checks with [`User::find_by_email`] before creating the provider
/// account, so a race window between check and insert exists.
///
/// # Example
///
/// ```no_run
/// use userdesk_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let new_user = CreateUser {
///     subject_id: "prov-subject-1".to_string(),
///     name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     document_type: "DNI".to_string(),
///     document_number: "12345678".to_string(),
///     cell_phone: "999888777".to_string(),
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     roles: vec!["USER".to_string()],
///     profile_image: String::new(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User account record
///
/// `subject_id` is assigned by the identity provider at account creation and
/// never changes afterwards. `password_hash` is an Argon2id hash, never the
/// plaintext, and is kept in sync with the provider's password by two
/// separate, non-atomic calls.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Store-assigned numeric identifier
    pub id: i32,

    /// External identity-provider subject identifier (unique, immutable)
    pub subject_id: String,

    /// Given name
    pub name: String,

    /// Family name
    pub last_name: String,

    /// Document-type code (e.g. "DNI", "CE")
    pub document_type: String,

    /// Document number
    pub document_number: String,

    /// Phone number
    pub cell_phone: String,

    /// Email address; must match the provider account's email
    pub email: String,

    /// Argon2id hash of the password
    pub password_hash: String,

    /// Role labels; the first entry is the primary role used for the
    /// provider's role claim
    pub roles: Vec<String>,

    /// Public URL of the profile image, empty string when absent
    pub profile_image: String,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user record
///
/// All fields are required; `profile_image` is the empty string when no
/// image was uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Provider-assigned subject identifier
    pub subject_id: String,

    /// Given name
    pub name: String,

    /// Family name
    pub last_name: String,

    /// Document-type code
    pub document_type: String,

    /// Document number
    pub document_number: String,

    /// Phone number
    pub cell_phone: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password!)
    pub password_hash: String,

    /// Role labels
    pub roles: Vec<String>,

    /// Public image URL or empty string
    pub profile_image: String,
}

impl User {
    /// Creates a new user record
    ///
    /// # Errors
    ///
    /// Returns an error if the subject id already exists (unique constraint)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (subject_id, name, last_name, document_type, document_number,
                               cell_phone, email, password_hash, roles, profile_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, subject_id, name, last_name, document_type, document_number,
                      cell_phone, email, password_hash, roles, profile_image,
                      created_at, updated_at
            "#,
        )
        .bind(data.subject_id)
        .bind(data.name)
        .bind(data.last_name)
        .bind(data.document_type)
        .bind(data.document_number)
        .bind(data.cell_phone)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.roles)
        .bind(data.profile_image)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by numeric id
    ///
    /// Returns the user if found, None otherwise.
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, subject_id, name, last_name, document_type, document_number,
                   cell_phone, email, password_hash, roles, profile_image,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// This is the lookup backing the email-uniqueness pre-check.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, subject_id, name, last_name, document_type, document_number,
                   cell_phone, email, password_hash, roles, profile_image,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by the identity-provider subject identifier
    ///
    /// This is how self-service requests resolve the caller's own record
    /// from the bearer token's `sub` claim.
    pub async fn find_by_subject(
        pool: &PgPool,
        subject_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, subject_id, name, last_name, document_type, document_number,
                   cell_phone, email, password_hash, roles, profile_image,
                   created_at, updated_at
            FROM users
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Saves a mutated record back to the store
    ///
    /// Writes every mutable column; callers decide which fields to change on
    /// the in-memory record first. `subject_id` and `created_at` are never
    /// rewritten, `updated_at` is bumped.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::RowNotFound` if the record vanished between
    /// lookup and save.
    pub async fn save(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, last_name = $3, document_type = $4, document_number = $5,
                cell_phone = $6, email = $7, password_hash = $8, roles = $9,
                profile_image = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING id, subject_id, name, last_name, document_type, document_number,
                      cell_phone, email, password_hash, roles, profile_image,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.document_type)
        .bind(&user.document_number)
        .bind(&user.cell_phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(&user.profile_image)
        .fetch_one(pool)
        .await?;

        Ok(saved)
    }

    /// Deletes a user record by id
    ///
    /// Returns true if a row was deleted, false if the id didn't exist.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all user records, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, subject_id, name, last_name, document_type, document_number,
                   cell_phone, email, password_hash, roles, profile_image,
                   created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Primary role label for provider claims
    ///
    /// First entry of the role list, falling back to `USER` when the list is
    /// empty.
    pub fn primary_role(&self) -> &str {
        self.roles.first().map(String::as_str).unwrap_or("USER")
    }
}
