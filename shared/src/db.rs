use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use notehub_config::DbConfig;

pub type DbPool = Pool<Postgres>;

/// Account row. `hashed_password` never leaves the backend; response
/// schemas in the routes layer copy out the public fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// NULL means the folder sits at the root of the tree
    pub parent_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    /// JSON array string, see [`encode_tags`] / [`decode_tags`]
    pub tags: Option<String>,
    pub color: Option<String>,
    pub folder_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_pool(database_url: &str, db_config: &DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            db_config.acquire_timeout_secs,
        ))
        .idle_timeout(Some(std::time::Duration::from_secs(
            db_config.idle_timeout_secs,
        )))
        .test_before_acquire(true) // Test connections before returning from pool
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Build a pool without touching the database. Connections are only
/// established on first use, so services can start while Postgres is
/// still coming up (the health endpoint reports the real state).
pub fn create_lazy_pool(database_url: &str, db_config: &DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            db_config.acquire_timeout_secs,
        ))
        .connect_lazy(database_url)
        .context("Invalid database URL")?;

    Ok(pool)
}

// ============================================================================
// Tags codec
// ============================================================================
//
// The tags column is a VARCHAR holding a JSON array string, e.g.
// `["work","urgent"]`. Rows written by older tooling may hold a bare
// comma-separated list instead, so decoding falls back to splitting.

pub fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).context("Failed to encode tags")
}

pub fn decode_tags(raw: &str) -> Vec<String> {
    if let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) {
        return tags;
    }

    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ============================================================================
// Users
// ============================================================================

/// Create a new user with a bcrypt-hashed password
pub async fn create_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<User> {
    let hashed_password = hash(password, DEFAULT_COST).context("Failed to hash password")?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, hashed_password, full_name)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, hashed_password, full_name, is_active, created_at, last_login
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(full_name)
    .fetch_one(pool)
    .await
    .context("Failed to create user")?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, hashed_password, full_name, is_active, created_at, last_login
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, hashed_password, full_name, is_active, created_at, last_login
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Record a successful login timestamp
pub async fn touch_last_login(pool: &DbPool, user_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET last_login = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Partial profile update. `None` fields keep their current value.
pub async fn update_user_profile(
    pool: &DbPool,
    user_id: i64,
    email: Option<&str>,
    full_name: Option<&str>,
    is_active: Option<bool>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = COALESCE($1, email),
            full_name = COALESCE($2, full_name),
            is_active = COALESCE($3, is_active)
        WHERE id = $4
        RETURNING id, username, email, hashed_password, full_name, is_active, created_at, last_login
        "#,
    )
    .bind(email)
    .bind(full_name)
    .bind(is_active)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to update user profile")?;

    Ok(user)
}

/// Check a plaintext password against a stored bcrypt hash
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool> {
    verify(password, hashed_password).context("Failed to verify password")
}

// ============================================================================
// Notes
// ============================================================================

pub async fn create_note(
    pool: &DbPool,
    user_id: i64,
    title: &str,
    content: Option<&str>,
    tags: Option<&str>,
    color: Option<&str>,
    folder_id: Option<i64>,
) -> Result<Note> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (title, content, tags, color, folder_id, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, content, tags, color, folder_id, user_id, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(tags)
    .bind(color)
    .bind(folder_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to create note")?;

    Ok(note)
}

/// List a user's notes, optionally restricted to one folder
pub async fn list_notes(
    pool: &DbPool,
    user_id: i64,
    folder_id: Option<i64>,
) -> Result<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, title, content, tags, color, folder_id, user_id, created_at, updated_at
        FROM notes
        WHERE user_id = $1
          AND ($2::BIGINT IS NULL OR folder_id = $2)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .bind(folder_id)
    .fetch_all(pool)
    .await?;

    Ok(notes)
}

/// Fetch one note, scoped to its owner. Another user's note comes back
/// as `None`, indistinguishable from a missing row.
pub async fn get_note(pool: &DbPool, user_id: i64, note_id: i64) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, title, content, tags, color, folder_id, user_id, created_at, updated_at
        FROM notes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(note)
}

/// Partial note update, owner-scoped. `None` fields keep their value.
pub async fn update_note(
    pool: &DbPool,
    user_id: i64,
    note_id: i64,
    title: Option<&str>,
    content: Option<&str>,
    tags: Option<&str>,
    color: Option<&str>,
    folder_id: Option<i64>,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = COALESCE($1, title),
            content = COALESCE($2, content),
            tags = COALESCE($3, tags),
            color = COALESCE($4, color),
            folder_id = COALESCE($5, folder_id),
            updated_at = NOW()
        WHERE id = $6 AND user_id = $7
        RETURNING id, title, content, tags, color, folder_id, user_id, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(tags)
    .bind(color)
    .bind(folder_id)
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(note)
}

/// Delete a note, owner-scoped. Returns whether a row was removed.
pub async fn delete_note(pool: &DbPool, user_id: i64, note_id: i64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM notes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Folders
// ============================================================================

pub async fn create_folder(
    pool: &DbPool,
    user_id: i64,
    name: &str,
    color: Option<&str>,
    icon: Option<&str>,
    parent_id: Option<i64>,
) -> Result<Folder> {
    let folder = sqlx::query_as::<_, Folder>(
        r#"
        INSERT INTO folders (name, color, icon, parent_id, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, color, icon, parent_id, user_id, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(color)
    .bind(icon)
    .bind(parent_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to create folder")?;

    Ok(folder)
}

/// List a user's folders, optionally restricted to one parent
pub async fn list_folders(
    pool: &DbPool,
    user_id: i64,
    parent_id: Option<i64>,
) -> Result<Vec<Folder>> {
    let folders = sqlx::query_as::<_, Folder>(
        r#"
        SELECT id, name, color, icon, parent_id, user_id, created_at, updated_at
        FROM folders
        WHERE user_id = $1
          AND ($2::BIGINT IS NULL OR parent_id = $2)
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .bind(parent_id)
    .fetch_all(pool)
    .await?;

    Ok(folders)
}

pub async fn get_folder(pool: &DbPool, user_id: i64, folder_id: i64) -> Result<Option<Folder>> {
    let folder = sqlx::query_as::<_, Folder>(
        r#"
        SELECT id, name, color, icon, parent_id, user_id, created_at, updated_at
        FROM folders
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(folder_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(folder)
}

/// Direct children of one folder
pub async fn folder_children(
    pool: &DbPool,
    user_id: i64,
    folder_id: i64,
) -> Result<Vec<Folder>> {
    let folders = sqlx::query_as::<_, Folder>(
        r#"
        SELECT id, name, color, icon, parent_id, user_id, created_at, updated_at
        FROM folders
        WHERE parent_id = $1 AND user_id = $2
        ORDER BY name
        "#,
    )
    .bind(folder_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(folders)
}

/// Partial folder update, owner-scoped. Parent validation (existence,
/// self-parenting) happens in the routes layer before the write.
pub async fn update_folder(
    pool: &DbPool,
    user_id: i64,
    folder_id: i64,
    name: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
    parent_id: Option<i64>,
) -> Result<Option<Folder>> {
    let folder = sqlx::query_as::<_, Folder>(
        r#"
        UPDATE folders
        SET name = COALESCE($1, name),
            color = COALESCE($2, color),
            icon = COALESCE($3, icon),
            parent_id = COALESCE($4, parent_id),
            updated_at = NOW()
        WHERE id = $5 AND user_id = $6
        RETURNING id, name, color, icon, parent_id, user_id, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(color)
    .bind(icon)
    .bind(parent_id)
    .bind(folder_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(folder)
}

/// Delete a folder, moving its notes and child folders to the root in
/// the same transaction. Returns whether the folder existed.
pub async fn delete_folder_reparent(
    pool: &DbPool,
    user_id: i64,
    folder_id: i64,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // 1. Notes in the deleted folder move to the root
    sqlx::query(
        r#"
        UPDATE notes
        SET folder_id = NULL
        WHERE folder_id = $1 AND user_id = $2
        "#,
    )
    .bind(folder_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .context("Failed to reparent notes")?;

    // 2. Child folders move to the root
    sqlx::query(
        r#"
        UPDATE folders
        SET parent_id = NULL
        WHERE parent_id = $1 AND user_id = $2
        "#,
    )
    .bind(folder_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .context("Failed to reparent child folders")?;

    // 3. Delete the folder itself
    let result = sqlx::query(
        r#"
        DELETE FROM folders
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(folder_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .context("Failed to delete folder")?;

    tx.commit().await.context("Failed to commit transaction")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tags_json_array() {
        let tags = vec!["work".to_string(), "urgent".to_string()];
        assert_eq!(encode_tags(&tags).unwrap(), r#"["work","urgent"]"#);
        assert_eq!(encode_tags(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_decode_tags_json_array() {
        assert_eq!(
            decode_tags(r#"["work","urgent"]"#),
            vec!["work".to_string(), "urgent".to_string()]
        );
        assert!(decode_tags("[]").is_empty());
    }

    #[test]
    fn test_decode_tags_legacy_comma_list() {
        assert_eq!(
            decode_tags("work, urgent,  personal"),
            vec![
                "work".to_string(),
                "urgent".to_string(),
                "personal".to_string()
            ]
        );
    }

    #[test]
    fn test_decode_tags_plain_word() {
        assert_eq!(decode_tags("todo"), vec!["todo".to_string()]);
    }

    #[test]
    fn test_decode_tags_empty() {
        assert!(decode_tags("").is_empty());
    }

    #[test]
    fn test_tags_roundtrip() {
        let tags = vec!["a".to_string(), "b c".to_string(), "d,e".to_string()];
        let encoded = encode_tags(&tags).unwrap();
        assert_eq!(decode_tags(&encoded), tags);
    }

    // bcrypt does not export its MIN_COST; this mirrors its value (4)
    const MIN_COST: u32 = 4;

    #[test]
    fn test_verify_password_roundtrip() {
        // MIN_COST keeps the test fast; production hashing uses DEFAULT_COST
        let hashed = hash("Correct1!", MIN_COST).unwrap();
        assert!(verify_password("Correct1!", &hashed).unwrap());
        assert!(!verify_password("Wrong1!", &hashed).unwrap());
    }

    #[test]
    fn test_verify_password_bad_hash() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }
}
