//! One-time Telegram link codes.
//!
//! A user gets one `telegram_links` row. Its code is redeemable until a
//! Telegram account is attached; after that the code is void. A Telegram
//! account belongs to at most one user: redeeming a code for an account that
//! is already linked elsewhere moves the account to the new user.

use rand::Rng;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::TelegramLink;
use crate::validation::{normalize_link_code, LINK_CODE_LENGTH};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Attempts before giving up on finding an unused code.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Generate a random 8-character `A-Z0-9` code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..LINK_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Get a user's link row.
pub async fn get_link(pool: &SqlitePool, user_id: &str) -> Result<Option<TelegramLink>> {
    let link = sqlx::query_as::<_, TelegramLink>(
        r#"
        SELECT user_id, link_code, telegram_id, created_at, linked_at
        FROM telegram_links
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(link)
}

/// Return the user's existing link row, creating one with a fresh code if needed.
///
/// The returned code is only redeemable while `telegram_id` is unset.
pub async fn get_or_create_link_code(pool: &SqlitePool, user_id: &str) -> Result<TelegramLink> {
    if let Some(link) = get_link(pool, user_id).await? {
        return Ok(link);
    }

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code();
        let result = sqlx::query(
            r#"
            INSERT INTO telegram_links (user_id, link_code)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&code)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                // A concurrent caller may have won the insert; read back either way.
                return get_link(pool, user_id).await?.ok_or_else(|| {
                    DatabaseError::NotFound {
                        entity: "TelegramLink",
                        id: user_id.to_string(),
                    }
                });
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!("Link code collision, retrying");
            }
            Err(e) => {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.is_foreign_key_violation() {
                        return Err(DatabaseError::NotFound {
                            entity: "User",
                            id: user_id.to_string(),
                        });
                    }
                }
                return Err(e.into());
            }
        }
    }

    Err(DatabaseError::AlreadyExists {
        entity: "LinkCode",
        id: format!("no free code after {} attempts", MAX_CODE_ATTEMPTS),
    })
}

/// Redeem a code for a Telegram account and return the linked user id.
///
/// Unknown or already-redeemed codes are `NotFound`.
pub async fn redeem_link_code(pool: &SqlitePool, code: &str, telegram_id: i64) -> Result<String> {
    let code = normalize_link_code(code)?;
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, String>(
        r#"
        SELECT user_id
        FROM telegram_links
        WHERE link_code = ? AND telegram_id IS NULL
        "#,
    )
    .bind(&code)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "LinkCode",
        id: code.clone(),
    })?;

    // Detach the account from any previous owner, voiding that row's code.
    let moved = sqlx::query(
        r#"
        DELETE FROM telegram_links
        WHERE telegram_id = ? AND user_id <> ?
        "#,
    )
    .bind(telegram_id)
    .bind(&user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE telegram_links
        SET telegram_id = ?, linked_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(telegram_id)
    .bind(&user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if moved.rows_affected() > 0 {
        tracing::info!("Re-linked telegram_id={} to user {}", telegram_id, user_id);
    } else {
        tracing::info!("Linked telegram_id={} to user {}", telegram_id, user_id);
    }

    Ok(user_id)
}

/// Find the user linked to a Telegram account.
pub async fn get_user_for_telegram(pool: &SqlitePool, telegram_id: i64) -> Result<Option<String>> {
    let user_id = sqlx::query_scalar::<_, String>(
        r#"
        SELECT user_id
        FROM telegram_links
        WHERE telegram_id = ?
        "#,
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}

/// Detach the Telegram account and issue a fresh code.
///
/// Returns false if the user had no link row.
pub async fn unlink(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let result = sqlx::query(
            r#"
            UPDATE telegram_links
            SET telegram_id = NULL, linked_at = NULL, link_code = ?
            WHERE user_id = ?
            "#,
        )
        .bind(generate_code())
        .bind(user_id)
        .execute(pool)
        .await;

        match result {
            Ok(done) => return Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(DatabaseError::AlreadyExists {
        entity: "LinkCode",
        id: format!("no free code after {} attempts", MAX_CODE_ATTEMPTS),
    })
}

/// Every user with their linked Telegram id, if any, ordered by user id.
pub async fn list_users_with_links(pool: &SqlitePool) -> Result<Vec<(String, Option<i64>)>> {
    let rows = sqlx::query_as::<_, (String, Option<i64>)>(
        r#"
        SELECT u.id, l.telegram_id
        FROM users u
        LEFT JOIN telegram_links l ON l.user_id = u.id
        ORDER BY u.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "u1", "Asha").await.unwrap();
        user::create_user(db.pool(), "u2", "Ben").await.unwrap();
        db
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(normalize_link_code(&code).unwrap(), code);
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let db = test_db().await;

        let first = get_or_create_link_code(db.pool(), "u1").await.unwrap();
        let second = get_or_create_link_code(db.pool(), "u1").await.unwrap();
        assert_eq!(first.link_code, second.link_code);
        assert!(!first.is_linked());
    }

    #[tokio::test]
    async fn test_code_for_unknown_user() {
        let db = test_db().await;
        let result = get_or_create_link_code(db.pool(), "ghost").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { entity: "User", .. })));
    }

    #[tokio::test]
    async fn test_redeem_is_single_use() {
        let db = test_db().await;
        let link = get_or_create_link_code(db.pool(), "u1").await.unwrap();

        let user_id = redeem_link_code(db.pool(), &link.link_code.to_lowercase(), 4242)
            .await
            .unwrap();
        assert_eq!(user_id, "u1");
        assert_eq!(
            get_user_for_telegram(db.pool(), 4242).await.unwrap().as_deref(),
            Some("u1")
        );
        let link = get_link(db.pool(), "u1").await.unwrap().unwrap();
        assert_eq!(link.telegram_id, Some(4242));
        assert!(link.linked_at.is_some());

        // Second redemption of the same code fails
        let again = redeem_link_code(db.pool(), &link.link_code, 9999).await;
        assert!(matches!(again, Err(DatabaseError::NotFound { entity: "LinkCode", .. })));
    }

    #[tokio::test]
    async fn test_redeem_unknown_or_malformed_code() {
        let db = test_db().await;

        let result = redeem_link_code(db.pool(), "ZZZZ9999", 1).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = redeem_link_code(db.pool(), "short", 1).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_account_moves_between_users() {
        let db = test_db().await;

        let code1 = get_or_create_link_code(db.pool(), "u1").await.unwrap().link_code;
        redeem_link_code(db.pool(), &code1, 7).await.unwrap();

        let code2 = get_or_create_link_code(db.pool(), "u2").await.unwrap().link_code;
        redeem_link_code(db.pool(), &code2, 7).await.unwrap();

        assert_eq!(
            get_user_for_telegram(db.pool(), 7).await.unwrap().as_deref(),
            Some("u2")
        );
        assert!(get_link(db.pool(), "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unlink_issues_fresh_code() {
        let db = test_db().await;
        let code = get_or_create_link_code(db.pool(), "u1").await.unwrap().link_code;
        redeem_link_code(db.pool(), &code, 55).await.unwrap();

        assert!(unlink(db.pool(), "u1").await.unwrap());
        let link = get_link(db.pool(), "u1").await.unwrap().unwrap();
        assert!(!link.is_linked());
        assert!(get_user_for_telegram(db.pool(), 55).await.unwrap().is_none());

        // The new code is redeemable
        let user_id = redeem_link_code(db.pool(), &link.link_code, 56).await.unwrap();
        assert_eq!(user_id, "u1");

        assert!(!unlink(db.pool(), "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_users_with_links() {
        let db = test_db().await;
        let code = get_or_create_link_code(db.pool(), "u2").await.unwrap().link_code;
        redeem_link_code(db.pool(), &code, 12).await.unwrap();

        let rows = list_users_with_links(db.pool()).await.unwrap();
        assert_eq!(
            rows,
            vec![("u1".to_string(), None), ("u2".to_string(), Some(12))]
        );
    }

    #[tokio::test]
    async fn test_delete_user_cascades_link() {
        let db = test_db().await;
        let code = get_or_create_link_code(db.pool(), "u1").await.unwrap().link_code;
        redeem_link_code(db.pool(), &code, 3).await.unwrap();

        user::delete_user(db.pool(), "u1").await.unwrap();
        assert!(get_user_for_telegram(db.pool(), 3).await.unwrap().is_none());
    }
}
